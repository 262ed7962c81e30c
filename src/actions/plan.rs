//! Deletion planning over a [`DuplicateIndex`].
//!
//! A [`DeletionPlanner`] partitions each duplicate group into members inside
//! and outside the deletion targets:
//!
//! - some member outside: every inside member is marked
//! - all members inside: the lexicographically smallest path is kept
//! - no member inside: the group is left alone
//!
//! The resulting [`DeletionPlan`] is executed with [`DeletionPlan::apply`],
//! which re-checks on disk that a retained copy still exists before it
//! touches any group.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use thiserror::Error;

use super::delete::{
    delete_path, is_regular_file, validate_preserves_copy, DeleteConfig, DeleteError,
};
use crate::duplicates::{DuplicateGroup, DuplicateIndex};
use crate::scanner::path_utils::is_within;
use crate::scanner::{DirectorySet, Hash};

/// Errors building deletion targets.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A target pattern is not valid glob syntax.
    #[error("invalid target pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as given
        pattern: String,
        /// Parse error from the glob crate
        #[source]
        source: glob::PatternError,
    },

    /// No target pattern was given.
    #[error("no deletion target patterns given")]
    NoPatterns,
}

/// What a member must lie in to be a deletion candidate.
#[derive(Debug, Clone)]
pub enum DeletionTarget {
    /// Any file under one of these directories.
    Directories(DirectorySet),
    /// Any file matching one of these patterns.
    ///
    /// Absolute patterns must match the whole path. Relative patterns are
    /// matched against trailing path components, so `common.txt` matches
    /// that name at any depth.
    Patterns(Vec<Pattern>),
}

impl DeletionTarget {
    /// Parse glob pattern strings into a target.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPattern`] for the first pattern that fails
    /// to parse, and [`PlanError::NoPatterns`] if none are given.
    pub fn patterns<I, S>(patterns: I) -> Result<Self, PlanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|source| PlanError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if parsed.is_empty() {
            return Err(PlanError::NoPatterns);
        }
        Ok(Self::Patterns(parsed))
    }

    /// Whether `path` lies inside this target.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        match self {
            Self::Directories(dirs) => dirs.iter().any(|dir| is_within(path, dir)),
            Self::Patterns(patterns) => patterns.iter().any(|p| pattern_matches(p, path)),
        }
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: !cfg!(windows),
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

fn pattern_matches(pattern: &Pattern, path: &Path) -> bool {
    let options = match_options();
    if Path::new(pattern.as_str()).is_absolute() {
        return pattern.matches_path_with(path, options);
    }

    let names: Vec<_> = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    (1..=names.len()).any(|k| {
        let tail: PathBuf = names[names.len() - k..].iter().collect();
        pattern.matches_path_with(&tail, options)
    })
}

/// Planned action for one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    /// Content hash of the group
    pub hash: Hash,
    /// Size of each member
    pub size: u64,
    /// Members marked for deletion
    pub delete: Vec<PathBuf>,
    /// Members that stay
    pub keep: Vec<PathBuf>,
}

impl GroupPlan {
    /// Bytes freed if every marked member is removed.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.size.saturating_mul(self.delete.len() as u64)
    }

    fn all_members(&self) -> Vec<PathBuf> {
        self.keep.iter().chain(&self.delete).cloned().collect()
    }
}

/// Computes deletion plans for a fixed target.
#[derive(Debug, Clone)]
pub struct DeletionPlanner {
    target: DeletionTarget,
    include_empty: bool,
}

impl DeletionPlanner {
    /// Create a planner for `target`. Empty files are not included.
    #[must_use]
    pub fn new(target: DeletionTarget) -> Self {
        Self {
            target,
            include_empty: false,
        }
    }

    /// Also mark empty files inside the target.
    #[must_use]
    pub fn include_empty(mut self, include: bool) -> Self {
        self.include_empty = include;
        self
    }

    /// The configured target.
    #[must_use]
    pub fn target(&self) -> &DeletionTarget {
        &self.target
    }

    /// Build a plan. The index is only read.
    #[must_use]
    pub fn plan(&self, index: &DuplicateIndex) -> DeletionPlan {
        let groups: Vec<GroupPlan> = index
            .groups()
            .filter_map(|group| self.plan_group(group))
            .collect();

        let empty_files = if self.include_empty {
            self.plan_empty(index)
        } else {
            Vec::new()
        };

        log::info!(
            "Planned deletion of {} files in {} groups, {} empty files",
            groups.iter().map(|g| g.delete.len()).sum::<usize>(),
            groups.len(),
            empty_files.len()
        );

        DeletionPlan {
            groups,
            empty_files,
        }
    }

    /// Empty files inside the target. No survivor is required for these.
    #[must_use]
    pub fn plan_empty(&self, index: &DuplicateIndex) -> Vec<PathBuf> {
        index
            .empty_files()
            .iter()
            .filter(|p| self.target.contains(p))
            .cloned()
            .collect()
    }

    fn plan_group(&self, group: &DuplicateGroup) -> Option<GroupPlan> {
        let (mut inside, mut outside): (Vec<PathBuf>, Vec<PathBuf>) = group
            .paths
            .iter()
            .cloned()
            .partition(|p| self.target.contains(p));

        if inside.is_empty() {
            return None;
        }

        if outside.is_empty() {
            // All copies targeted: keep the smallest path
            let smallest = inside
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.cmp(b))
                .map(|(i, _)| i)?;
            outside.push(inside.remove(smallest));
        }

        log::debug!(
            "Group {}: deleting {}, keeping {}",
            group.hash_hex(),
            inside.len(),
            outside.len()
        );

        Some(GroupPlan {
            hash: group.hash,
            size: group.size,
            delete: inside,
            keep: outside,
        })
    }
}

/// Files selected for removal, grouped by duplicate set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    /// Per-group decisions, smallest size first
    pub groups: Vec<GroupPlan>,
    /// Empty files selected for removal
    pub empty_files: Vec<PathBuf>,
}

impl DeletionPlan {
    /// Whether nothing is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty_files.is_empty() && self.groups.iter().all(|g| g.delete.is_empty())
    }

    /// All marked paths, in execution order.
    pub fn marked(&self) -> impl Iterator<Item = &Path> {
        self.groups
            .iter()
            .flat_map(|g| g.delete.iter())
            .chain(self.empty_files.iter())
            .map(PathBuf::as_path)
    }

    /// Number of marked paths.
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.marked().count()
    }

    /// Bytes freed if every marked path is removed.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.groups
            .iter()
            .map(GroupPlan::reclaimable)
            .fold(0, u64::saturating_add)
    }

    /// Execute (or, with `dry_run`, simulate) the plan.
    ///
    /// Per-path failures are collected and never stop the remaining paths.
    /// A group whose retained copies are all gone from disk is skipped, and
    /// each of its marked paths is reported as [`DeleteError::NoSurvivor`].
    #[must_use]
    pub fn apply(&self, config: &DeleteConfig) -> DeletionReport {
        let mut report = DeletionReport {
            dry_run: config.dry_run,
            ..DeletionReport::default()
        };

        log::info!(
            "{} {} planned deletions",
            if config.dry_run { "Simulating" } else { "Applying" },
            self.marked_count()
        );

        for group in &self.groups {
            if let Err(e) = validate_preserves_copy(&group.delete, &group.all_members()) {
                log::error!("Refusing group {}: {}", crate::scanner::hash_to_hex(&group.hash), e);
                for path in &group.delete {
                    report
                        .failed
                        .push((path.clone(), DeleteError::AllCopiesWouldBeDeleted));
                }
                continue;
            }

            if !group.keep.iter().any(|p| is_regular_file(p)) {
                log::warn!(
                    "No retained copy of group {} exists any more, skipping it",
                    crate::scanner::hash_to_hex(&group.hash)
                );
                for path in &group.delete {
                    report
                        .failed
                        .push((path.clone(), DeleteError::NoSurvivor(path.clone())));
                }
                continue;
            }

            for path in &group.delete {
                report.record(path, delete_path(path, Some(group.size), config));
            }
        }

        for path in &self.empty_files {
            report.record(path, delete_path(path, Some(0), config));
        }

        log::info!(
            "Deletion {}: {} deleted, {} failed",
            if config.dry_run { "simulated" } else { "complete" },
            report.deleted.len(),
            report.failed.len()
        );
        report
    }
}

/// Outcome of [`DeletionPlan::apply`].
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// Paths deleted (or that would be, in a dry run)
    pub deleted: Vec<PathBuf>,
    /// Paths that could not be deleted, with the reason
    pub failed: Vec<(PathBuf, DeleteError)>,
    /// Bytes freed (or that would be)
    pub bytes_freed: u64,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl DeletionReport {
    /// Whether every marked path was handled.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, path: &Path, result: Result<u64, DeleteError>) {
        match result {
            Ok(bytes) => {
                self.deleted.push(path.to_path_buf());
                self.bytes_freed = self.bytes_freed.saturating_add(bytes);
            }
            Err(e) => {
                log::warn!("Could not delete {}: {}", path.display(), e);
                self.failed.push((path.to_path_buf(), e));
            }
        }
    }
}
