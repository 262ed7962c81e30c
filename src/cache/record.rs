//! On-disk cache record and its integrity envelope.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::CacheError;
use crate::duplicates::DuplicateIndex;
use crate::scanner::DirectorySet;

/// Current cache record format version.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// A stored scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Format version, checked on load
    pub version: u32,
    /// When the scan finished
    pub created_at: DateTime<Utc>,
    /// The scan result, including its directory set
    pub index: DuplicateIndex,
}

/// Envelope for cache files to include integrity checks.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    /// SHA256 checksum of the serialized record.
    checksum: String,
    /// The actual record.
    record: CacheRecord,
}

impl CacheRecord {
    /// Wrap an index, stamped with the current time.
    #[must_use]
    pub fn new(index: DuplicateIndex) -> Self {
        Self::with_created_at(index, Utc::now())
    }

    /// Wrap an index with an explicit creation time.
    #[must_use]
    pub fn with_created_at(index: DuplicateIndex, created_at: DateTime<Utc>) -> Self {
        Self {
            version: CACHE_FORMAT_VERSION,
            created_at,
            index,
        }
    }

    /// Directory set the record was computed for.
    #[must_use]
    pub fn dirs(&self) -> &DirectorySet {
        self.index.dirs()
    }

    /// Time elapsed since creation. Timestamps in the future count as zero.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).max(Duration::zero())
    }

    /// Whether the record is no older than `max_age_minutes` at `now`.
    ///
    /// The bound is strict: with a zero threshold any elapsed time is stale.
    #[must_use]
    pub fn is_fresh_at(&self, max_age_minutes: u64, now: DateTime<Utc>) -> bool {
        let Some(max_age) = i64::try_from(max_age_minutes)
            .ok()
            .and_then(Duration::try_minutes)
        else {
            // Beyond what a timestamp difference can express
            return true;
        };
        self.age_at(now) <= max_age
    }

    /// Serialize to a JSON string with an integrity checksum.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialize`] if a path cannot be represented as JSON.
    pub fn to_json(&self) -> Result<String, CacheError> {
        let record_json = serde_json::to_string(self).map_err(CacheError::Serialize)?;

        let envelope = CacheEnvelope {
            checksum: checksum(&record_json),
            record: self.clone(),
        };

        serde_json::to_string_pretty(&envelope).map_err(CacheError::Serialize)
    }

    /// Parse and verify a record produced by [`CacheRecord::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the data does not parse, the checksum does
    /// not match, the version is unsupported, or the index is inconsistent.
    pub fn from_json(content: &str) -> Result<Self, CacheError> {
        let envelope: CacheEnvelope = serde_json::from_str(content).map_err(CacheError::Parse)?;

        // Must use the same (compact) serialization as to_json
        let record_json = serde_json::to_string(&envelope.record).map_err(CacheError::Serialize)?;
        if checksum(&record_json) != envelope.checksum {
            return Err(CacheError::ChecksumMismatch);
        }

        let record = envelope.record;
        if record.version != CACHE_FORMAT_VERSION {
            return Err(CacheError::UnsupportedVersion(record.version));
        }

        record.index.validate()?;
        Ok(record)
    }
}

fn checksum(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}
