//! Persistent scan cache.
//!
//! Scan results are stored as one JSON record per directory set so that
//! `show` and `delete` can reuse a recent scan instead of re-hashing.
//!
//! # Architecture
//!
//! * [`record`]: the stored [`CacheRecord`] and its checksum envelope.
//! * [`store`]: the [`PersistentCache`] handle (store, retrieve, invalidate, clear).
//!
//! # Cache Invalidation
//!
//! A record is only returned when:
//! * it exists for the exact (order-independent) directory set
//! * it is no older than the caller's threshold in minutes
//! * its checksum, format version and index invariants all check out
//!
//! Everything else is a miss. A real deletion run removes the record for
//! the scanned set, since the index no longer matches the disk.

pub mod record;
pub mod store;

pub use record::{CacheRecord, CACHE_FORMAT_VERSION};
pub use store::{CacheError, ClearReport, PersistentCache};
