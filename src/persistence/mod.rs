//! Disk persistence for forests.
//!
//! A saved forest is one self-contained file: a gzip stream holding a
//! versioned header, the item keys, every band table in table order and a
//! CRC32 footer. Loaded forests are immediately queryable; entries that were
//! not yet indexed at save time stay unindexed after load.
//!
//! Item keys go through `postcard`, so any `K: Serialize + DeserializeOwned`
//! can be persisted. Everything around them uses fixed-width little-endian
//! fields (see [`format`]).
//!
//! Save and load live in `forest` behind the default `persistence`
//! feature; [`format`] and [`error`] are always available.

pub mod error;
pub mod format;

#[cfg(feature = "persistence")]
pub mod forest;

pub use error::{PersistenceError, PersistenceResult};
