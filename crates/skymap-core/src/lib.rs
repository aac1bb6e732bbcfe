//! # skymap core
//!
//! Pure, I/O-free logic for skymap: the typed chain-registry document
//! models, their parsers, and the immutable [`snapshot::Snapshot`] index
//! assembled from them.
//!
//! This crate contains no tokio, reqwest, or other runtime dependencies.
//! Fetching documents and publishing snapshots live in the `skymap` crate.

pub mod models;
pub mod parse;
pub mod snapshot;
