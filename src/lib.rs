//! # Skymap
//!
//! Mirrors a chain registry hosted in a GitHub repository into an in-memory
//! index and serves it over HTTP.
//!
//! Every chain lives in its own top-level directory holding a `chain.json`
//! descriptor and an optional `assetlist.json`. Skymap lists those
//! directories, fetches and parses both documents, and assembles an
//! immutable [`Snapshot`](snapshot::Snapshot) with lookup maps by chain id and by
//! asset display name. Snapshots are published atomically: readers always
//! see one complete snapshot, never a half-built one.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │    Remote    │──▶│ IndexBuilder │──▶│ PublishedIndex  │
//! │ GitHub / mem │   │ fetch+parse  │   │ ArcSwap<Snapshot>│
//! └──────────────┘   └──────┬───────┘   └────────┬────────┘
//!                           │                    │
//!                 ┌─────────┴──────────┐         ▼
//!                 │ RefreshCoordinator │   ┌──────────┐
//!                 │ single-flight +    │   │   HTTP   │
//!                 │ watermark          │   │  (axum)  │
//!                 └─────────▲──────────┘   └──────────┘
//!                           │
//!                     ┌─────┴─────┐
//!                     │ Scheduler │
//!                     └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! skymap --config ./config/skymap.toml sync      # one refresh pass
//! skymap --config ./config/skymap.toml serve     # refresh + serve
//! curl localhost:8080/v1/chain/cosmoshub/endpoints/rpc
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Registry document types (re-exported from `skymap-core`) |
//! | [`parse`] | Document decoding (re-exported from `skymap-core`) |
//! | [`snapshot`] | Immutable index and its builder (re-exported from `skymap-core`) |
//! | [`remote`] | Remote directory abstraction, GitHub and in-memory backends |
//! | [`builder`] | One full index build pass |
//! | [`published`] | Atomic snapshot slot |
//! | [`coordinator`] | Change detection, single-flight refresh |
//! | [`scheduler`] | Periodic refresh trigger |
//! | [`engine`] | Wiring of the above |
//! | [`server`] | HTTP read API |
//! | [`client`] | Typed client for the HTTP read API |
//! | [`error`] | Remote and refresh error types |

pub mod builder;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod published;
pub mod remote;
pub mod scheduler;
pub mod server;

pub use skymap_core::{models, parse, snapshot};
