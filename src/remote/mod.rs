//! Remote directory access.
//!
//! The [`RemoteDirectory`] trait is the only way the refresh path talks to
//! the registry. It answers three questions: which top-level entries exist,
//! what bytes a chain's document holds, and whether anything changed since a
//! timestamp. Implementations carry no index state.
//!
//! | Implementation | Backing |
//! |----------------|---------|
//! | [`GithubDirectory`] | GitHub REST API + raw content host |
//! | [`InMemoryDirectory`] | scripted in-process registry for tests and embedders |

pub mod github;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RemoteError;
use skymap_core::models::DocumentKind;

pub use github::GithubDirectory;
pub use memory::InMemoryDirectory;

/// What a top-level directory entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    Other,
}

/// One entry of the registry's top-level listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Dir,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Read-only access to a remote registry tree.
///
/// # Errors
///
/// Every method fails with [`RemoteError`] on transport failure, on an
/// unexpected status, or on an undecodable body. A missing document is
/// **not** an error: [`fetch_document`](RemoteDirectory::fetch_document)
/// returns `Ok(None)`.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// List the top-level entries, in the remote's order.
    async fn list_entries(&self) -> Result<Vec<DirEntry>, RemoteError>;

    /// Fetch `<entry>/<kind.file_name()>`. `Ok(None)` if it does not exist.
    async fn fetch_document(
        &self,
        entry: &str,
        kind: DocumentKind,
    ) -> Result<Option<Vec<u8>>, RemoteError>;

    /// Whether the remote has any activity strictly after `since`.
    ///
    /// A heuristic: `true` when unsure is always acceptable.
    async fn has_changed_since(&self, since: DateTime<Utc>) -> Result<bool, RemoteError>;
}
