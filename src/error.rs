//! Error taxonomy of the refresh path.
//!
//! Two classes are kept apart on purpose:
//!
//! - **expected absence**: a chain directory without `chain.json` or
//!   `assetlist.json`. This is not an error at all;
//!   [`RemoteDirectory::fetch_document`](crate::remote::RemoteDirectory::fetch_document)
//!   returns `Ok(None)` and the index builder skips the document.
//! - **fatal failures**: everything in [`RemoteError`] and [`RefreshError`].
//!   They abort the whole refresh pass; the previously published snapshot
//!   stays authoritative.
//!
//! All errors are `Clone` so that callers coalesced onto one in-flight
//! refresh can each receive its outcome.

use thiserror::Error;

use skymap_core::parse::ParseError;

/// Failures talking to the remote registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Network or connection failure (including timeouts).
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The remote answered with a non-success status where success was required.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The response body did not have the expected shape.
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl RemoteError {
    pub fn transport(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        RemoteError::Transport {
            url: url.into(),
            reason: err.to_string(),
        }
    }

    pub fn decode(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        RemoteError::Decode {
            url: url.into(),
            reason: err.to_string(),
        }
    }
}

/// Why a refresh pass did not publish a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Malformed(#[from] ParseError),

    /// The pass observed cancellation before completing.
    #[error("refresh cancelled")]
    Cancelled,
}

pub type Result<T, E = RefreshError> = std::result::Result<T, E>;
