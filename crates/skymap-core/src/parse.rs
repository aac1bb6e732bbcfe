//! Document parsers.
//!
//! Pure functions turning the raw bytes of `chain.json` and `assetlist.json`
//! into index records. They never perform I/O; fetching belongs to the
//! remote directory client in the `skymap` crate.

use thiserror::Error;

use crate::models::{AssetList, AssetRecord, Chain, ChainRecord, DocumentKind};

/// A registry document that does not match its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed {doc} for chain '{chain}': {reason}")]
    Malformed {
        chain: String,
        doc: DocumentKind,
        reason: String,
    },
}

impl ParseError {
    fn malformed(chain: &str, doc: DocumentKind, reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            chain: chain.to_string(),
            doc,
            reason: reason.into(),
        }
    }
}

/// Parse a `chain.json` document fetched from the directory `name`.
///
/// `chain_id` is required and must be non-empty: it is the key of the
/// by-id index.
pub fn parse_chain_document(name: &str, bytes: &[u8]) -> Result<ChainRecord, ParseError> {
    let chain: Chain = serde_json::from_slice(bytes)
        .map_err(|e| ParseError::malformed(name, DocumentKind::Chain, e.to_string()))?;

    if chain.chain_id.trim().is_empty() {
        return Err(ParseError::malformed(
            name,
            DocumentKind::Chain,
            "chain_id must not be empty",
        ));
    }

    Ok(ChainRecord {
        name: name.to_string(),
        chain,
    })
}

/// Parse an `assetlist.json` document fetched from the directory `chain_name`.
///
/// Assets are returned in document order. Every record is attributed to
/// `chain_name`, whatever the document's own `chain_name` field says.
pub fn parse_asset_document(chain_name: &str, bytes: &[u8]) -> Result<Vec<AssetRecord>, ParseError> {
    let list: AssetList = serde_json::from_slice(bytes)
        .map_err(|e| ParseError::malformed(chain_name, DocumentKind::AssetList, e.to_string()))?;

    Ok(list
        .assets
        .into_iter()
        .map(|asset| AssetRecord {
            chain_name: chain_name.to_string(),
            asset,
        })
        .collect())
}
