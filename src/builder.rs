//! Index builder: one full refresh pass.
//!
//! # Algorithm
//!
//! 1. List the registry's top-level entries and keep directories whose
//!    names survive the exclusion filters (`registry.exclude_globs`, and no
//!    `/`). Listing order is kept and duplicates are dropped.
//! 2. For every candidate, fetch and parse `chain.json`. A missing file
//!    leaves the chain listed but unresolved.
//! 3. For every candidate, fetch and parse `assetlist.json`. A missing
//!    file means the chain has no assets. An unresolved chain's asset list
//!    is still validated, then discarded.
//! 4. Assemble the derived indices with [`SnapshotBuilder`], which applies
//!    the later-chain-wins collision policy in listing order.
//!
//! Candidates are fetched with bounded concurrency but consumed in listing
//! order. Any error other than a missing document aborts the pass and
//! nothing is returned.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::{stream, StreamExt, TryStreamExt};
use globset::GlobSet;
use tokio_util::sync::CancellationToken;

use crate::config::RegistryConfig;
use crate::error::{RefreshError, RemoteError, Result};
use crate::remote::{DirEntry, RemoteDirectory};
use skymap_core::models::{AssetRecord, ChainRecord, DocumentKind};
use skymap_core::parse::{parse_asset_document, parse_chain_document};
use skymap_core::snapshot::{Snapshot, SnapshotBuilder};

/// Race a remote call against cancellation.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = std::result::Result<T, RemoteError>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RefreshError::Cancelled),
        result = call => Ok(result?),
    }
}

/// Builds a complete [`Snapshot`] from a [`RemoteDirectory`] in one pass.
pub struct IndexBuilder {
    remote: Arc<dyn RemoteDirectory>,
    exclude: GlobSet,
    concurrency: usize,
}

impl IndexBuilder {
    pub fn new(remote: Arc<dyn RemoteDirectory>, exclude: GlobSet, concurrency: usize) -> Self {
        Self {
            remote,
            exclude,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(
        remote: Arc<dyn RemoteDirectory>,
        config: &RegistryConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self::new(
            remote,
            config.exclude_set()?,
            config.fetch_concurrency,
        ))
    }

    pub fn remote(&self) -> &Arc<dyn RemoteDirectory> {
        &self.remote
    }

    /// Whether a listing entry names a chain directory.
    pub fn is_candidate(&self, entry: &DirEntry) -> bool {
        entry.is_dir()
            && !entry.name.is_empty()
            && !entry.name.contains('/')
            && !self.exclude.is_match(&entry.name)
    }

    /// Run one refresh pass and return the new snapshot.
    ///
    /// The snapshot's `built_at` is the time the pass started, so changes
    /// landing while the pass runs are seen by the next change check.
    pub async fn build(&self, cancel: &CancellationToken) -> Result<Snapshot> {
        let started = Utc::now();

        let entries = cancellable(cancel, self.remote.list_entries()).await?;
        let mut builder = SnapshotBuilder::new();
        let mut candidates = Vec::new();
        for entry in entries.into_iter().filter(|e| self.is_candidate(e)) {
            if builder.add_chain(entry.name.clone()) {
                candidates.push(entry.name);
            }
        }
        tracing::debug!(candidates = candidates.len(), "listed registry chains");

        let resolved: Vec<Option<(ChainRecord, Vec<AssetRecord>)>> =
            stream::iter(candidates.iter().cloned())
                .map(|name| async move { self.resolve_chain(&name, cancel).await })
                .buffered(self.concurrency)
                .try_collect()
                .await?;

        for (record, assets) in resolved.into_iter().flatten() {
            builder.resolve(record, assets);
        }

        let snapshot = builder.build(started);
        tracing::info!(
            chains = snapshot.chains().len(),
            resolved = snapshot.resolved_count(),
            assets = snapshot.assets().len(),
            "built registry snapshot"
        );
        Ok(snapshot)
    }

    /// Fetch and parse both documents of one chain.
    ///
    /// The asset list is fetched and validated even when `chain.json` is
    /// missing. An unresolved chain owns no assets, so they are dropped.
    async fn resolve_chain(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<(ChainRecord, Vec<AssetRecord>)>> {
        let fetched = cancellable(cancel, self.remote.fetch_document(name, DocumentKind::Chain));
        let record = match fetched.await? {
            Some(bytes) => Some(parse_chain_document(name, &bytes)?),
            None => None,
        };

        let fetched = cancellable(
            cancel,
            self.remote.fetch_document(name, DocumentKind::AssetList),
        );
        let assets = match fetched.await? {
            Some(bytes) => parse_asset_document(name, &bytes)?,
            None => Vec::new(),
        };

        match record {
            Some(record) => Ok(Some((record, assets))),
            None => {
                tracing::debug!(chain = name, "no chain.json; listing chain without descriptor");
                Ok(None)
            }
        }
    }
}
