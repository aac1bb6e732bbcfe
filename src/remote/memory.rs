//! In-memory [`RemoteDirectory`] for tests and embedders.
//!
//! Holds a scripted registry: top-level entries, documents, and a commit
//! log used for change detection. Every mutation records a commit at the
//! current time, so `has_changed_since` behaves like the GitHub commits
//! query. Failures can be injected per operation, call counts are exposed,
//! and listing can be held open to observe a refresh while it is in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use super::{DirEntry, RemoteDirectory};
use crate::error::RemoteError;
use skymap_core::models::DocumentKind;

#[derive(Default)]
struct State {
    entries: Vec<DirEntry>,
    documents: HashMap<(String, DocumentKind), Vec<u8>>,
    commits: Vec<DateTime<Utc>>,
    list_failure: Option<RemoteError>,
    change_failure: Option<RemoteError>,
    document_failures: HashMap<(String, DocumentKind), RemoteError>,
    gate: Option<Arc<Semaphore>>,
}

/// A scripted registry.
#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<State>,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    change_calls: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a commit at the current time.
    pub fn touch(&self) {
        self.state().commits.push(Utc::now());
    }

    /// Record a commit at `at`.
    pub fn commit_at(&self, at: DateTime<Utc>) {
        self.state().commits.push(at);
    }

    /// Add a top-level entry.
    pub fn add_entry(&self, entry: DirEntry) {
        let mut state = self.state();
        state.entries.push(entry);
        state.commits.push(Utc::now());
    }

    /// Add a chain directory with optional `chain.json` and `assetlist.json`.
    pub fn add_chain(&self, name: &str, chain_json: Option<&str>, assetlist_json: Option<&str>) {
        self.add_entry(DirEntry::dir(name));
        if let Some(doc) = chain_json {
            self.put_document(name, DocumentKind::Chain, doc);
        }
        if let Some(doc) = assetlist_json {
            self.put_document(name, DocumentKind::AssetList, doc);
        }
    }

    /// Create or replace a document.
    pub fn put_document(&self, entry: &str, kind: DocumentKind, body: impl Into<Vec<u8>>) {
        let mut state = self.state();
        state
            .documents
            .insert((entry.to_string(), kind), body.into());
        state.commits.push(Utc::now());
    }

    /// Delete a document, so fetching it yields "not found".
    pub fn remove_document(&self, entry: &str, kind: DocumentKind) {
        let mut state = self.state();
        state.documents.remove(&(entry.to_string(), kind));
        state.commits.push(Utc::now());
    }

    pub fn fail_listing(&self, err: Option<RemoteError>) {
        self.state().list_failure = err;
    }

    pub fn fail_change_check(&self, err: Option<RemoteError>) {
        self.state().change_failure = err;
    }

    pub fn fail_document(&self, entry: &str, kind: DocumentKind, err: Option<RemoteError>) {
        let key = (entry.to_string(), kind);
        let mut state = self.state();
        match err {
            Some(err) => {
                state.document_failures.insert(key, err);
            }
            None => {
                state.document_failures.remove(&key);
            }
        }
    }

    /// Make subsequent `list_entries` calls wait until [`release_listing`](Self::release_listing).
    pub fn hold_listing(&self) {
        self.state().gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let every held and future `list_entries` call proceed.
    pub fn release_listing(&self) {
        if let Some(gate) = self.state().gate.take() {
            gate.close();
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn change_calls(&self) -> usize {
        self.change_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteDirectory for InMemoryDirectory {
    async fn list_entries(&self) -> Result<Vec<DirEntry>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state().gate.clone();
        if let Some(gate) = gate {
            // Closing the semaphore is the release signal.
            let _ = gate.acquire().await;
        }

        let state = self.state();
        if let Some(err) = &state.list_failure {
            return Err(err.clone());
        }
        Ok(state.entries.clone())
    }

    async fn fetch_document(
        &self,
        entry: &str,
        kind: DocumentKind,
    ) -> Result<Option<Vec<u8>>, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let key = (entry.to_string(), kind);
        let state = self.state();
        if let Some(err) = state.document_failures.get(&key) {
            return Err(err.clone());
        }
        Ok(state.documents.get(&key).cloned())
    }

    async fn has_changed_since(&self, since: DateTime<Utc>) -> Result<bool, RemoteError> {
        self.change_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if let Some(err) = &state.change_failure {
            return Err(err.clone());
        }
        Ok(state.commits.iter().any(|c| *c > since))
    }
}
