//! The immutable registry index.
//!
//! A [`Snapshot`] is produced in full by one refresh pass and never mutated
//! afterwards. Refreshing builds a brand-new snapshot with a
//! [`SnapshotBuilder`] and replaces the old one as a unit.
//!
//! # Collision policy
//!
//! Chain ids and asset display names are assumed globally unique, but the
//! registry does not enforce it. When two chains declare the same chain id,
//! or list assets with the same display name, the chain appearing **later**
//! in the directory listing wins the lookup. Within one asset list the later
//! asset wins. This is deliberate and deterministic for a given listing
//! order.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::models::{AssetRecord, ChainRecord, EndpointKind, Endpoints};

/// One complete, self-consistent set of registry indices.
#[derive(Debug, Clone)]
pub struct Snapshot {
    chains: Vec<String>,
    assets: Vec<String>,
    known: HashSet<String>,
    chain_by_id: HashMap<String, String>,
    chain_by_asset: HashMap<String, String>,
    chain_records: HashMap<String, ChainRecord>,
    asset_lists: HashMap<String, Vec<AssetRecord>>,
    built_at: DateTime<Utc>,
}

/// A chain found by name or id.
///
/// `record` is `None` for a chain whose directory exists but whose
/// `chain.json` has not been published yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainEntry<'a> {
    pub name: &'a str,
    pub record: Option<&'a ChainRecord>,
}

impl Snapshot {
    /// The snapshot served before the first successful refresh.
    pub fn empty() -> Self {
        Self {
            chains: Vec::new(),
            assets: Vec::new(),
            known: HashSet::new(),
            chain_by_id: HashMap::new(),
            chain_by_asset: HashMap::new(),
            chain_records: HashMap::new(),
            asset_lists: HashMap::new(),
            built_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Chain names in directory listing order.
    pub fn chains(&self) -> &[String] {
        &self.chains
    }

    /// Asset display names, in chain order then document order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Number of chains with a parsed `chain.json`.
    pub fn resolved_count(&self) -> usize {
        self.chain_records.len()
    }

    /// Resolve a chain name or chain id to the chain's directory name.
    ///
    /// Names take precedence over ids.
    pub fn resolve_name(&self, name_or_id: &str) -> Option<&str> {
        if let Some(name) = self.known.get(name_or_id) {
            return Some(name.as_str());
        }
        self.chain_by_id.get(name_or_id).map(String::as_str)
    }

    /// Look up a chain by directory name, falling back to chain id.
    pub fn chain(&self, name_or_id: &str) -> Option<ChainEntry<'_>> {
        let name = self.resolve_name(name_or_id)?;
        Some(ChainEntry {
            name,
            record: self.chain_records.get(name),
        })
    }

    /// Chain name registered for a chain id.
    pub fn chain_name_by_id(&self, chain_id: &str) -> Option<&str> {
        self.chain_by_id.get(chain_id).map(String::as_str)
    }

    /// Chain name whose asset list owns the display name.
    pub fn chain_name_by_asset(&self, display: &str) -> Option<&str> {
        self.chain_by_asset.get(display).map(String::as_str)
    }

    /// Look up an asset by its display name.
    pub fn asset(&self, display: &str) -> Option<&AssetRecord> {
        let chain = self.chain_by_asset.get(display)?;
        self.asset_lists
            .get(chain)?
            .iter()
            .rev()
            .find(|a| a.display() == display)
    }

    /// All assets of a chain, found by name or id.
    ///
    /// A known chain without an asset list yields an empty slice.
    pub fn chain_assets(&self, name_or_id: &str) -> Option<&[AssetRecord]> {
        let name = self.resolve_name(name_or_id)?;
        Some(
            self.asset_lists
                .get(name)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        )
    }

    /// Endpoints of a chain; empty for a chain without a descriptor.
    pub fn endpoints(&self, name_or_id: &str, kind: EndpointKind) -> Option<Endpoints<'_>> {
        let entry = self.chain(name_or_id)?;
        Some(match entry.record {
            Some(record) => record.endpoints(kind),
            None => match kind {
                EndpointKind::Peers | EndpointKind::Seeds => Endpoints::Peers(&[]),
                _ => Endpoints::Api(&[]),
            },
        })
    }

    /// Verify the cross-reference invariants of this snapshot.
    ///
    /// Every index value must point at a resolved chain, and every resolved
    /// chain must be listed.
    pub fn check_consistency(&self) -> Result<(), String> {
        for (display, chain) in &self.chain_by_asset {
            if !self.chain_records.contains_key(chain) {
                return Err(format!(
                    "asset '{}' points at unresolved chain '{}'",
                    display, chain
                ));
            }
        }
        for (id, chain) in &self.chain_by_id {
            match self.chain_records.get(chain) {
                Some(record) if record.chain_id() == id => {}
                _ => return Err(format!("chain id '{}' points at '{}'", id, chain)),
            }
        }
        for name in self.chain_records.keys().chain(self.asset_lists.keys()) {
            if !self.known.contains(name) {
                return Err(format!("chain '{}' is indexed but not listed", name));
            }
        }
        for name in self.asset_lists.keys() {
            if !self.chain_records.contains_key(name) {
                return Err(format!("unresolved chain '{}' contributes assets", name));
            }
        }
        Ok(())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Accumulates the results of a refresh pass into a [`Snapshot`].
///
/// Chains are registered with [`add_chain`](SnapshotBuilder::add_chain) in
/// listing order; resolved chains then attach their descriptor and assets
/// with [`resolve`](SnapshotBuilder::resolve). Derived indices are computed
/// once, in listing order, by [`build`](SnapshotBuilder::build).
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    chains: Vec<String>,
    known: HashSet<String>,
    resolved: HashMap<String, (ChainRecord, Vec<AssetRecord>)>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chain directory. Returns `false` if it was already listed.
    pub fn add_chain(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.known.contains(&name) {
            return false;
        }
        self.known.insert(name.clone());
        self.chains.push(name);
        true
    }

    /// Attach a parsed descriptor and its assets to a chain.
    ///
    /// The chain is registered first if it was not listed yet. Assets whose
    /// `chain_name` differs from the record's are re-attributed to it.
    pub fn resolve(&mut self, record: ChainRecord, assets: Vec<AssetRecord>) {
        self.add_chain(record.name.clone());
        let assets = assets
            .into_iter()
            .map(|mut a| {
                if a.chain_name != record.name {
                    a.chain_name = record.name.clone();
                }
                a
            })
            .collect();
        self.resolved.insert(record.name.clone(), (record, assets));
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Compute the derived indices and freeze the snapshot.
    pub fn build(mut self, built_at: DateTime<Utc>) -> Snapshot {
        let mut chain_by_id = HashMap::new();
        let mut chain_by_asset = HashMap::new();
        let mut chain_records = HashMap::with_capacity(self.resolved.len());
        let mut asset_lists = HashMap::with_capacity(self.resolved.len());
        let mut assets = Vec::new();
        let mut seen_assets = HashSet::new();

        for name in &self.chains {
            let Some((record, chain_assets)) = self.resolved.remove(name) else {
                continue;
            };

            // Later chains overwrite earlier ones on duplicate ids.
            chain_by_id.insert(record.chain_id().to_string(), name.clone());

            for asset in &chain_assets {
                let display = asset.display().to_string();
                if seen_assets.insert(display.clone()) {
                    assets.push(display.clone());
                }
                chain_by_asset.insert(display, name.clone());
            }

            chain_records.insert(name.clone(), record);
            if !chain_assets.is_empty() {
                asset_lists.insert(name.clone(), chain_assets);
            }
        }

        Snapshot {
            chains: self.chains,
            assets,
            known: self.known,
            chain_by_id,
            chain_by_asset,
            chain_records,
            asset_lists,
            built_at,
        }
    }
}
