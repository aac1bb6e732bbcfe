//! The published index.
//!
//! Holds the current [`Snapshot`] behind an [`ArcSwap`]. Publishing is a
//! single pointer swap: a reader holds either the complete old snapshot or
//! the complete new one, readers never wait for a publisher, and a
//! publisher never waits for readers. An old snapshot is freed once the
//! last reader drops its `Arc`.

use std::sync::Arc;

use arc_swap::ArcSwap;

use skymap_core::snapshot::Snapshot;

/// The snapshot readers currently see. Swapped whole on publish.
pub struct PublishedIndex {
    current: ArcSwap<Snapshot>,
}

impl PublishedIndex {
    /// An index serving the empty snapshot.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    /// The currently published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Install `snapshot` as the current index and return it.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(snapshot.clone());
        snapshot
    }
}

impl Default for PublishedIndex {
    fn default() -> Self {
        Self::new()
    }
}
