//! Engine wiring.
//!
//! An [`Engine`] owns one remote, one published index, and one coordinator.
//! There is no process-wide state: several engines can live side by side,
//! which is how the tests run.

use std::sync::Arc;

use crate::builder::IndexBuilder;
use crate::config::RegistryConfig;
use crate::coordinator::RefreshCoordinator;
use crate::published::PublishedIndex;
use crate::remote::{GithubDirectory, RemoteDirectory};

#[derive(Clone)]
pub struct Engine {
    pub index: Arc<PublishedIndex>,
    pub coordinator: Arc<RefreshCoordinator>,
}

impl Engine {
    /// Build an engine over an arbitrary remote.
    pub fn new(remote: Arc<dyn RemoteDirectory>, config: &RegistryConfig) -> anyhow::Result<Self> {
        let index = Arc::new(PublishedIndex::new());
        let builder = IndexBuilder::from_config(remote, config)?;
        let coordinator = Arc::new(RefreshCoordinator::new(builder, index.clone()));
        Ok(Self { index, coordinator })
    }

    /// Build an engine mirroring the configured GitHub registry.
    pub fn from_config(config: &RegistryConfig) -> anyhow::Result<Self> {
        let remote = Arc::new(GithubDirectory::new(config)?);
        Self::new(remote, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryDirectory;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_engines_are_independent() {
        let config = RegistryConfig::new("cosmos/chain-registry");
        let a_remote = Arc::new(InMemoryDirectory::new());
        a_remote.add_chain("alpha", Some(r#"{"chain_id": "alpha-1"}"#), None);
        let b_remote = Arc::new(InMemoryDirectory::new());
        b_remote.add_chain("beta", Some(r#"{"chain_id": "beta-1"}"#), None);

        let a = Engine::new(a_remote, &config).unwrap();
        let b = Engine::new(b_remote, &config).unwrap();
        let cancel = CancellationToken::new();
        a.coordinator.refresh(&cancel).await.unwrap();

        assert_eq!(a.index.current().chains(), &["alpha".to_string()]);
        assert!(b.index.current().is_empty());

        b.coordinator.refresh(&cancel).await.unwrap();
        assert_eq!(b.index.current().chains(), &["beta".to_string()]);
        assert!(Arc::ptr_eq(a.coordinator.index(), &a.index));
    }

    #[test]
    fn test_from_config_builds_github_engine() {
        let engine = Engine::from_config(&RegistryConfig::new("cosmos/chain-registry")).unwrap();
        assert!(engine.index.current().is_empty());
    }
}
