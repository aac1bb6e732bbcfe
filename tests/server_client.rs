//! HTTP read API, exercised through [`SkymapClient`].

mod common;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use common::{COSMOSHUB_ASSETS, COSMOSHUB_CHAIN, OSMOSIS_ASSETS, OSMOSIS_CHAIN};
use skymap::client::{ChainInfo, ClientError, EndpointList, SkymapClient};
use skymap::config::RegistryConfig;
use skymap::engine::Engine;
use skymap::models::EndpointKind;
use skymap::remote::InMemoryDirectory;
use skymap::server;

struct TestServer {
    engine: Engine,
    remote: Arc<InMemoryDirectory>,
    client: SkymapClient,
    base: String,
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start(remote: Arc<InMemoryDirectory>) -> Self {
        let engine = Engine::new(remote.clone(), &RegistryConfig::new("cosmos/chain-registry")).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server::serve(
            listener,
            engine.index.clone(),
            shutdown.clone(),
        ));
        Self {
            engine,
            remote,
            client: SkymapClient::new(&base).unwrap(),
            base,
            shutdown,
            handle,
        }
    }

    async fn refresh(&self) {
        self.engine
            .coordinator
            .refresh(&CancellationToken::new())
            .await
            .unwrap();
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

fn registry() -> Arc<InMemoryDirectory> {
    let remote = Arc::new(InMemoryDirectory::new());
    remote.add_chain("cosmoshub", Some(COSMOSHUB_CHAIN), Some(COSMOSHUB_ASSETS));
    remote.add_chain("osmosis", Some(OSMOSIS_CHAIN), Some(OSMOSIS_ASSETS));
    remote.add_chain("newchain", None, None);
    remote
}

#[tokio::test]
async fn test_health_before_and_after_refresh() {
    let server = TestServer::start(registry()).await;

    let health = server.client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.chains, 0);
    assert!(health.last_refresh.is_none());

    server.refresh().await;
    let health = server.client.health().await.unwrap();
    assert_eq!(health.chains, 3);
    assert_eq!(
        health.last_refresh,
        Some(server.engine.index.current().built_at())
    );

    server.stop().await;
}

#[tokio::test]
async fn test_root_is_ok() {
    let server = TestServer::start(registry()).await;
    let resp = reqwest::get(format!("{}/", server.base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    server.stop().await;
}

#[tokio::test]
async fn test_chain_lookups() {
    let server = TestServer::start(registry()).await;
    server.refresh().await;

    assert_eq!(
        server.client.chains().await.unwrap(),
        vec!["cosmoshub", "osmosis", "newchain"]
    );

    let by_name = server.client.chain("cosmoshub").await.unwrap();
    let chain = by_name.chain().unwrap();
    assert_eq!(chain.chain_id, "cosmoshub-4");
    assert_eq!(chain.pretty_name.as_deref(), Some("Cosmos Hub"));

    let by_id = server.client.chain("osmosis-1").await.unwrap();
    assert_eq!(by_id.chain().unwrap().bech32_prefix.as_deref(), Some("osmo"));

    assert_eq!(
        server.client.chain("newchain").await.unwrap(),
        ChainInfo::Unresolved {
            chain_name: "newchain".to_string()
        }
    );

    assert!(matches!(
        server.client.chain("nope").await,
        Err(ClientError::NotFound(_))
    ));

    server.stop().await;
}

#[tokio::test]
async fn test_endpoint_lookups() {
    let server = TestServer::start(registry()).await;
    server.refresh().await;
    let client = &server.client;

    match client.endpoints("cosmoshub", EndpointKind::Rpc).await.unwrap() {
        EndpointList::Api(list) => {
            assert_eq!(list.len(), 2);
            assert_eq!(list[0].address, "https://rpc-cosmoshub.blockapsis.com");
            assert_eq!(list[0].provider.as_deref(), Some("chainapsis"));
        }
        other => panic!("expected api endpoints, got {:?}", other),
    }

    let seeds = client.endpoints("cosmoshub-4", EndpointKind::Seeds).await.unwrap();
    assert_eq!(seeds.len(), 1);
    let peers = client.endpoints("cosmoshub", EndpointKind::Peers).await.unwrap();
    match peers {
        EndpointList::Peers(list) => assert_eq!(list[0].address, "45.79.249.253:26656"),
        other => panic!("expected peers, got {:?}", other),
    }

    assert!(client
        .endpoints("osmosis", EndpointKind::Rest)
        .await
        .unwrap()
        .is_empty());
    assert!(client
        .endpoints("newchain", EndpointKind::Rpc)
        .await
        .unwrap()
        .is_empty());

    assert!(matches!(
        client.endpoints("nope", EndpointKind::Rpc).await,
        Err(ClientError::NotFound(_))
    ));

    server.stop().await;
}

#[tokio::test]
async fn test_error_bodies() {
    let server = TestServer::start(registry()).await;
    server.refresh().await;

    let resp = reqwest::get(format!("{}/v1/chain/cosmoshub/endpoints/websocket", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("websocket"));

    // Unknown chain wins over unknown type.
    let resp = reqwest::get(format!("{}/v1/chain/nope/endpoints/websocket", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    let resp = reqwest::get(format!("{}/v1/asset/nope", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_asset_lookups() {
    let server = TestServer::start(registry()).await;
    server.refresh().await;
    let client = &server.client;

    assert_eq!(client.assets().await.unwrap(), vec!["atom", "osmo", "ion"]);

    let atom = client.asset("atom").await.unwrap();
    assert_eq!(atom.base, "uatom");
    assert_eq!(atom.coingecko_id.as_deref(), Some("cosmos"));

    let osmosis_assets = client.chain_assets("osmosis-1").await.unwrap();
    let displays: Vec<_> = osmosis_assets.iter().map(|a| a.display.as_str()).collect();
    assert_eq!(displays, vec!["osmo", "ion"]);

    assert!(client.chain_assets("newchain").await.unwrap().is_empty());
    assert!(matches!(
        client.chain_assets("nope").await,
        Err(ClientError::NotFound(_))
    ));
    assert!(matches!(
        client.asset("nope").await,
        Err(ClientError::NotFound(_))
    ));

    server.stop().await;
}

#[tokio::test]
async fn test_republished_snapshot_is_served() {
    let server = TestServer::start(registry()).await;
    server.refresh().await;
    assert!(matches!(
        server.client.chain("juno").await,
        Err(ClientError::NotFound(_))
    ));

    server.remote.add_chain(
        "juno",
        Some(r#"{"chain_name": "juno", "chain_id": "juno-1"}"#),
        None,
    );
    server.refresh().await;

    let juno = server.client.chain("juno-1").await.unwrap();
    assert_eq!(juno.chain().unwrap().chain_id, "juno-1");
    assert_eq!(server.client.chains().await.unwrap().len(), 4);

    server.stop().await;
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = TestServer::start(registry()).await;
    let resp = reqwest::Client::new()
        .get(format!("{}/v1/chains", server.base))
        .header("Origin", "https://explorer.example")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    server.stop().await;
}
