//! Shared fixtures: registry documents and a mock GitHub host.
//!
//! The mock answers the three request shapes the GitHub backend makes:
//!
//! - `/api/repos/{owner}/{repo}/contents?ref=...` (directory listing)
//! - `/api/repos/{owner}/{repo}/commits?sha=...&since=...` (change check)
//! - `/raw/{owner}/{repo}/{branch}/{chain}/{file}` (documents)

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};

pub const COSMOSHUB_CHAIN: &str = r#"{
  "chain_name": "cosmoshub",
  "chain_id": "cosmoshub-4",
  "status": "live",
  "network_type": "mainnet",
  "pretty_name": "Cosmos Hub",
  "bech32_prefix": "cosmos",
  "daemon_name": "gaiad",
  "slip44": 118,
  "apis": {
    "rpc": [
      {"address": "https://rpc-cosmoshub.blockapsis.com", "provider": "chainapsis"},
      {"address": "https://cosmoshub.validator.network:443"}
    ],
    "rest": [{"address": "https://lcd-cosmoshub.blockapsis.com"}],
    "grpc": []
  },
  "peers": {
    "seeds": [{"id": "bf8328b66dceb4987e5cd94430af66045e59899f", "address": "public-seed.cosmos.vitwit.com:26656"}],
    "persistent_peers": [{"id": "ee27245d88c632a556cf72cc7f3587380c09b469", "address": "45.79.249.253:26656", "provider": "p2p"}]
  }
}"#;

pub const COSMOSHUB_ASSETS: &str = r#"{
  "chain_name": "cosmoshub",
  "assets": [
    {
      "description": "The native staking and governance token of the Cosmos Hub.",
      "denom_units": [{"denom": "uatom", "exponent": 0}, {"denom": "atom", "exponent": 6}],
      "base": "uatom",
      "name": "Cosmos Hub Atom",
      "display": "atom",
      "symbol": "ATOM",
      "coingecko_id": "cosmos"
    }
  ]
}"#;

pub const OSMOSIS_CHAIN: &str = r#"{
  "chain_name": "osmosis",
  "chain_id": "osmosis-1",
  "bech32_prefix": "osmo",
  "apis": {"rpc": [{"address": "https://rpc.osmosis.zone"}], "grpc": [{"address": "grpc.osmosis.zone:9090"}]}
}"#;

pub const OSMOSIS_ASSETS: &str = r#"{
  "chain_name": "osmosis",
  "assets": [
    {"base": "uosmo", "display": "osmo", "symbol": "OSMO", "denom_units": [{"denom": "uosmo", "exponent": 0}, {"denom": "osmo", "exponent": 6}]},
    {"base": "uion", "display": "ion", "symbol": "ION", "denom_units": [{"denom": "uion", "exponent": 0}, {"denom": "ion", "exponent": 6}]}
  ]
}"#;

#[derive(Default)]
struct MockState {
    dirs: Vec<String>,
    files: Vec<String>,
    docs: HashMap<String, String>,
    changed: bool,
    forced_status: Option<u16>,
    raw_listing: Option<String>,
    requests: Vec<String>,
    auth: Vec<Option<String>>,
}

/// A mock GitHub serving one `owner/repo@branch` registry.
pub struct MockGithub {
    pub addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockGithub {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            changed: true,
            ..Default::default()
        }));
        let app = Router::new().fallback(respond).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn raw_url(&self) -> String {
        format!("http://{}/raw", self.addr)
    }

    pub fn add_dir(&self, name: &str) {
        self.state.lock().unwrap().dirs.push(name.to_string());
    }

    pub fn add_file(&self, name: &str) {
        self.state.lock().unwrap().files.push(name.to_string());
    }

    pub fn put(&self, chain: &str, file: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .docs
            .insert(format!("{}/{}", chain, file), body.to_string());
    }

    /// Add a chain directory with its documents.
    pub fn add_chain(&self, name: &str, chain: Option<&str>, assets: Option<&str>) {
        self.add_dir(name);
        if let Some(chain) = chain {
            self.put(name, "chain.json", chain);
        }
        if let Some(assets) = assets {
            self.put(name, "assetlist.json", assets);
        }
    }

    /// Whether the commits endpoint reports any commit.
    pub fn set_changed(&self, changed: bool) {
        self.state.lock().unwrap().changed = changed;
    }

    /// Answer every request with `status`.
    pub fn force_status(&self, status: Option<u16>) {
        self.state.lock().unwrap().forced_status = status;
    }

    /// Serve `body` verbatim as the directory listing.
    pub fn raw_listing(&self, body: &str) {
        self.state.lock().unwrap().raw_listing = Some(body.to_string());
    }

    /// Request paths (with query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().auth.clone()
    }

    /// A config file body pointing at this mock.
    pub fn config_toml(&self, repo: &str) -> String {
        format!(
            r#"[registry]
repo = "{}"
api_url = "{}"
raw_url = "{}"
timeout_secs = 5
token_env = "SKYMAP_TEST_UNSET_TOKEN"

[refresh]
interval_secs = 3600

[server]
bind = "127.0.0.1:0"
"#,
            repo,
            self.api_url(),
            self.raw_url()
        )
    }
}

impl Drop for MockGithub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(
    State(state): State<Arc<Mutex<MockState>>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(
        uri.path_and_query()
            .map(|p| p.to_string())
            .unwrap_or_default(),
    );
    state.auth.push(
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    if let Some(status) = state.forced_status {
        return StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response();
    }

    let parts: Vec<&str> = uri.path().trim_matches('/').split('/').collect();
    match parts.as_slice() {
        ["api", "repos", _, _, "contents"] => {
            if let Some(body) = &state.raw_listing {
                return body.clone().into_response();
            }
            let mut listing: Vec<serde_json::Value> = state
                .dirs
                .iter()
                .map(|d| serde_json::json!({"name": d, "type": "dir", "path": d}))
                .collect();
            listing.extend(
                state
                    .files
                    .iter()
                    .map(|f| serde_json::json!({"name": f, "type": "file", "path": f})),
            );
            axum::Json(listing).into_response()
        }
        ["api", "repos", _, _, "commits"] => {
            let commits = if state.changed {
                serde_json::json!([{"sha": "0123abcd"}])
            } else {
                serde_json::json!([])
            };
            axum::Json(commits).into_response()
        }
        ["raw", _, _, _, chain, file] => match state.docs.get(&format!("{}/{}", chain, file)) {
            Some(body) => body.clone().into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
