//! Chain-registry document models.
//!
//! Two documents live under every chain directory of the registry:
//!
//! | File | Type |
//! |------|------|
//! | `chain.json` | [`Chain`] |
//! | `assetlist.json` | [`AssetList`] |
//!
//! Only the fields the read API exposes are modelled. Unknown fields are
//! ignored on decode so the index keeps working as the registry schemas
//! evolve, and optional fields stay `None` when absent.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two well-known documents stored beneath a chain directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `chain.json`, the chain descriptor.
    Chain,
    /// `assetlist.json`, the chain's asset list.
    AssetList,
}

impl DocumentKind {
    /// File name of the document inside a chain directory.
    pub fn file_name(self) -> &'static str {
        match self {
            DocumentKind::Chain => "chain.json",
            DocumentKind::AssetList => "assetlist.json",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// chain.json
// ═══════════════════════════════════════════════════════════════════════

/// Metadata describing a Cosmos SDK based chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_name: Option<String>,
    /// Protocol-level chain identifier, e.g. `cosmoshub-4`.
    pub chain_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bech32_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChainStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_type: Option<NetworkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_home: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slip44: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_algos: Vec<KeyAlgo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis: Option<Genesis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codebase: Option<Codebase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Fees>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<Peers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apis: Option<Apis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explorers: Vec<Explorer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainStatus {
    Live,
    Upcoming,
    Killed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgo {
    Secp256k1,
    Ethsecp256k1,
    Ed25519,
    Sr25519,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genesis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Codebase {
    #[serde(default)]
    pub git_repo: String,
    #[serde(default)]
    pub recommended_version: String,
    #[serde(default)]
    pub compatible_versions: Vec<String>,
    /// Download URL per platform, keyed like `linux/amd64`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binaries: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fees {
    #[serde(default)]
    pub fee_tokens: Vec<FeeToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeToken {
    pub denom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_min_gas_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Peers {
    #[serde(default)]
    pub seeds: Vec<Peer>,
    #[serde(default)]
    pub persistent_peers: Vec<Peer>,
}

/// A p2p node address (`id@host:port`, split into its parts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Apis {
    #[serde(default)]
    pub rpc: Vec<ApiEndpoint>,
    #[serde(default)]
    pub rest: Vec<ApiEndpoint>,
    #[serde(default)]
    pub grpc: Vec<ApiEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explorer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_page: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// assetlist.json
// ═══════════════════════════════════════════════════════════════════════

/// Metadata for the denoms a chain knows about, including IBC assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_name: Option<String>,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Base unit of the asset. Must appear in `denom_units`.
    pub base: String,
    /// Human friendly unit of the asset. Must appear in `denom_units`.
    pub display: String,
    #[serde(default)]
    pub denom_units: Vec<DenomUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coingecko_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_asset: Option<AssetKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ibc: Option<Ibc>,
    #[serde(
        rename = "logo_URIs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub logo_uris: Option<LogoUris>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Token standard of an asset. Assets without one are `sdk.coin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "sdk.coin")]
    SdkCoin,
    #[serde(rename = "cw20")]
    Cw20,
    #[serde(rename = "erc20")]
    Erc20,
    #[serde(rename = "snip20")]
    Snip20,
    #[serde(other, rename = "other")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ibc {
    pub source_channel: String,
    pub dst_channel: String,
    pub source_denom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoUris {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Index records
// ═══════════════════════════════════════════════════════════════════════

/// A parsed chain descriptor, keyed by the registry directory it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRecord {
    /// Directory entry name in the registry (e.g. `cosmoshub`).
    pub name: String,
    pub chain: Chain,
}

impl ChainRecord {
    pub fn chain_id(&self) -> &str {
        &self.chain.chain_id
    }

    /// The endpoints of the given kind; empty when the descriptor lists none.
    pub fn endpoints(&self, kind: EndpointKind) -> Endpoints<'_> {
        let apis = self.chain.apis.as_ref();
        let peers = self.chain.peers.as_ref();
        match kind {
            EndpointKind::Rpc => Endpoints::Api(apis.map(|a| a.rpc.as_slice()).unwrap_or(&[])),
            EndpointKind::Grpc => Endpoints::Api(apis.map(|a| a.grpc.as_slice()).unwrap_or(&[])),
            EndpointKind::Rest => Endpoints::Api(apis.map(|a| a.rest.as_slice()).unwrap_or(&[])),
            EndpointKind::Peers => Endpoints::Peers(
                peers
                    .map(|p| p.persistent_peers.as_slice())
                    .unwrap_or(&[]),
            ),
            EndpointKind::Seeds => {
                Endpoints::Peers(peers.map(|p| p.seeds.as_slice()).unwrap_or(&[]))
            }
        }
    }
}

/// One asset of a chain's asset list.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    /// Directory entry name of the chain that lists this asset.
    pub chain_name: String,
    pub asset: Asset,
}

impl AssetRecord {
    pub fn display(&self) -> &str {
        &self.asset.display
    }
}

/// Endpoint categories served under `/v1/chain/{chain}/endpoints/{type}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Rpc,
    Grpc,
    Rest,
    Peers,
    Seeds,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 5] = [
        EndpointKind::Rpc,
        EndpointKind::Grpc,
        EndpointKind::Rest,
        EndpointKind::Peers,
        EndpointKind::Seeds,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EndpointKind::Rpc => "rpc",
            EndpointKind::Grpc => "grpc",
            EndpointKind::Rest => "rest",
            EndpointKind::Peers => "peers",
            EndpointKind::Seeds => "seeds",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EndpointKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown endpoint type '{}'. Must be rpc, grpc, rest, peers, or seeds.",
                    s
                )
            })
    }
}

/// Borrowed view over one endpoint category of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Endpoints<'a> {
    Api(&'a [ApiEndpoint]),
    Peers(&'a [Peer]),
}

impl Endpoints<'_> {
    pub fn len(&self) -> usize {
        match self {
            Endpoints::Api(a) => a.len(),
            Endpoints::Peers(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
