//! # Client Configuration & Constants
//!
//! Every magic number and well-known endpoint in ZENITH lives here. If you
//! are hardcoding a gateway URL somewhere else, you are doing it wrong and
//! you owe the team coffee.
//!
//! The network selector is deliberately dumb: it picks a gateway endpoint
//! and decides whether the development root-of-trust fetch runs. It never
//! changes client behavior beyond that — the same workflow code talks to
//! mainnet and to a laptop replica.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Gateway Endpoints
// ---------------------------------------------------------------------------

/// Public boundary gateway for the production network. Mistakes here cost
/// real tokens.
pub const MAINNET_GATEWAY_URL: &str = "https://icp0.io";

/// The shared playground network rides the same public gateway as mainnet;
/// only the ledger identifier differs.
pub const PLAYGROUND_GATEWAY_URL: &str = "https://icp0.io";

/// Local replica started by the SDK. Reset at will, no promises, no
/// survivors.
pub const LOCAL_GATEWAY_URL: &str = "http://localhost:4943";

/// Interactive identity provider used for browser-based authentication.
/// The client library never speaks to it directly — an `IdentityProvider`
/// implementation does — but the canonical URL belongs with the other
/// endpoints.
pub const IDENTITY_PROVIDER_URL: &str = "https://identity.ic0.app";

// ---------------------------------------------------------------------------
// Token Parameters
// ---------------------------------------------------------------------------

/// Decimals assumed for display when token metadata has not loaded yet.
/// 8 decimals, same as Bitcoin. We're not reinventing this wheel.
pub const DEFAULT_DECIMALS: u8 = 8;

/// Largest decimals count the scaler accepts. 10^38 still fits in a u128;
/// 10^39 does not. No real ledger comes anywhere near this, but the guard
/// turns a silent overflow into a typed error.
pub const MAX_DECIMALS: u8 = 38;

// ---------------------------------------------------------------------------
// Timing Constants
// ---------------------------------------------------------------------------

/// TCP connect timeout for the gateway transport. 10 seconds to establish
/// a connection or we move on. Life's too short for slow gateways.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// End-to-end timeout for a single query call. Queries answer from one
/// replica and should be fast; anything slower than this is effectively
/// down.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// End-to-end timeout for a single update call. Updates go through
/// consensus, so they get a longer leash than queries.
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default lifetime of a stored session, matching the identity provider's
/// default delegation lifetime. After this, `restore_session` treats the
/// stored record as expired and the user logs in again.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

// ---------------------------------------------------------------------------
// Network Selector
// ---------------------------------------------------------------------------

/// Which deployment of the ledger network the client talks to.
///
/// The selector affects exactly two things: the gateway URL and whether the
/// development root-of-trust step runs at connect time. Core logic is
/// identical across networks on purpose — a code path that only runs on
/// mainnet is a code path that was never tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// The production network. Root of trust is baked in.
    Mainnet,
    /// Shared public playground. Ledgers are ephemeral; the gateway is the
    /// production one.
    Playground,
    /// Local replica on the developer's machine.
    Local,
}

impl Network {
    /// Returns the default gateway URL for this network.
    pub fn gateway_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_GATEWAY_URL,
            Network::Playground => PLAYGROUND_GATEWAY_URL,
            Network::Local => LOCAL_GATEWAY_URL,
        }
    }

    /// Whether the transport must fetch the gateway's root key at connect
    /// time. Only the production network ships a built-in trust anchor;
    /// everything else serves a freshly generated key that has to be picked
    /// up before responses can be trusted.
    pub fn requires_root_key_fetch(&self) -> bool {
        !matches!(self, Network::Mainnet)
    }

    /// Parse a network name. Accepts "ic"/"mainnet", "playground", and
    /// "local" (case-insensitive). Returns `Local` for any unrecognized
    /// value — the safe default is the network where mistakes are free.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ic" | "mainnet" => Network::Mainnet,
            "playground" => Network::Playground,
            _ => Network::Local,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Playground => write!(f, "playground"),
            Network::Local => write!(f, "local"),
        }
    }
}
