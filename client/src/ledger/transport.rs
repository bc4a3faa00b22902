//! # Gateway Transport
//!
//! Moves envelopes to a ledger gateway and back. Everything above this
//! layer deals in typed requests and replies; everything below it is
//! HTTP. The [`LedgerTransport`] trait is the seam tests stand on: the
//! facade and workflow are exercised against a scripted transport, and
//! only [`HttpGatewayTransport`] ever opens a socket.
//!
//! ## Design Decisions
//!
//! - **Two deadlines.** Queries get a short timeout; updates a longer
//!   one, because a transfer that is still being certified is not yet
//!   lost. Timeouts surface as transport errors either way — this layer
//!   never retries, and for updates nothing above it does either.
//! - **Root of trust at connect.** On development networks the gateway's
//!   signing key is fetched once when the transport is built, mirroring
//!   what a production client carries built in. Failing that fetch fails
//!   the connect: talking to an unverifiable gateway is worse than not
//!   talking at all.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::requests::{CallEnvelope, CallKind, LedgerMethod, Reply};
use crate::config::{Network, CONNECT_TIMEOUT, QUERY_TIMEOUT, UPDATE_TIMEOUT};
use crate::identity::Principal;

/// Longest error-body excerpt carried into an error message.
const BODY_SNIPPET_LEN: usize = 200;

/// The transport could not complete a round trip. None of these variants
/// carry a ledger decision: the call may or may not have executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection failed or was dropped mid-exchange.
    #[error("gateway unreachable: {reason}")]
    Unreachable {
        /// The underlying I/O failure.
        reason: String,
    },

    /// The deadline elapsed before a reply arrived.
    #[error("gateway timed out after {seconds}s")]
    Timeout {
        /// The deadline that elapsed.
        seconds: u64,
    },

    /// The gateway answered outside the 2xx range.
    #[error("gateway returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Leading excerpt of the response body.
        body: String,
    },

    /// The gateway answered 2xx but the body was not a reply envelope.
    #[error("gateway reply was not a valid envelope: {detail}")]
    MalformedEnvelope {
        /// What the decoder objected to.
        detail: String,
    },

    /// The gateway's status document is missing or corrupts the root key.
    #[error("gateway status is unusable: {detail}")]
    BadStatus {
        /// What was wrong with the document.
        detail: String,
    },
}

/// One call to one ledger. Implementations perform exactly one round
/// trip per invocation: no retries, no fan-out.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn call(
        &self,
        ledger: &Principal,
        method: LedgerMethod,
        args: Value,
    ) -> Result<Reply, TransportError>;
}

// ---------------------------------------------------------------------------
// HTTP gateway
// ---------------------------------------------------------------------------

/// HTTPS transport to a ledger gateway.
pub struct HttpGatewayTransport {
    http: reqwest::Client,
    base_url: String,
    /// Gateway signing key fetched at connect on development networks.
    /// `None` on the production network, where trust is built in.
    root_key: Option<Vec<u8>>,
}

impl HttpGatewayTransport {
    /// Connects using the network's default gateway.
    pub async fn connect(network: Network) -> Result<Self, TransportError> {
        let base_url = network.gateway_url().to_string();
        Self::connect_to(network, base_url).await
    }

    /// Connects to an explicit gateway URL, for non-default deployments.
    pub async fn connect_to(
        network: Network,
        base_url: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(QUERY_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Unreachable {
                reason: e.to_string(),
            })?;

        let mut transport = HttpGatewayTransport {
            http,
            base_url,
            root_key: None,
        };

        if network.requires_root_key_fetch() {
            let key = transport.fetch_root_key().await?;
            info!(
                gateway = %transport.base_url,
                key_prefix = %hex::encode(&key[..key.len().min(8)]),
                "anchored trust to development gateway root key"
            );
            transport.root_key = Some(key);
        }

        Ok(transport)
    }

    /// The gateway this transport talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The fetched development root key, if this is not the production
    /// network.
    pub fn root_key(&self) -> Option<&[u8]> {
        self.root_key.as_deref()
    }

    async fn fetch_root_key(&self) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/api/v1/status", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(classify_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::BadStatus {
                detail: e.to_string(),
            })?;
        parse_status_root_key(&body)
    }
}

#[async_trait]
impl LedgerTransport for HttpGatewayTransport {
    async fn call(
        &self,
        ledger: &Principal,
        method: LedgerMethod,
        args: Value,
    ) -> Result<Reply, TransportError> {
        let path = match method.kind() {
            CallKind::Query => "query",
            CallKind::Update => "call",
        };
        let url = format!("{}/api/v1/canister/{}/{}", self.base_url, ledger, path);
        let envelope = CallEnvelope::new(method, args);

        debug!(%method, %ledger, kind = ?method.kind(), "calling ledger");
        let mut request = self.http.post(&url).json(&envelope);
        if method.kind() == CallKind::Update {
            request = request.timeout(UPDATE_TIMEOUT);
        }

        let response = request.send().await.map_err(classify_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        response
            .json::<Reply>()
            .await
            .map_err(|e| TransportError::MalformedEnvelope {
                detail: e.to_string(),
            })
    }
}

/// Extracts the hex-encoded `root_key` field from a gateway status body.
fn parse_status_root_key(body: &Value) -> Result<Vec<u8>, TransportError> {
    let text = body
        .get("root_key")
        .and_then(Value::as_str)
        .ok_or_else(|| TransportError::BadStatus {
            detail: "missing root_key field".to_string(),
        })?;
    let key = hex::decode(text).map_err(|e| TransportError::BadStatus {
        detail: format!("root_key is not valid hex: {}", e),
    })?;
    if key.is_empty() {
        return Err(TransportError::BadStatus {
            detail: "root_key is empty".to_string(),
        });
    }
    Ok(key)
}

fn classify_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        // Report the longer of the two deadlines; reqwest does not say
        // which one fired.
        TransportError::Timeout {
            seconds: UPDATE_TIMEOUT.as_secs(),
        }
    } else {
        TransportError::Unreachable {
            reason: e.to_string(),
        }
    }
}

fn snippet(body: &str) -> String {
    let mut out: String = body.chars().take(BODY_SNIPPET_LEN).collect();
    if body.chars().count() > BODY_SNIPPET_LEN {
        out.push_str("...");
    }
    out
}

// ---------------------------------------------------------------------------
// Scripted transport for unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use tokio::sync::Notify;

    struct ScriptedCall {
        reply: Result<Reply, TransportError>,
        gate: Option<Arc<Notify>>,
    }

    /// Transport that replays scripted replies and records every call.
    ///
    /// Replies are claimed in arrival order; a gated reply parks its
    /// caller until the test releases it, which is how out-of-order
    /// completions are staged deterministically.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        script: Mutex<HashMap<LedgerMethod, VecDeque<ScriptedCall>>>,
        log: Mutex<Vec<LedgerMethod>>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Queues a successful reply carrying `value`.
        pub(crate) fn push_reply(&self, method: LedgerMethod, value: Value) {
            self.push(method, Ok(Reply::Replied { reply: value }), None);
        }

        /// Queues a network-level rejection envelope.
        pub(crate) fn push_rejection(&self, method: LedgerMethod, message: &str) {
            self.push(
                method,
                Ok(Reply::Rejected {
                    code: Some(4),
                    message: message.to_string(),
                }),
                None,
            );
        }

        /// Queues a transport failure.
        pub(crate) fn push_error(&self, method: LedgerMethod, error: TransportError) {
            self.push(method, Err(error), None);
        }

        /// Queues a successful reply that is withheld until the returned
        /// notify is triggered.
        pub(crate) fn push_gated_reply(&self, method: LedgerMethod, value: Value) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.push(
                method,
                Ok(Reply::Replied { reply: value }),
                Some(Arc::clone(&gate)),
            );
            gate
        }

        fn push(
            &self,
            method: LedgerMethod,
            reply: Result<Reply, TransportError>,
            gate: Option<Arc<Notify>>,
        ) {
            self.script
                .lock()
                .entry(method)
                .or_default()
                .push_back(ScriptedCall { reply, gate });
        }

        /// Every call made, in order.
        pub(crate) fn calls(&self) -> Vec<LedgerMethod> {
            self.log.lock().clone()
        }

        /// How many calls hit one method.
        pub(crate) fn call_count(&self, method: LedgerMethod) -> usize {
            self.log.lock().iter().filter(|m| **m == method).count()
        }

        /// Total calls across all methods.
        pub(crate) fn total_calls(&self) -> usize {
            self.log.lock().len()
        }
    }

    #[async_trait]
    impl LedgerTransport for MockTransport {
        async fn call(
            &self,
            _ledger: &Principal,
            method: LedgerMethod,
            _args: Value,
        ) -> Result<Reply, TransportError> {
            // Claim the reply at arrival so concurrent callers map to
            // scripted entries in the order they reached the wire.
            let scripted = {
                let mut script = self.script.lock();
                self.log.lock().push(method);
                script.entry(method).or_default().pop_front()
            };
            let Some(scripted) = scripted else {
                return Err(TransportError::Unreachable {
                    reason: format!("no scripted reply for {}", method),
                });
            };
            if let Some(gate) = scripted.gate {
                gate.notified().await;
            }
            scripted.reply
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
