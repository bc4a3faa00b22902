//! # Ledger Client Facade
//!
//! The one place the rest of the client talks to a token ledger. Callers
//! hand it typed parameters; it builds wire envelopes, runs exactly one
//! round trip per operation, and hands back typed results.
//!
//! ## Design Decisions
//!
//! - **Validate before the wire.** A transfer's recipient is parsed at
//!   this boundary. A malformed principal fails locally with
//!   [`LedgerError::InvalidRecipient`] and the transport is never touched.
//! - **Two kinds of "no".** [`LedgerError::Unavailable`] means the round
//!   trip did not complete or the network refused to run the call — the
//!   ledger rendered no decision. [`LedgerError::Rejected`] means the
//!   round trip succeeded and the ledger itself declined. Callers that
//!   blur the two will retry transfers that were actually processed, or
//!   report declines as outages.
//! - **Transfers run once.** Queries are idempotent and a caller may
//!   repeat them; a transfer is submitted exactly once per call, whatever
//!   the failure. Deduplication-by-retry is the caller's decision to make
//!   with the ledger's dedup window, never this facade's.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::requests::{BlockIndex, LedgerMethod, Reply, TransferArg, TransferParams, TransferReply};
use super::transport::LedgerTransport;
use crate::identity::{Principal, PrincipalError};
use crate::token::{Account, TokenAmount, TokenMetadata};

/// Errors surfaced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The round trip failed or the network refused to execute the call.
    /// The ledger made no decision; a submitted transfer may or may not
    /// have been recorded.
    #[error("ledger unavailable: {reason}")]
    Unavailable {
        /// What prevented the exchange.
        reason: String,
    },

    /// The ledger processed the request and declined it. The round trip
    /// itself succeeded.
    #[error("transfer rejected by ledger: {reason}")]
    Rejected {
        /// The ledger's stated reason.
        reason: String,
    },

    /// The recipient text is not a well-formed principal. Raised locally,
    /// before any network traffic.
    #[error("recipient is not a valid principal: {0}")]
    InvalidRecipient(#[from] PrincipalError),

    /// An exchange completed but its payload did not decode.
    #[error("malformed {method} exchange: {detail}")]
    Malformed {
        /// The method whose payload failed to decode.
        method: &'static str,
        /// What the decoder objected to.
        detail: String,
    },
}

/// Typed access to one token ledger.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct LedgerClient {
    transport: Arc<dyn LedgerTransport>,
    ledger_id: Principal,
}

impl LedgerClient {
    pub fn new(transport: Arc<dyn LedgerTransport>, ledger_id: Principal) -> Self {
        LedgerClient {
            transport,
            ledger_id,
        }
    }

    /// The ledger this client is bound to.
    pub fn ledger_id(&self) -> &Principal {
        &self.ledger_id
    }

    // -- Metadata queries ---------------------------------------------------

    /// Full token name, e.g. "Zenith Test Token".
    pub async fn token_name(&self) -> Result<String, LedgerError> {
        self.query_typed(LedgerMethod::TokenName, Value::Null).await
    }

    /// Ticker symbol, e.g. "ZTH".
    pub async fn token_symbol(&self) -> Result<String, LedgerError> {
        self.query_typed(LedgerMethod::TokenSymbol, Value::Null).await
    }

    /// Fractional digits of the human representation.
    pub async fn decimals(&self) -> Result<u8, LedgerError> {
        self.query_typed(LedgerMethod::Decimals, Value::Null).await
    }

    /// Flat per-transfer fee in base units.
    pub async fn transfer_fee(&self) -> Result<TokenAmount, LedgerError> {
        self.query_typed(LedgerMethod::TransferFee, Value::Null).await
    }

    /// Total supply in base units.
    pub async fn total_supply(&self) -> Result<TokenAmount, LedgerError> {
        self.query_typed(LedgerMethod::TotalSupply, Value::Null).await
    }

    /// Fetches all five metadata facts concurrently.
    ///
    /// The five queries are issued together and all of them settle before
    /// this returns, success or not — no partial snapshot is ever
    /// presented, and a caller never sees a symbol without its decimals.
    pub async fn metadata(&self) -> Result<TokenMetadata, LedgerError> {
        let (name, symbol, decimals, fee, total_supply) = tokio::join!(
            self.token_name(),
            self.token_symbol(),
            self.decimals(),
            self.transfer_fee(),
            self.total_supply(),
        );
        let metadata = TokenMetadata {
            name: name?,
            symbol: symbol?,
            decimals: decimals?,
            fee: fee?,
            total_supply: total_supply?,
        };
        debug!(
            name = %metadata.name,
            symbol = %metadata.symbol,
            decimals = metadata.decimals,
            "loaded token metadata"
        );
        Ok(metadata)
    }

    // -- Balance ------------------------------------------------------------

    /// Balance of an account in base units. Missing accounts are simply
    /// zero; the ledger does not distinguish "never seen" from "empty".
    pub async fn balance_of(&self, account: &Account) -> Result<TokenAmount, LedgerError> {
        let args = encode_args(LedgerMethod::BalanceOf, account)?;
        self.query_typed(LedgerMethod::BalanceOf, args).await
    }

    // -- Transfer -----------------------------------------------------------

    /// Submits one transfer and reports the ledger's decision.
    ///
    /// The recipient text is validated first; a malformed principal fails
    /// with [`LedgerError::InvalidRecipient`] and nothing is sent. After
    /// validation the transfer is submitted exactly once — never retried,
    /// not even on a transport error, because an unobserved outcome is
    /// not the same as a failure.
    pub async fn transfer(&self, params: TransferParams) -> Result<BlockIndex, LedgerError> {
        // Local validation first: no request exists until this passes.
        let to_owner = Principal::from_text(&params.to_principal)?;

        let arg = TransferArg {
            to: Account::new(to_owner, params.to_subaccount),
            amount: params.amount,
            fee: params.fee,
            memo: params.memo,
            from_subaccount: params.from_subaccount,
            created_at_time: params.created_at_time,
        };
        let args = encode_args(LedgerMethod::Transfer, &arg)?;

        info!(
            to = %arg.to,
            amount = %arg.amount,
            "submitting transfer"
        );
        let reply = self.round_trip(LedgerMethod::Transfer, args).await?;
        match decode_reply::<TransferReply>(LedgerMethod::Transfer, reply)? {
            TransferReply::Ok(block_index) => {
                info!(%block_index, "transfer recorded");
                Ok(block_index)
            }
            TransferReply::Err(reason) => {
                warn!(%reason, "transfer rejected by ledger");
                Err(LedgerError::Rejected { reason })
            }
        }
    }

    // -- Plumbing -----------------------------------------------------------

    async fn query_typed<T: DeserializeOwned>(
        &self,
        method: LedgerMethod,
        args: Value,
    ) -> Result<T, LedgerError> {
        let reply = self.round_trip(method, args).await?;
        decode_reply(method, reply)
    }

    /// One round trip through the transport. A network-level rejection
    /// carries no ledger decision, so it surfaces as unavailability for
    /// queries and transfers alike.
    async fn round_trip(&self, method: LedgerMethod, args: Value) -> Result<Value, LedgerError> {
        match self.transport.call(&self.ledger_id, method, args).await {
            Ok(Reply::Replied { reply }) => Ok(reply),
            Ok(Reply::Rejected { code, message }) => Err(LedgerError::Unavailable {
                reason: match code {
                    Some(code) => format!("network rejected the call (code {}): {}", code, message),
                    None => format!("network rejected the call: {}", message),
                },
            }),
            Err(e) => Err(LedgerError::Unavailable {
                reason: e.to_string(),
            }),
        }
    }
}

fn encode_args<T: serde::Serialize>(
    method: LedgerMethod,
    args: &T,
) -> Result<Value, LedgerError> {
    serde_json::to_value(args).map_err(|e| LedgerError::Malformed {
        method: method.name(),
        detail: format!("request encoding failed: {}", e),
    })
}

fn decode_reply<T: DeserializeOwned>(
    method: LedgerMethod,
    reply: Value,
) -> Result<T, LedgerError> {
    serde_json::from_value(reply).map_err(|e| LedgerError::Malformed {
        method: method.name(),
        detail: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
