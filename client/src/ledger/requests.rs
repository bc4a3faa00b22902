//! # Ledger Wire Types
//!
//! Every exchange with a ledger is a typed request and a typed reply.
//! Building requests from structs instead of ad-hoc JSON means a malformed
//! call fails at the construction site, in this process, before a single
//! byte leaves it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::token::{Account, Subaccount, TokenAmount};

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// Whether a call reads state or changes it.
///
/// The distinction matters to the transport (different endpoint, longer
/// deadline for updates) and to retry policy: queries may be repeated
/// freely, updates never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Query,
    Update,
}

/// The ledger methods this client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerMethod {
    /// Full token name.
    #[serde(rename = "icrc1_name")]
    TokenName,
    /// Ticker symbol.
    #[serde(rename = "icrc1_symbol")]
    TokenSymbol,
    /// Fractional digits of the human representation.
    #[serde(rename = "icrc1_decimals")]
    Decimals,
    /// Flat per-transfer fee in base units.
    #[serde(rename = "icrc1_fee")]
    TransferFee,
    /// Total supply in base units.
    #[serde(rename = "icrc1_total_supply")]
    TotalSupply,
    /// Balance of one account in base units.
    #[serde(rename = "icrc1_balance_of")]
    BalanceOf,
    /// Move tokens between accounts.
    #[serde(rename = "icrc1_transfer")]
    Transfer,
}

impl LedgerMethod {
    /// The wire name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerMethod::TokenName => "icrc1_name",
            LedgerMethod::TokenSymbol => "icrc1_symbol",
            LedgerMethod::Decimals => "icrc1_decimals",
            LedgerMethod::TransferFee => "icrc1_fee",
            LedgerMethod::TotalSupply => "icrc1_total_supply",
            LedgerMethod::BalanceOf => "icrc1_balance_of",
            LedgerMethod::Transfer => "icrc1_transfer",
        }
    }

    /// Transfers change state; everything else reads it.
    pub fn kind(&self) -> CallKind {
        match self {
            LedgerMethod::Transfer => CallKind::Update,
            _ => CallKind::Query,
        }
    }
}

impl fmt::Display for LedgerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// The request body posted to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEnvelope {
    /// Which method to invoke on the ledger.
    pub method: LedgerMethod,
    /// Method arguments; `null` for the argumentless metadata queries.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub args: serde_json::Value,
}

impl CallEnvelope {
    pub fn new(method: LedgerMethod, args: serde_json::Value) -> Self {
        CallEnvelope { method, args }
    }
}

/// The reply envelope the gateway wraps every response in.
///
/// `rejected` means the network declined to execute the call at all. It
/// carries no ledger decision, so for a transfer it must never be read as
/// "the ledger said no" — the ledger was never consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    /// The call executed; `reply` holds the method's return value.
    Replied { reply: serde_json::Value },
    /// The network refused the call before the ledger saw it.
    Rejected {
        /// Reject code, when the gateway supplies one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<u64>,
        /// Human-readable rejection reason.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// Position of a transaction in the ledger's chain. The receipt a
/// successful transfer returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockIndex(pub u128);

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BlockIndex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            crate::token::amount::nat_string::serialize(&self.0, serializer)
        } else {
            serializer.serialize_u128(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for BlockIndex {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            crate::token::amount::nat_string::deserialize(deserializer).map(BlockIndex)
        } else {
            u128::deserialize(deserializer).map(BlockIndex)
        }
    }
}

/// What a caller asks the facade to transfer.
///
/// The recipient principal stays textual here on purpose: parsing it is
/// the facade's first act, so a typo is caught at the boundary and
/// reported before any request exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    /// Recipient principal in textual form, exactly as the user gave it.
    pub to_principal: String,
    /// Recipient subaccount; `None` for the default account.
    pub to_subaccount: Option<Subaccount>,
    /// Amount in base units.
    pub amount: TokenAmount,
    /// Fee in base units. `None` lets the ledger apply its published fee.
    pub fee: Option<TokenAmount>,
    /// Opaque caller annotation carried into the ledger record.
    pub memo: Option<Vec<u8>>,
    /// Sender subaccount to draw from; `None` for the default account.
    pub from_subaccount: Option<Subaccount>,
    /// Caller timestamp in nanoseconds since the Unix epoch, for ledger
    /// deduplication. `None` lets the facade stamp submission time.
    pub created_at_time: Option<u64>,
}

impl TransferParams {
    /// A transfer of `amount` to the default account of `to_principal`,
    /// with every optional left to its default.
    pub fn new(to_principal: impl Into<String>, amount: TokenAmount) -> Self {
        TransferParams {
            to_principal: to_principal.into(),
            to_subaccount: None,
            amount,
            fee: None,
            memo: None,
            from_subaccount: None,
            created_at_time: None,
        }
    }

    pub fn with_to_subaccount(mut self, subaccount: Subaccount) -> Self {
        self.to_subaccount = Some(subaccount);
        self
    }

    pub fn with_fee(mut self, fee: TokenAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_memo(mut self, memo: Vec<u8>) -> Self {
        self.memo = Some(memo);
        self
    }

    pub fn with_from_subaccount(mut self, subaccount: Subaccount) -> Self {
        self.from_subaccount = Some(subaccount);
        self
    }

    pub fn with_created_at_time(mut self, nanos: u64) -> Self {
        self.created_at_time = Some(nanos);
        self
    }
}

/// The wire form of a transfer, all fields validated and typed. Optionals
/// the caller left unset are omitted from the body entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferArg {
    /// Destination account.
    pub to: Account,
    /// Amount in base units.
    pub amount: TokenAmount,
    /// Explicit fee, if the caller pinned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<TokenAmount>,
    /// Opaque memo bytes, hex in human-readable formats.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_hex_bytes")]
    pub memo: Option<Vec<u8>>,
    /// Sender subaccount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_subaccount: Option<Subaccount>,
    /// Deduplication timestamp, nanoseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_time: Option<u64>,
}

/// The ledger's decision on a transfer. `Err` is a real decision from a
/// successful round trip: the ledger looked at the request and declined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferReply {
    /// Accepted; the value is the block index of the recorded transaction.
    Ok(BlockIndex),
    /// Declined, with the ledger's reason.
    Err(String),
}

/// Serde for `Option<Vec<u8>>` as lowercase hex in human-readable formats.
mod opt_hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) if serializer.is_human_readable() => {
                serializer.serialize_some(&hex::encode(bytes))
            }
            Some(bytes) => serializer.serialize_some(bytes),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        if deserializer.is_human_readable() {
            let text: Option<String> = Option::deserialize(deserializer)?;
            text.map(|t| hex::decode(t).map_err(D::Error::custom))
                .transpose()
        } else {
            Option::deserialize(deserializer)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
