//! # Ledger Accounts
//!
//! Balances are held by a compound identifier: a principal (the owner)
//! plus an optional 32-byte subaccount. One principal can therefore own
//! any number of independent balances. An absent subaccount and an
//! all-zero subaccount name the same account, so [`Account::new`]
//! normalizes zeros away and equality stays honest.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::identity::Principal;

/// Byte length of every subaccount. Not a default, not a maximum: the
/// ledger rejects anything else.
pub const SUBACCOUNT_LEN: usize = 32;

/// Errors produced when constructing account components from raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// A subaccount must be exactly [`SUBACCOUNT_LEN`] bytes.
    #[error("subaccount must be {SUBACCOUNT_LEN} bytes, got {got}")]
    SubaccountLength {
        /// Length of the rejected input.
        got: usize,
    },

    /// A subaccount given as hex text did not decode.
    #[error("subaccount hex is invalid: {reason}")]
    SubaccountHex {
        /// What the hex decoder objected to.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Subaccount
// ---------------------------------------------------------------------------

/// A 32-byte subaccount discriminator.
///
/// Serializes as lowercase hex in human-readable formats and as raw bytes
/// in binary ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subaccount([u8; SUBACCOUNT_LEN]);

impl Subaccount {
    /// The default subaccount: all zeros. Equivalent to no subaccount at all.
    pub const DEFAULT: Subaccount = Subaccount([0u8; SUBACCOUNT_LEN]);

    /// Wraps an exact-size byte array.
    pub const fn from_bytes(bytes: [u8; SUBACCOUNT_LEN]) -> Self {
        Subaccount(bytes)
    }

    /// Validates and copies a byte slice of arbitrary length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AccountError> {
        let arr: [u8; SUBACCOUNT_LEN] = bytes
            .try_into()
            .map_err(|_| AccountError::SubaccountLength { got: bytes.len() })?;
        Ok(Subaccount(arr))
    }

    /// Parses a hex string (64 hex digits).
    pub fn from_hex(text: &str) -> Result<Self, AccountError> {
        let bytes = hex::decode(text.trim()).map_err(|e| AccountError::SubaccountHex {
            reason: e.to_string(),
        })?;
        Self::from_slice(&bytes)
    }

    /// Builds the conventional subaccount for a small index: the number in
    /// big-endian, right-aligned in 32 bytes. Index 0 is the default
    /// subaccount.
    pub fn from_index(index: u64) -> Self {
        let mut bytes = [0u8; SUBACCOUNT_LEN];
        bytes[SUBACCOUNT_LEN - 8..].copy_from_slice(&index.to_be_bytes());
        Subaccount(bytes)
    }

    /// Returns the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SUBACCOUNT_LEN] {
        &self.0
    }

    /// Returns `true` for the all-zero default subaccount.
    pub fn is_default(&self) -> bool {
        self.0 == [0u8; SUBACCOUNT_LEN]
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Subaccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Subaccount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Subaccount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            Subaccount::from_hex(&text).map_err(D::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Subaccount::from_slice(&bytes).map_err(D::Error::custom)
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A ledger account: owning principal plus optional subaccount.
///
/// `subaccount: None` and an all-zero subaccount are the same account on
/// the ledger, so the constructor folds zeros into `None` and derived
/// equality compares the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// The principal that controls the account.
    pub owner: Principal,
    /// Discriminator for additional balances under the same owner.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subaccount: Option<Subaccount>,
}

impl Account {
    /// Builds an account, normalizing the all-zero subaccount to `None`.
    pub fn new(owner: Principal, subaccount: Option<Subaccount>) -> Self {
        let subaccount = subaccount.filter(|s| !s.is_default());
        Account { owner, subaccount }
    }

    /// The default account of a principal (no subaccount).
    pub fn default_of(owner: Principal) -> Self {
        Account {
            owner,
            subaccount: None,
        }
    }
}

impl From<Principal> for Account {
    fn from(owner: Principal) -> Self {
        Account::default_of(owner)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subaccount {
            None => write!(f, "{}", self.owner),
            Some(sub) => write!(f, "{}.{}", self.owner, sub.to_hex()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
