//! # Token Metadata
//!
//! The five descriptive facts a ledger publishes about its token. Fetched
//! together once per session and then treated as stable: decimals in
//! particular feeds every scaling operation, so the snapshot a session
//! loads is the snapshot it keeps.

use serde::{Deserialize, Serialize};

use super::TokenAmount;

/// Descriptive metadata for one token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Full display name, e.g. "Zenith Test Token".
    pub name: String,
    /// Short ticker, e.g. "ZTH".
    pub symbol: String,
    /// Number of fractional digits in the human representation. Eight is
    /// typical; zero is legal.
    pub decimals: u8,
    /// Flat fee the ledger charges per transfer, in base units.
    pub fee: TokenAmount,
    /// Total supply in base units at the time of the snapshot.
    pub total_supply: TokenAmount,
}

impl TokenMetadata {
    /// Renders an amount using this token's decimals: `"1.23456789"`.
    pub fn display_amount(&self, amount: TokenAmount) -> String {
        amount.display_decimal(self.decimals)
    }

    /// Renders an amount with the ticker appended: `"1.23456789 ZTH"`.
    pub fn display_with_symbol(&self, amount: TokenAmount) -> String {
        format!("{} {}", self.display_amount(amount), self.symbol)
    }

    /// The transfer fee in display form.
    pub fn display_fee(&self) -> String {
        self.display_with_symbol(self.fee)
    }
}
