//! # Token Types
//!
//! Value types shared by every layer of the client: amounts in base
//! units, the accounts that hold them, and the per-ledger metadata that
//! gives both their human meaning.
//!
//! - [`amount`] — base-unit amounts and the decimal scaler
//! - [`account`] — principal + subaccount account identifiers
//! - [`metadata`] — the token's name, symbol, decimals, fee, and supply

pub mod account;
pub mod amount;
pub mod metadata;

pub use account::{Account, AccountError, Subaccount, SUBACCOUNT_LEN};
pub use amount::{AmountError, TokenAmount};
pub use metadata::TokenMetadata;
