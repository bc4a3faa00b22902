// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ZENITH Client — Token Ledger Access Done Carefully
//!
//! Core client library for the ZENITH dashboard: everything between a
//! user's keyboard and a remote fungible-token ledger, minus the pixels.
//! It scales decimal amounts without ever touching a float, keeps "the
//! network failed" strictly apart from "the ledger said no", and drives
//! transfers through an explicit state machine a presentation layer can
//! observe instead of being alerted at.
//!
//! ## Architecture
//!
//! ```text
//! client/src/
//! ├── config.rs        Networks, gateways, timeouts, conventions
//! ├── token/           Amounts, accounts, metadata
//! │   ├── amount.rs    u128 base units + the truncating decimal scaler
//! │   ├── account.rs   principal + optional subaccount identifiers
//! │   └── metadata.rs  name/symbol/decimals/fee/supply snapshot
//! ├── identity/        Who is calling
//! │   ├── principal.rs checksummed textual principal codec
//! │   ├── provider.rs  authentication seam + local dev provider
//! │   └── session.rs   login/restore/logout state machine
//! ├── ledger/          Talking to the ledger
//! │   ├── requests.rs  typed envelopes and transfer structs
//! │   ├── transport.rs HTTP gateway + the transport seam
//! │   └── client.rs    the validating facade
//! └── workflow/        Orchestration
//!     ├── state.rs     owned observable dashboard state
//!     ├── transfer.rs  submit/refresh controller + phase machine
//!     └── dashboard.rs composition root
//! ```
//!
//! ## Design Decisions
//!
//! - **Integers end to end.** Amounts are `u128` base units from the
//!   moment input parses; decimal strings exist only at the human edge.
//! - **Validate at the boundary.** Requests are typed structs checked
//!   before anything touches the wire; a malformed recipient never
//!   generates traffic.
//! - **Transfers submit once.** Nothing in this crate retries a
//!   state-mutating call. Queries are fair game; money is not.
//! - **State is owned, not ambient.** One state object, created at
//!   startup, shared by handle. No globals, no statics, no surprises.

pub mod config;
pub mod identity;
pub mod ledger;
pub mod token;
pub mod workflow;

pub use config::Network;
pub use identity::{
    AuthOutcome, DevIdentityProvider, Identity, IdentityProvider, MemorySessionStore, Principal,
    PrincipalError, SessionError, SessionManager, SessionState, SessionStore,
};
pub use ledger::{
    BlockIndex, HttpGatewayTransport, LedgerClient, LedgerError, LedgerTransport, TransferParams,
};
pub use token::{Account, AmountError, Subaccount, TokenAmount, TokenMetadata};
pub use workflow::{Dashboard, DashboardState, TransferController, TransferPhase, WorkflowError};

/// Crate version, straight from the manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn version_is_wired_to_the_manifest() {
        assert!(!super::VERSION.is_empty());
    }
}
