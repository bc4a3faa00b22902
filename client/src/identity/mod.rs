//! # Identity & Sessions
//!
//! Who the client is, and how it proves it. Principals identify callers
//! on the wire; identity providers run the interactive proof; the session
//! manager owns the resulting state machine.
//!
//! - [`principal`] — checksummed caller identifiers
//! - [`provider`] — the authentication seam and the local dev provider
//! - [`session`] — the login/restore/logout state machine and its store

pub mod principal;
pub mod provider;
pub mod session;

pub use principal::{Principal, PrincipalError, MAX_PRINCIPAL_LEN};
pub use provider::{AuthOutcome, DevIdentityProvider, Identity, IdentityProvider, ProviderError};
pub use session::{
    MemorySessionStore, SessionError, SessionManager, SessionState, SessionStore, StoreError,
};
