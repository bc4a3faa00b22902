//! # Session Management
//!
//! One authenticated session at a time, moving through exactly three
//! states:
//!
//! ```text
//!                    login()
//!   Unauthenticated ---------> Authenticating ---------> Authenticated
//!          ^                        |    |                    |
//!          |   dismissed / failed   |    | provider vouches   |
//!          +------------------------+    +--------------------+
//!          |                                  logout()         |
//!          +---------------------------------------------------+
//! ```
//!
//! ## Design Decisions
//!
//! - **Dismissal resolves.** A user closing the provider prompt lands the
//!   machine back in `Unauthenticated` with a successful `Dismissed`
//!   outcome. Only a provider fault is an error.
//! - **No lock across an await.** The state lock is taken to transition
//!   and released before the provider call suspends. A drop guard walks
//!   `Authenticating` back if the login future is cancelled mid-flight,
//!   so an abandoned prompt can never wedge the machine.
//! - **Persistence is best-effort.** Failing to save a session is a
//!   warning, not a failed login; failing to load one at startup is an
//!   absent session, not a startup error.

use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::provider::{AuthOutcome, Identity, IdentityProvider};
use super::Principal;

/// Errors surfaced by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The identity provider reported a fault. Distinct from the user
    /// dismissing the prompt, which is not an error at all.
    #[error("authentication failed: {reason}")]
    AuthFailed {
        /// The provider's description of the fault.
        reason: String,
    },

    /// `login` was called while another login was still suspended.
    #[error("an authentication attempt is already in progress")]
    AuthenticationInProgress,

    /// The session store refused an operation that must not be silent,
    /// such as clearing a session on logout.
    #[error("session store failed: {reason}")]
    Store {
        /// The store's description of the fault.
        reason: String,
    },
}

/// The session store failed to read or write persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct StoreError {
    /// Human-readable description.
    pub reason: String,
}

impl StoreError {
    pub fn new(reason: impl Into<String>) -> Self {
        StoreError {
            reason: reason.into(),
        }
    }
}

/// Persistence for the current session, so a restart can resume it.
///
/// Implementations hold at most one identity. All methods are quick local
/// operations; anything slower belongs behind the identity provider.
pub trait SessionStore: Send + Sync {
    /// Loads the persisted identity, if any.
    fn load(&self) -> Result<Option<Identity>, StoreError>;
    /// Persists an identity, replacing any previous one.
    fn save(&self, identity: &Identity) -> Result<(), StoreError>;
    /// Removes any persisted identity.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory session store. The default for tests and for callers that
/// do not want sessions to outlive the process.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<Identity>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Identity>, StoreError> {
        Ok(self.slot.read().clone())
    }

    fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        *self.slot.write() = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.write() = None;
        Ok(())
    }
}

/// Observable authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No identity. The only state from which `login` proceeds.
    #[default]
    Unauthenticated,
    /// A login is suspended on the provider.
    Authenticating,
    /// The session acts as this identity.
    Authenticated(Identity),
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Owns the authentication state machine.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SessionManager {
    state: Arc<RwLock<SessionState>>,
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
}

/// Walks `Authenticating` back to `Unauthenticated` if the login future
/// is dropped before the provider resolves.
struct PendingAuth {
    state: Arc<RwLock<SessionState>>,
    armed: bool,
}

impl PendingAuth {
    fn defuse(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingAuth {
    fn drop(&mut self) {
        if self.armed {
            debug!("login cancelled while pending; resetting session state");
            *self.state.write() = SessionState::Unauthenticated;
        }
    }
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn SessionStore>) -> Self {
        SessionManager {
            state: Arc::new(RwLock::new(SessionState::Unauthenticated)),
            provider,
            store,
        }
    }

    /// Runs one interactive login round.
    ///
    /// Suspends until the provider resolves. Dismissal is a successful
    /// outcome that leaves the session unauthenticated. Calling while a
    /// round is already pending fails with
    /// [`SessionError::AuthenticationInProgress`]; calling while already
    /// authenticated returns the existing identity without contacting the
    /// provider.
    pub async fn login(&self) -> Result<AuthOutcome, SessionError> {
        {
            let mut state = self.state.write();
            match &*state {
                SessionState::Authenticating => {
                    return Err(SessionError::AuthenticationInProgress);
                }
                SessionState::Authenticated(identity) => {
                    return Ok(AuthOutcome::Authenticated(identity.clone()));
                }
                SessionState::Unauthenticated => {
                    *state = SessionState::Authenticating;
                }
            }
        }
        let mut pending = PendingAuth {
            state: Arc::clone(&self.state),
            armed: true,
        };

        // Lock released; the provider may take as long as it likes.
        let outcome = self.provider.authenticate().await;
        pending.defuse();

        match outcome {
            Ok(AuthOutcome::Authenticated(identity)) => {
                *self.state.write() = SessionState::Authenticated(identity.clone());
                info!(principal = %identity.principal, "session established");
                if let Err(e) = self.store.save(&identity) {
                    warn!(error = %e, "failed to persist session; continuing unpersisted");
                }
                Ok(AuthOutcome::Authenticated(identity))
            }
            Ok(AuthOutcome::Dismissed) => {
                *self.state.write() = SessionState::Unauthenticated;
                debug!("login dismissed by user");
                Ok(AuthOutcome::Dismissed)
            }
            Err(e) => {
                *self.state.write() = SessionState::Unauthenticated;
                warn!(error = %e, "identity provider failed");
                Err(SessionError::AuthFailed { reason: e.reason })
            }
        }
    }

    /// Resumes a persisted session, if one exists and is still valid.
    ///
    /// Intended to run once at startup, before any interactive login.
    /// Unreadable or expired sessions are discarded and reported as
    /// absent, never as startup failures.
    pub fn restore_session(&self) -> Option<Identity> {
        {
            let state = self.state.read();
            if let SessionState::Authenticated(identity) = &*state {
                return Some(identity.clone());
            }
        }

        let loaded = match self.store.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "session store unreadable; discarding persisted session");
                let _ = self.store.clear();
                return None;
            }
        };
        let identity = loaded?;

        if identity.is_expired(chrono::Utc::now()) {
            debug!(principal = %identity.principal, "persisted session expired; discarding");
            let _ = self.store.clear();
            return None;
        }

        info!(principal = %identity.principal, "session restored");
        *self.state.write() = SessionState::Authenticated(identity.clone());
        Some(identity)
    }

    /// The current state, cloned. Never blocks on I/O.
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// The authenticated principal, if any. Pure accessor: answers from
    /// state already in hand, no provider or store traffic.
    pub fn current_principal(&self) -> Option<Principal> {
        match &*self.state.read() {
            SessionState::Authenticated(identity) => Some(identity.principal.clone()),
            _ => None,
        }
    }

    /// The full authenticated identity, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        match &*self.state.read() {
            SessionState::Authenticated(identity) => Some(identity.clone()),
            _ => None,
        }
    }

    /// Drops the session and clears persistence.
    pub fn logout(&self) -> Result<(), SessionError> {
        *self.state.write() = SessionState::Unauthenticated;
        info!("session ended");
        self.store.clear().map_err(|e| SessionError::Store {
            reason: e.reason,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
