//! # Dashboard Composition Root
//!
//! Wires the session manager, ledger facade, shared state, and transfer
//! controller into the one object a presentation layer holds. The
//! observable values are metadata, balance, session state, and transfer
//! phase; the mutating entry points are `login`, `logout`,
//! `submit_transfer`, and `refresh_balance`. Nothing else mutates.

use tracing::{debug, warn};

use super::state::DashboardState;
use super::transfer::{TransferController, TransferPhase, WorkflowError};
use crate::identity::{AuthOutcome, Principal, SessionError, SessionManager, SessionState};
use crate::ledger::{BlockIndex, LedgerClient};
use crate::token::{TokenAmount, TokenMetadata};

/// The assembled client core.
///
/// Cheap to clone; clones share every component.
#[derive(Clone)]
pub struct Dashboard {
    session: SessionManager,
    ledger: LedgerClient,
    state: DashboardState,
    controller: TransferController,
}

impl Dashboard {
    pub fn new(ledger: LedgerClient, session: SessionManager) -> Self {
        let state = DashboardState::new();
        let controller = TransferController::new(ledger.clone(), session.clone(), state.clone());
        Dashboard {
            session,
            ledger,
            state,
            controller,
        }
    }

    /// Brings the dashboard up: resumes any persisted session, loads
    /// token metadata, and refreshes the balance if signed in.
    ///
    /// Deliberately best-effort. A dashboard with no metadata still lets
    /// the user log in and retry via [`Dashboard::reload_metadata`];
    /// transfers stay unavailable until metadata loads.
    pub async fn startup(&self) {
        if let Some(identity) = self.session.restore_session() {
            debug!(principal = %identity.principal, "resumed persisted session");
        }

        match self.ledger.metadata().await {
            Ok(metadata) => self.state.set_metadata(metadata),
            Err(e) => {
                warn!(error = %e, "initial metadata fetch failed; transfers unavailable until reloaded");
            }
        }

        if self.session.current_principal().is_some() {
            if let Err(e) = self.controller.refresh_balance().await {
                warn!(error = %e, "initial balance refresh failed");
            }
        }
    }

    /// Fetches metadata again, replacing the stored snapshot. The typed
    /// retry path for a failed startup fetch.
    pub async fn reload_metadata(&self) -> Result<TokenMetadata, WorkflowError> {
        let metadata = self.ledger.metadata().await?;
        self.state.set_metadata(metadata.clone());
        Ok(metadata)
    }

    // -- Session ------------------------------------------------------------

    /// Runs an interactive login. On success the balance is refreshed so
    /// the freshly signed-in account has something to look at.
    pub async fn login(&self) -> Result<AuthOutcome, SessionError> {
        let outcome = self.session.login().await?;
        if matches!(outcome, AuthOutcome::Authenticated(_)) {
            if let Err(e) = self.controller.refresh_balance().await {
                warn!(error = %e, "post-login balance refresh failed");
            }
        }
        Ok(outcome)
    }

    /// Signs out and drops everything tied to the account.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.state.forget_account();
        self.session.logout()
    }

    /// Current session state.
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// The signed-in principal, if any.
    pub fn current_principal(&self) -> Option<Principal> {
        self.session.current_principal()
    }

    // -- Transfers ----------------------------------------------------------

    /// Submits a transfer from form input. See
    /// [`TransferController::submit`] for the full contract.
    pub async fn submit_transfer(
        &self,
        recipient: &str,
        amount: &str,
    ) -> Result<BlockIndex, WorkflowError> {
        self.controller.submit(recipient, amount).await
    }

    /// Refreshes the signed-in account's balance.
    pub async fn refresh_balance(&self) -> Result<TokenAmount, WorkflowError> {
        self.controller.refresh_balance().await
    }

    /// Current transfer phase.
    pub fn transfer_phase(&self) -> TransferPhase {
        self.controller.phase()
    }

    /// Observes every transfer phase change.
    pub fn subscribe_transfer_phase(&self) -> tokio::sync::watch::Receiver<TransferPhase> {
        self.controller.subscribe()
    }

    /// Returns a terminal transfer phase to idle.
    pub fn acknowledge_transfer(&self) {
        self.controller.acknowledge();
    }

    // -- Observable state ---------------------------------------------------

    /// The shared state object, for presentation layers that read it
    /// directly.
    pub fn state(&self) -> &DashboardState {
        &self.state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
