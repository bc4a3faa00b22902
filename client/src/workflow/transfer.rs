//! # Transfer Workflow
//!
//! Drives one transfer from form input to terminal outcome:
//!
//! ```text
//!            validate locally        submit once
//!   Idle --> Validating ----------> Submitting --> Succeeded
//!               |                        |             |
//!               | bad input              | declined /  |
//!               v                        v unavailable |
//!            Rejected                 Failed           |
//!               |                        |             |
//!               +---- acknowledge() -----+-------------+--> Idle
//! ```
//!
//! ## Design Decisions
//!
//! - **Preconditions are errors, not silence.** Submitting while signed
//!   out or before metadata loads returns a typed error and moves
//!   nothing. A disabled operation that merely ignores clicks is
//!   indistinguishable from a broken one.
//! - **`Rejected` never touched the wire.** It is reserved for local
//!   validation failures; `Failed` is reserved for submissions that went
//!   out and came back bad. An observer can tell from the phase alone
//!   whether the ledger might have seen the request.
//! - **One transfer in flight, ever.** A second submission races a real
//!   ledger decision; the guard refuses it before any request is built.
//!   Balance refreshes are deliberately not single-flight — they are
//!   idempotent reads and the state resolves races by last arrival.
//! - **The phase is the notification.** Outcomes land in a watch channel
//!   any presentation layer can observe; this crate never decides how to
//!   tell the user.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::state::DashboardState;
use crate::identity::{Principal, PrincipalError, SessionManager};
use crate::ledger::{BlockIndex, LedgerClient, LedgerError, TransferParams};
use crate::token::{Account, AmountError, TokenAmount};

/// Errors surfaced by workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// No authenticated session; sign in first.
    #[error("not signed in")]
    NotAuthenticated,

    /// Token metadata has not loaded, so amounts cannot be scaled.
    #[error("token metadata is not loaded yet")]
    MetadataNotLoaded,

    /// A transfer is already in flight on this controller.
    #[error("a transfer is already in progress")]
    TransferInProgress,

    /// The entered amount did not validate. Local; nothing was sent.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// The entered recipient did not validate. Local; nothing was sent.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(#[from] PrincipalError),

    /// The ledger exchange failed or was declined.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Where one submission currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransferPhase {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Local checks running; the network has not been touched.
    Validating,
    /// The transfer is on the wire awaiting the ledger's decision.
    Submitting,
    /// The ledger recorded the transaction.
    Succeeded {
        /// Position of the recorded transaction.
        block_index: BlockIndex,
    },
    /// Local validation failed; no request was ever built.
    Rejected {
        /// What was wrong with the input.
        reason: String,
    },
    /// Submission went out but did not succeed: the ledger declined it
    /// or the exchange never completed.
    Failed {
        /// The decline or transport reason.
        reason: String,
    },
}

impl TransferPhase {
    /// Terminal phases wait for [`TransferController::acknowledge`].
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferPhase::Succeeded { .. }
                | TransferPhase::Rejected { .. }
                | TransferPhase::Failed { .. }
        )
    }

    /// A submission is actively being worked on.
    pub fn is_busy(&self) -> bool {
        matches!(self, TransferPhase::Validating | TransferPhase::Submitting)
    }
}

/// Releases the single-flight slot when a submission ends, however it
/// ends — including the future being dropped mid-flight.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Orchestrates transfers and balance refreshes against one ledger.
///
/// Cheap to clone; clones share the phase channel and the single-flight
/// guard, so "one transfer at a time" holds across clones.
#[derive(Clone)]
pub struct TransferController {
    ledger: LedgerClient,
    session: SessionManager,
    state: DashboardState,
    phase_tx: Arc<watch::Sender<TransferPhase>>,
    phase_rx: watch::Receiver<TransferPhase>,
    in_flight: Arc<AtomicBool>,
}

impl TransferController {
    pub fn new(ledger: LedgerClient, session: SessionManager, state: DashboardState) -> Self {
        let (phase_tx, phase_rx) = watch::channel(TransferPhase::Idle);
        TransferController {
            ledger,
            session,
            state,
            phase_tx: Arc::new(phase_tx),
            phase_rx,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The current phase.
    pub fn phase(&self) -> TransferPhase {
        self.phase_rx.borrow().clone()
    }

    /// A receiver that observes every phase change.
    pub fn subscribe(&self) -> watch::Receiver<TransferPhase> {
        self.phase_rx.clone()
    }

    /// Returns a terminal phase to `Idle`. No-op otherwise: the machine
    /// resets when the outcome has been observed, never on a timer.
    pub fn acknowledge(&self) {
        if self.phase().is_terminal() {
            self.set_phase(TransferPhase::Idle);
        }
    }

    /// Submits one transfer from form input.
    ///
    /// Requires an authenticated session and loaded metadata; both are
    /// reported as typed errors without moving the phase. Input failures
    /// end in [`TransferPhase::Rejected`] with zero network traffic.
    /// Submission failures end in [`TransferPhase::Failed`] with the
    /// form preserved for correction. Success clears the form and
    /// triggers exactly one best-effort balance refresh.
    pub async fn submit(
        &self,
        recipient: &str,
        amount_text: &str,
    ) -> Result<BlockIndex, WorkflowError> {
        if self.session.current_principal().is_none() {
            return Err(WorkflowError::NotAuthenticated);
        }
        let Some(metadata) = self.state.metadata() else {
            return Err(WorkflowError::MetadataNotLoaded);
        };
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("second submission refused; a transfer is in flight");
            return Err(WorkflowError::TransferInProgress);
        }
        let guard = InFlight(Arc::clone(&self.in_flight));

        // Remember the input before anything can fail, so every failure
        // path leaves it available for correction.
        self.state.set_form(recipient, amount_text);
        self.set_phase(TransferPhase::Validating);

        let to = match Principal::from_text(recipient) {
            Ok(principal) => principal,
            Err(e) => {
                self.set_phase(TransferPhase::Rejected {
                    reason: e.to_string(),
                });
                return Err(WorkflowError::InvalidRecipient(e));
            }
        };
        let amount = match TokenAmount::from_decimal(amount_text, metadata.decimals) {
            Ok(amount) => amount,
            Err(e) => {
                self.set_phase(TransferPhase::Rejected {
                    reason: e.to_string(),
                });
                return Err(WorkflowError::InvalidAmount(e));
            }
        };

        self.set_phase(TransferPhase::Submitting);
        let params =
            TransferParams::new(to.to_text(), amount).with_created_at_time(now_nanos());

        match self.ledger.transfer(params).await {
            Ok(block_index) => {
                self.set_phase(TransferPhase::Succeeded { block_index });
                self.state.clear_form();
                drop(guard);
                // Exactly one refresh per success. Its failure is logged
                // and does not revert the outcome.
                self.refresh_best_effort().await;
                Ok(block_index)
            }
            Err(e) => {
                self.set_phase(TransferPhase::Failed {
                    reason: e.to_string(),
                });
                let ledger_declined = matches!(e, LedgerError::Rejected { .. });
                drop(guard);
                if ledger_declined {
                    // The decline proves the ledger is reachable and
                    // authoritative; reconcile in case the balance moved.
                    // On transport failure we skip this: the refresh
                    // would hit the same dead network.
                    self.refresh_best_effort().await;
                }
                Err(WorkflowError::Ledger(e))
            }
        }
    }

    /// Fetches the signed-in account's balance and records it.
    ///
    /// Refreshes may overlap freely; each response is recorded at
    /// arrival, so the last-arriving one is the one that sticks.
    pub async fn refresh_balance(&self) -> Result<TokenAmount, WorkflowError> {
        let principal = self
            .session
            .current_principal()
            .ok_or(WorkflowError::NotAuthenticated)?;
        let account = Account::default_of(principal);
        let amount = self.ledger.balance_of(&account).await?;
        self.state.record_balance(amount);
        Ok(amount)
    }

    async fn refresh_best_effort(&self) {
        if let Err(e) = self.refresh_balance().await {
            warn!(error = %e, "balance refresh failed; showing last known balance");
        }
    }

    fn set_phase(&self, phase: TransferPhase) {
        debug!(?phase, "transfer phase changed");
        self.phase_tx.send_replace(phase);
    }
}

/// Submission timestamp for ledger-side deduplication, nanoseconds since
/// the Unix epoch.
fn now_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .map(|n| n.max(0) as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DevIdentityProvider, MemorySessionStore};
    use crate::ledger::transport::mock::MockTransport;
    use crate::ledger::transport::{LedgerTransport, TransportError};
    use crate::ledger::LedgerMethod;
    use crate::token::TokenMetadata;
    use serde_json::json;

    struct Harness {
        transport: Arc<MockTransport>,
        controller: TransferController,
        state: DashboardState,
        session: SessionManager,
    }

    fn metadata() -> TokenMetadata {
        TokenMetadata {
            name: "Zenith Test Token".to_string(),
            symbol: "ZTH".to_string(),
            decimals: 8,
            fee: TokenAmount::new(10_000),
            total_supply: TokenAmount::new(100_000_000_000_000),
        }
    }

    fn harness() -> Harness {
        let transport = MockTransport::new();
        let session = SessionManager::new(
            Arc::new(DevIdentityProvider::generate()),
            Arc::new(MemorySessionStore::new()),
        );
        let state = DashboardState::new();
        let ledger = LedgerClient::new(
            Arc::clone(&transport) as Arc<dyn LedgerTransport>,
            "ryjl3-tyaaa-aaaaa-aaaba-cai".parse().unwrap(),
        );
        let controller = TransferController::new(ledger, session.clone(), state.clone());
        Harness {
            transport,
            controller,
            state,
            session,
        }
    }

    async fn ready_harness() -> Harness {
        let h = harness();
        h.session.login().await.unwrap();
        h.state.set_metadata(metadata());
        h
    }

    /// Spins the current-thread runtime until `done` holds.
    async fn until(done: impl Fn() -> bool) {
        while !done() {
            tokio::task::yield_now().await;
        }
    }

    // -- 1. Preconditions ----------------------------------------------------

    #[tokio::test]
    async fn submit_requires_a_session() {
        let h = harness();
        h.state.set_metadata(metadata());

        let err = h.controller.submit("2vxsx-fae", "1").await.unwrap_err();
        assert_eq!(err, WorkflowError::NotAuthenticated);
        // Unavailable, not half-started: the phase never moved.
        assert_eq!(h.controller.phase(), TransferPhase::Idle);
        assert_eq!(h.transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn submit_requires_loaded_metadata() {
        let h = harness();
        h.session.login().await.unwrap();

        let err = h.controller.submit("2vxsx-fae", "1").await.unwrap_err();
        assert_eq!(err, WorkflowError::MetadataNotLoaded);
        assert_eq!(h.controller.phase(), TransferPhase::Idle);
        assert_eq!(h.transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn refresh_requires_a_session() {
        let h = harness();
        let err = h.controller.refresh_balance().await.unwrap_err();
        assert_eq!(err, WorkflowError::NotAuthenticated);
    }

    // -- 2. The journeys -----------------------------------------------------

    #[tokio::test]
    async fn successful_transfer_clears_form_and_refreshes_once() {
        let h = ready_harness().await;
        h.transport
            .push_reply(LedgerMethod::Transfer, json!({ "Ok": "42" }));
        h.transport
            .push_reply(LedgerMethod::BalanceOf, json!("850000000"));

        let block = h.controller.submit("2vxsx-fae", "1.5").await.unwrap();
        assert_eq!(block, BlockIndex(42));
        assert_eq!(
            h.controller.phase(),
            TransferPhase::Succeeded {
                block_index: BlockIndex(42)
            }
        );
        assert!(h.state.form().is_empty());
        // Exactly one refresh, and its response was recorded.
        assert_eq!(h.transport.call_count(LedgerMethod::BalanceOf), 1);
        assert_eq!(h.state.balance().unwrap().amount, TokenAmount::new(850_000_000));
        assert_eq!(h.state.refreshes_recorded(), 1);
    }

    #[tokio::test]
    async fn invalid_amount_rejects_without_network() {
        let h = ready_harness().await;

        let err = h.controller.submit("2vxsx-fae", "1.2.3").await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidAmount(_)));
        assert!(matches!(
            h.controller.phase(),
            TransferPhase::Rejected { .. }
        ));
        assert_eq!(h.transport.total_calls(), 0);
        // The typo stays on screen for correction.
        assert_eq!(h.state.form().amount, "1.2.3");
    }

    #[tokio::test]
    async fn invalid_recipient_rejects_without_network() {
        let h = ready_harness().await;

        let err = h
            .controller
            .submit("not-a-principal", "1.0")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidRecipient(_)));
        assert!(matches!(
            h.controller.phase(),
            TransferPhase::Rejected { .. }
        ));
        assert_eq!(h.transport.total_calls(), 0);
        assert_eq!(h.state.form().recipient, "not-a-principal");
    }

    #[tokio::test]
    async fn transport_failure_fails_and_preserves_form() {
        let h = ready_harness().await;
        h.transport.push_error(
            LedgerMethod::Transfer,
            TransportError::Unreachable {
                reason: "connection refused".to_string(),
            },
        );

        let err = h.controller.submit("2vxsx-fae", "0.25").await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Ledger(LedgerError::Unavailable { .. })
        ));
        assert!(matches!(h.controller.phase(), TransferPhase::Failed { .. }));
        // Input preserved; one attempt; no refresh against a dead network.
        assert_eq!(h.state.form().recipient, "2vxsx-fae");
        assert_eq!(h.state.form().amount, "0.25");
        assert_eq!(h.transport.call_count(LedgerMethod::Transfer), 1);
        assert_eq!(h.transport.call_count(LedgerMethod::BalanceOf), 0);
    }

    #[tokio::test]
    async fn ledger_decline_fails_and_reconciles_balance() {
        let h = ready_harness().await;
        h.transport
            .push_reply(LedgerMethod::Transfer, json!({ "Err": "insufficient funds" }));
        h.transport
            .push_reply(LedgerMethod::BalanceOf, json!("10"));

        let err = h.controller.submit("2vxsx-fae", "5").await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Ledger(LedgerError::Rejected { .. })
        ));
        match h.controller.phase() {
            TransferPhase::Failed { reason } => assert!(reason.contains("insufficient funds")),
            other => panic!("expected Failed, got {:?}", other),
        }
        // The decline is authoritative, so the balance is reconciled.
        assert_eq!(h.transport.call_count(LedgerMethod::BalanceOf), 1);
        assert_eq!(h.state.balance().unwrap().amount, TokenAmount::new(10));
        // And the form is still there to adjust.
        assert_eq!(h.state.form().amount, "5");
    }

    #[tokio::test]
    async fn refresh_failure_does_not_revert_success() {
        let h = ready_harness().await;
        h.transport
            .push_reply(LedgerMethod::Transfer, json!({ "Ok": "7" }));
        h.transport.push_error(
            LedgerMethod::BalanceOf,
            TransportError::Timeout { seconds: 30 },
        );

        let block = h.controller.submit("2vxsx-fae", "1").await.unwrap();
        assert_eq!(block, BlockIndex(7));
        assert_eq!(
            h.controller.phase(),
            TransferPhase::Succeeded {
                block_index: BlockIndex(7)
            }
        );
        assert_eq!(h.state.balance(), None);
    }

    // -- 3. Single flight ----------------------------------------------------

    #[tokio::test]
    async fn second_submission_is_refused_while_in_flight() {
        let h = ready_harness().await;
        let gate = h
            .transport
            .push_gated_reply(LedgerMethod::Transfer, json!({ "Ok": "1" }));
        h.transport
            .push_reply(LedgerMethod::BalanceOf, json!("0"));

        let first = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.submit("2vxsx-fae", "1").await })
        };
        let transport = Arc::clone(&h.transport);
        until(move || transport.call_count(LedgerMethod::Transfer) == 1).await;
        assert_eq!(h.controller.phase(), TransferPhase::Submitting);

        let err = h.controller.submit("2vxsx-fae", "2").await.unwrap_err();
        assert_eq!(err, WorkflowError::TransferInProgress);
        // The refusal itself generated no traffic.
        assert_eq!(h.transport.call_count(LedgerMethod::Transfer), 1);

        gate.notify_one();
        let block = first.await.unwrap().unwrap();
        assert_eq!(block, BlockIndex(1));
    }

    #[tokio::test]
    async fn controller_recovers_after_a_failure() {
        let h = ready_harness().await;
        h.transport.push_error(
            LedgerMethod::Transfer,
            TransportError::Unreachable {
                reason: "reset".to_string(),
            },
        );
        let _ = h.controller.submit("2vxsx-fae", "1").await.unwrap_err();

        // The user corrects nothing and simply resubmits once the network
        // is back; the guard must not still be held.
        h.transport
            .push_reply(LedgerMethod::Transfer, json!({ "Ok": "2" }));
        h.transport
            .push_reply(LedgerMethod::BalanceOf, json!("3"));
        let block = h.controller.submit("2vxsx-fae", "1").await.unwrap();
        assert_eq!(block, BlockIndex(2));
    }

    // -- 4. Phase observation ------------------------------------------------

    #[tokio::test]
    async fn acknowledge_returns_terminal_phases_to_idle() {
        let h = ready_harness().await;
        h.transport
            .push_reply(LedgerMethod::Transfer, json!({ "Ok": "9" }));
        h.transport
            .push_reply(LedgerMethod::BalanceOf, json!("1"));

        // Acknowledging an idle machine changes nothing.
        h.controller.acknowledge();
        assert_eq!(h.controller.phase(), TransferPhase::Idle);

        h.controller.submit("2vxsx-fae", "1").await.unwrap();
        assert!(h.controller.phase().is_terminal());

        h.controller.acknowledge();
        assert_eq!(h.controller.phase(), TransferPhase::Idle);
    }

    #[tokio::test]
    async fn subscribers_observe_the_terminal_phase() {
        let h = ready_harness().await;
        let mut phases = h.controller.subscribe();
        h.transport
            .push_reply(LedgerMethod::Transfer, json!({ "Ok": "11" }));
        h.transport
            .push_reply(LedgerMethod::BalanceOf, json!("1"));

        h.controller.submit("2vxsx-fae", "1").await.unwrap();
        phases.changed().await.unwrap();
        assert_eq!(
            *phases.borrow(),
            TransferPhase::Succeeded {
                block_index: BlockIndex(11)
            }
        );
    }

    // -- 5. Overlapping refreshes --------------------------------------------

    #[tokio::test]
    async fn last_arriving_refresh_wins() {
        let h = ready_harness().await;
        // First request on the wire will carry 111, second 222.
        let gate_first = h
            .transport
            .push_gated_reply(LedgerMethod::BalanceOf, json!("111"));
        let gate_second = h
            .transport
            .push_gated_reply(LedgerMethod::BalanceOf, json!("222"));

        let first = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.refresh_balance().await })
        };
        let transport = Arc::clone(&h.transport);
        until(move || transport.call_count(LedgerMethod::BalanceOf) == 1).await;

        let second = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.refresh_balance().await })
        };
        let transport = Arc::clone(&h.transport);
        until(move || transport.call_count(LedgerMethod::BalanceOf) == 2).await;

        // Release them out of order: the second response arrives first,
        // then the first request's response lands last and wins.
        gate_second.notify_one();
        second.await.unwrap().unwrap();
        assert_eq!(h.state.balance().unwrap().amount, TokenAmount::new(222));

        gate_first.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(h.state.balance().unwrap().amount, TokenAmount::new(111));
        assert_eq!(h.state.refreshes_recorded(), 2);
    }
}
