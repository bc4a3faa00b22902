//! # Dashboard State
//!
//! The one owned home for everything a presentation layer renders:
//! metadata, the latest balance, and the transfer form. No globals — the
//! state object is created at startup, handed to whoever needs it, and
//! dies with the application.
//!
//! Balance updates are strictly "last recorded wins". Refreshes may
//! overlap, and nothing cancels the slower one; whichever response
//! arrives last overwrites, because arrival order is the only order the
//! client can actually observe.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::DEFAULT_DECIMALS;
use crate::token::{TokenAmount, TokenMetadata};

/// One recorded balance observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// Balance in base units.
    pub amount: TokenAmount,
    /// When the response was recorded.
    pub updated_at: DateTime<Utc>,
}

/// The transfer form as the user last left it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferForm {
    /// Recipient principal text, exactly as entered.
    pub recipient: String,
    /// Human decimal amount, exactly as entered.
    pub amount: String,
}

impl TransferForm {
    pub fn is_empty(&self) -> bool {
        self.recipient.is_empty() && self.amount.is_empty()
    }
}

#[derive(Default)]
struct StateInner {
    metadata: Option<TokenMetadata>,
    balance: Option<BalanceSnapshot>,
    refreshes_recorded: u64,
    form: TransferForm,
}

/// Shared, observable dashboard state.
///
/// Cheap to clone; clones share the same data. The internal lock is held
/// only for in-memory reads and writes, never across an await.
#[derive(Clone, Default)]
pub struct DashboardState {
    inner: Arc<RwLock<StateInner>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Metadata -----------------------------------------------------------

    /// Stores the metadata snapshot for the session.
    pub fn set_metadata(&self, metadata: TokenMetadata) {
        self.inner.write().metadata = Some(metadata);
    }

    /// The loaded metadata, if the initial fetch has completed.
    pub fn metadata(&self) -> Option<TokenMetadata> {
        self.inner.read().metadata.clone()
    }

    /// Decimals for display purposes. Falls back to the conventional
    /// [`DEFAULT_DECIMALS`] while metadata is still loading, so a balance
    /// that happens to arrive first still renders sensibly.
    pub fn decimals_or_default(&self) -> u8 {
        self.inner
            .read()
            .metadata
            .as_ref()
            .map(|m| m.decimals)
            .unwrap_or(DEFAULT_DECIMALS)
    }

    // -- Balance ------------------------------------------------------------

    /// Records a balance response at its arrival time, unconditionally
    /// overwriting whatever is there. Callers invoke this as each
    /// response arrives, which is precisely what makes the last-arriving
    /// response win.
    pub fn record_balance(&self, amount: TokenAmount) {
        let mut inner = self.inner.write();
        inner.balance = Some(BalanceSnapshot {
            amount,
            updated_at: Utc::now(),
        });
        inner.refreshes_recorded += 1;
    }

    /// The latest recorded balance, if any refresh has completed.
    pub fn balance(&self) -> Option<BalanceSnapshot> {
        self.inner.read().balance
    }

    /// The balance rendered with the current decimals, for presentation.
    pub fn display_balance(&self) -> Option<String> {
        let decimals = self.decimals_or_default();
        self.balance().map(|s| s.amount.display_decimal(decimals))
    }

    /// How many balance responses have ever been recorded. Observability
    /// for callers that care about refresh traffic.
    pub fn refreshes_recorded(&self) -> u64 {
        self.inner.read().refreshes_recorded
    }

    // -- Transfer form ------------------------------------------------------

    /// Remembers the user's input so a failed submission can be corrected
    /// rather than retyped.
    pub fn set_form(&self, recipient: &str, amount: &str) {
        let mut inner = self.inner.write();
        inner.form = TransferForm {
            recipient: recipient.to_string(),
            amount: amount.to_string(),
        };
    }

    /// The form as last set.
    pub fn form(&self) -> TransferForm {
        self.inner.read().form.clone()
    }

    /// Empties the form. Called only after a transfer actually succeeds.
    pub fn clear_form(&self) {
        self.inner.write().form = TransferForm::default();
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Drops everything tied to the signed-in identity. Metadata stays:
    /// it describes the token, not the user.
    pub fn forget_account(&self) {
        let mut inner = self.inner.write();
        inner.balance = None;
        inner.form = TransferForm::default();
    }
}
