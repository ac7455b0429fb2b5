//! # Transaction State
//!
//! Lifecycle state machine for a single probed transaction.
//!
//! # State Machine
//!
//! ```text
//! Built → Simulated → AccessListRequested ─┐
//!                   → AccessListSkipped ───┴→ Submitted → Pending → Confirmed
//!                                                                 → Failed
//!                                                                 → TimedOut
//! ```
//!
//! No state re-enters `Submitted`; resubmission is left to the caller.
//!
//! # Examples
//!
//! ```
//! use rpc_probe::domain::value_objects::tx_state::TxState;
//!
//! assert!(TxState::Simulated.can_transition_to(TxState::AccessListSkipped));
//! assert!(!TxState::Pending.can_transition_to(TxState::Submitted));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a probed transaction.
///
/// # Terminal States
///
/// - [`Confirmed`](TxState::Confirmed) — mined with a success status
/// - [`Failed`](TxState::Failed) — mined with a failure status
/// - [`TimedOut`](TxState::TimedOut) — no receipt before the deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TxState {
    /// Call data encoded, nothing sent yet.
    #[default]
    Built = 0,
    /// Dry run succeeded.
    Simulated = 1,
    /// An access list was obtained and will be attached.
    AccessListRequested = 2,
    /// Proceeding without an access list.
    AccessListSkipped = 3,
    /// Signed transaction handed to the node.
    Submitted = 4,
    /// Node accepted the transaction, awaiting a receipt.
    Pending = 5,
    /// Mined successfully (terminal).
    Confirmed = 6,
    /// Mined but reverted (terminal).
    Failed = 7,
    /// Receipt polling expired (terminal).
    TimedOut = 8,
}

impl TxState {
    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::TimedOut)
    }

    /// Returns true if this state can transition to the target state.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Built, Self::Simulated)
                | (Self::Simulated, Self::AccessListRequested)
                | (Self::Simulated, Self::AccessListSkipped)
                | (Self::AccessListRequested, Self::Submitted)
                | (Self::AccessListSkipped, Self::Submitted)
                | (Self::Submitted, Self::Pending)
                | (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Failed)
                | (Self::Pending, Self::TimedOut)
        )
    }

    /// Returns the valid next states from this state.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Built => vec![Self::Simulated],
            Self::Simulated => vec![Self::AccessListRequested, Self::AccessListSkipped],
            Self::AccessListRequested | Self::AccessListSkipped => vec![Self::Submitted],
            Self::Submitted => vec![Self::Pending],
            Self::Pending => vec![Self::Confirmed, Self::Failed, Self::TimedOut],
            Self::Confirmed | Self::Failed | Self::TimedOut => vec![],
        }
    }

    /// Returns true once the transaction has been handed to the node.
    #[inline]
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::Pending | Self::Confirmed | Self::Failed | Self::TimedOut
        )
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Built => "BUILT",
            Self::Simulated => "SIMULATED",
            Self::AccessListRequested => "ACCESS_LIST_REQUESTED",
            Self::AccessListSkipped => "ACCESS_LIST_SKIPPED",
            Self::Submitted => "SUBMITTED",
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        };
        write!(f, "{s}")
    }
}

/// Error returned by [`TxLifecycle::advance`] on an illegal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid transaction state transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// Current state.
    pub from: TxState,
    /// Rejected target state.
    pub to: TxState,
}

/// A transaction's current state plus the path that led there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLifecycle {
    history: Vec<TxState>,
}

impl TxLifecycle {
    /// Starts a lifecycle in [`TxState::Built`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![TxState::Built],
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TxState {
        self.history.last().copied().unwrap_or_default()
    }

    /// Returns every state visited, in order.
    #[must_use]
    pub fn history(&self) -> &[TxState] {
        &self.history
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] if the state machine forbids the move.
    pub fn advance(&mut self, next: TxState) -> Result<(), InvalidTransition> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(InvalidTransition {
                from: current,
                to: next,
            });
        }
        tracing::debug!(from = %current, to = %next, "transaction state transition");
        self.history.push(next);
        Ok(())
    }
}

impl Default for TxLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
