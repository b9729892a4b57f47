//! Order workflow state machine.

use serde::{Deserialize, Serialize};

/// The stage an order placement has reached.
///
/// State transitions:
/// ```text
/// Validating ──► Pricing ──► Reserving ──► Persisting ──► Committed
///     │             │            │              │
///     └─────────────┴────────────┴──────────────┴──► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowState {
    /// Checking that every requested product exists.
    #[default]
    Validating,

    /// Computing and caching unit prices.
    Pricing,

    /// Decrementing stock per variant.
    Reserving,

    /// Writing the order and its items.
    Persisting,

    /// The transaction committed (terminal state).
    Committed,

    /// The transaction was rolled back (terminal state).
    Aborted,
}

impl WorkflowState {
    /// Returns the state that follows on success, or None from a terminal state.
    pub fn next(&self) -> Option<WorkflowState> {
        match self {
            WorkflowState::Validating => Some(WorkflowState::Pricing),
            WorkflowState::Pricing => Some(WorkflowState::Reserving),
            WorkflowState::Reserving => Some(WorkflowState::Persisting),
            WorkflowState::Persisting => Some(WorkflowState::Committed),
            WorkflowState::Committed | WorkflowState::Aborted => None,
        }
    }

    /// Returns true if moving to `to` is a legal transition.
    pub fn can_transition_to(&self, to: WorkflowState) -> bool {
        match to {
            WorkflowState::Aborted => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Committed | WorkflowState::Aborted)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Validating => "Validating",
            WorkflowState::Pricing => "Pricing",
            WorkflowState::Reserving => "Reserving",
            WorkflowState::Persisting => "Persisting",
            WorkflowState::Committed => "Committed",
            WorkflowState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
