//! State machine trait for status enums.
//!
//! Lifecycle statuses declare their legal edges once and get validated
//! transitions and terminal-state checks from the trait.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for OrderStatus {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Pending => vec![Paid, Canceled],
///             Paid | Canceled => vec![],
///         }
///     }
/// }
///
/// let next = order.status.transition_to(OrderStatus::Paid)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Open,
        Closed,
        Welded,
    }

    impl StateMachine for Door {
        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Door::Open => vec![Door::Closed],
                Door::Closed => vec![Door::Open, Door::Welded],
                Door::Welded => vec![],
            }
        }
    }

    #[test]
    fn transition_to_follows_declared_edges() {
        assert_eq!(Door::Open.transition_to(Door::Closed), Ok(Door::Closed));
        assert!(Door::Open.transition_to(Door::Welded).is_err());
    }

    #[test]
    fn self_transition_is_rejected_unless_declared() {
        assert!(!Door::Closed.can_transition_to(&Door::Closed));
    }

    #[test]
    fn terminal_state_has_no_edges() {
        assert!(Door::Welded.is_terminal());
        assert!(!Door::Closed.is_terminal());
        assert!(Door::Welded.transition_to(Door::Open).is_err());
    }
}
