//! Repair order state machine.

use serde::{Deserialize, Serialize};

/// The state of a repair order in its lifecycle.
///
/// State transitions:
/// ```text
/// Created ──► Diagnosed ──► Authorized ──► InProgress ──┬──► Completed ──► Delivered
///                               ▲                       │
///                               └── WaitingForApproval ◄┘
///
/// any state except Cancelled ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Intake done, services can be added.
    #[default]
    Created,

    /// The vehicle has been inspected, services can still be added.
    Diagnosed,

    /// The customer approved a spending ceiling.
    Authorized,

    /// Work on the vehicle has started.
    InProgress,

    /// Real costs went over the tolerance, awaiting a new authorization.
    WaitingForApproval,

    /// Work finished within the authorized amount.
    Completed,

    /// Vehicle handed back to the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state, absorbs everything).
    Cancelled,
}

impl OrderState {
    /// Returns true if services can be added in this state.
    pub fn can_add_services(&self) -> bool {
        matches!(self, OrderState::Created | OrderState::Diagnosed)
    }

    /// Returns true if the order can be marked diagnosed in this state.
    pub fn can_diagnose(&self) -> bool {
        matches!(self, OrderState::Created)
    }

    /// Returns true if the first authorization can be given in this state.
    pub fn can_authorize(&self) -> bool {
        matches!(self, OrderState::Diagnosed)
    }

    /// Returns true if work can start in this state.
    pub fn can_start_work(&self) -> bool {
        matches!(self, OrderState::Authorized)
    }

    /// Returns true if completion can be attempted in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderState::InProgress)
    }

    /// Returns true if a new authorization can be given in this state.
    pub fn can_reauthorize(&self) -> bool {
        matches!(self, OrderState::WaitingForApproval)
    }

    /// Returns true if the vehicle can be delivered in this state.
    pub fn can_deliver(&self) -> bool {
        matches!(self, OrderState::Completed)
    }

    /// Returns true if the order can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        !matches!(self, OrderState::Cancelled)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Cancelled)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Created => "CREATED",
            OrderState::Diagnosed => "DIAGNOSED",
            OrderState::Authorized => "AUTHORIZED",
            OrderState::InProgress => "IN_PROGRESS",
            OrderState::WaitingForApproval => "WAITING_FOR_APPROVAL",
            OrderState::Completed => "COMPLETED",
            OrderState::Delivered => "DELIVERED",
            OrderState::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderState; 8] = [
        OrderState::Created,
        OrderState::Diagnosed,
        OrderState::Authorized,
        OrderState::InProgress,
        OrderState::WaitingForApproval,
        OrderState::Completed,
        OrderState::Delivered,
        OrderState::Cancelled,
    ];

    fn allowed(check: impl Fn(&OrderState) -> bool) -> Vec<OrderState> {
        ALL.iter().copied().filter(|s| check(s)).collect()
    }

    #[test]
    fn test_default_state_is_created() {
        assert_eq!(OrderState::default(), OrderState::Created);
    }

    #[test]
    fn test_services_only_before_authorization() {
        assert_eq!(
            allowed(OrderState::can_add_services),
            vec![OrderState::Created, OrderState::Diagnosed]
        );
    }

    #[test]
    fn test_single_source_transitions() {
        assert_eq!(allowed(OrderState::can_diagnose), vec![OrderState::Created]);
        assert_eq!(allowed(OrderState::can_authorize), vec![OrderState::Diagnosed]);
        assert_eq!(allowed(OrderState::can_start_work), vec![OrderState::Authorized]);
        assert_eq!(allowed(OrderState::can_complete), vec![OrderState::InProgress]);
        assert_eq!(
            allowed(OrderState::can_reauthorize),
            vec![OrderState::WaitingForApproval]
        );
        assert_eq!(allowed(OrderState::can_deliver), vec![OrderState::Completed]);
    }

    #[test]
    fn test_can_cancel_from_everything_but_cancelled() {
        let cancellable = allowed(OrderState::can_cancel);
        assert_eq!(cancellable.len(), 7);
        assert!(!cancellable.contains(&OrderState::Cancelled));
    }

    #[test]
    fn test_terminal_states() {
        assert_eq!(
            allowed(OrderState::is_terminal),
            vec![OrderState::Delivered, OrderState::Cancelled]
        );
    }

    #[test]
    fn test_display_matches_serialized_tag() {
        for state in ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
            let back: OrderState = serde_json::from_str(&json).unwrap();
            assert_eq!(back, state);
        }
    }
}
