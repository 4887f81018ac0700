//! Repair order aggregate and related types.

mod aggregate;
mod commands;
mod component;
pub mod events;
mod repair_service;
mod service;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use commands::{NewComponent, NewService, OrderCommand};
pub use component::Component;
pub use events::{Event, EventMetadata, EventType, MetadataValue};
pub use repair_service::Service;
pub use service::{CommandResult, CreateOrder, OrderService};
pub use state::OrderState;
pub use value_objects::AuthorizationVersion;

use common::ServiceId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable failure code, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    OrderCancelled,
    NotAllowedAfterAuthorization,
    SequenceError,
    NoServices,
    OrderNotFound,
    RequiresReauth,
    InvalidAmount,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OrderCancelled => "ORDER_CANCELLED",
            ErrorCode::NotAllowedAfterAuthorization => "NOT_ALLOWED_AFTER_AUTHORIZATION",
            ErrorCode::SequenceError => "SEQUENCE_ERROR",
            ErrorCode::NoServices => "NO_SERVICES",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::RequiresReauth => "REQUIRES_REAUTH",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during repair order operations.
///
/// Every variant except [`OrderError::RequiresReauthorization`] leaves the
/// order exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The order was cancelled and accepts no further operations.
    #[error("Order is cancelled")]
    Cancelled,

    /// Services can only be added before the first authorization.
    #[error("Cannot add services in {current_state} state")]
    NotAllowedAfterAuthorization { current_state: OrderState },

    /// Order is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: OrderState,
        action: &'static str,
    },

    /// An operation needs an authorized amount and there is none.
    #[error("Cannot {action} without an authorized amount")]
    NotAuthorized { action: &'static str },

    /// Authorization needs at least one service.
    #[error("Order has no services")]
    NoServices,

    /// The referenced service is not part of the order.
    #[error("Service not found: {service_id}")]
    ServiceNotFound { service_id: ServiceId },

    /// Real costs exceed the tolerated limit.
    ///
    /// The order has already moved to `WAITING_FOR_APPROVAL` when this is
    /// returned.
    #[error(
        "Total real cost {total_real} exceeds limit {limit} for authorized amount {authorized}; reauthorization required"
    )]
    RequiresReauthorization {
        total_real: Decimal,
        limit: Decimal,
        authorized: Decimal,
    },

    /// A new authorization does not cover the real cost.
    #[error("Invalid amount: {amount} is less than total real cost {total_real}")]
    InvalidAmount { amount: Decimal, total_real: Decimal },

    /// An amount or a total is too large to keep in cents.
    #[error("Amount out of range: cannot {action} with amounts this large")]
    AmountOutOfRange { action: &'static str },
}

impl OrderError {
    /// Returns the failure code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::Cancelled => ErrorCode::OrderCancelled,
            OrderError::NotAllowedAfterAuthorization { .. } => {
                ErrorCode::NotAllowedAfterAuthorization
            }
            OrderError::InvalidStateTransition { .. } | OrderError::NotAuthorized { .. } => {
                ErrorCode::SequenceError
            }
            OrderError::NoServices => ErrorCode::NoServices,
            OrderError::ServiceNotFound { .. } => ErrorCode::OrderNotFound,
            OrderError::RequiresReauthorization { .. } => ErrorCode::RequiresReauth,
            OrderError::InvalidAmount { .. } | OrderError::AmountOutOfRange { .. } => {
                ErrorCode::InvalidAmount
            }
        }
    }

    /// Returns true if the order changed state even though the operation
    /// failed.
    pub fn commits_state(&self) -> bool {
        matches!(self, OrderError::RequiresReauthorization { .. })
    }
}
