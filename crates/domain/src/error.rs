//! Domain error types.

use common::OrderId;
use thiserror::Error;

use crate::order::{ErrorCode, OrderError};
use crate::repository::RepositoryError;

/// Errors that can occur when running operations through the
/// [`OrderService`](crate::order::OrderService).
#[derive(Debug, Error)]
pub enum DomainError {
    /// The order rejected the operation.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An error occurred in the repository.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// No order is stored under this id.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
}

impl DomainError {
    /// Returns the order failure, if the order is what rejected the call.
    pub fn as_order_error(&self) -> Option<&OrderError> {
        match self {
            DomainError::Order(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the failure code for errors raised by the order itself.
    pub fn code(&self) -> Option<ErrorCode> {
        self.as_order_error().map(OrderError::code)
    }

    /// Returns true if the order was stored in a new state despite the
    /// failure.
    pub fn commits_state(&self) -> bool {
        self.as_order_error().is_some_and(OrderError::commits_state)
    }
}
