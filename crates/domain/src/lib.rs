//! Domain layer for the repair order system.
//!
//! This crate provides:
//! - Monetary rounding used wherever amounts are stored or compared
//! - The `Order` aggregate with its services, parts and audit events
//! - A repository abstraction with an in-memory implementation
//! - `OrderService`, which runs operations against stored orders

pub mod error;
pub mod money;
pub mod order;
pub mod repository;

pub use error::DomainError;
pub use money::{
    MAX_AMOUNT, MONEY_SCALE, REAUTH_TOLERANCE, checked_round_half_even, checked_sum,
    reauthorization_limit, round_half_even,
};
pub use order::{
    AuthorizationVersion, CommandResult, Component, CreateOrder, ErrorCode, Event, EventMetadata,
    EventType, MetadataValue, NewComponent, NewService, Order, OrderCommand, OrderError,
    OrderService, OrderState, Service,
};
pub use repository::{
    InMemoryOrderRepository, OrderRepository, RepositoryError, Revision, StoredOrder,
};
