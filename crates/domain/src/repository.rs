//! Order storage.
//!
//! The aggregate does no locking of its own. A repository hands out
//! copies tagged with a [`Revision`] and refuses a save whose expected
//! revision is stale, which is enough to serialize writers per order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::order::Order;

/// Number of times a stored order has been written.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Revision of a freshly inserted order.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order together with the revision it was loaded at.
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub order: Order,
    pub revision: Revision,
}

/// Errors that can occur when storing orders.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// An order with this id is already stored.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The order was not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Someone else saved the order since it was loaded.
    #[error("Concurrency conflict for order {order_id}: expected revision {expected}, found {actual}")]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: Revision,
        actual: Revision,
    },
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Storage for repair orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order at [`Revision::first`].
    async fn insert(&self, order: Order) -> Result<Revision>;

    /// Loads an order, or `None` if it doesn't exist.
    async fn load(&self, order_id: OrderId) -> Result<Option<StoredOrder>>;

    /// Replaces a stored order if it is still at `expected`.
    ///
    /// Returns the new revision.
    async fn save(&self, order: Order, expected: Revision) -> Result<Revision>;

    /// Returns every stored order.
    async fn list(&self) -> Result<Vec<Order>>;
}

/// In-memory repository for tests and local tooling.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, StoredOrder>>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: Order) -> Result<Revision> {
        let mut orders = self.orders.write().await;
        let order_id = order.id();
        if orders.contains_key(&order_id) {
            return Err(RepositoryError::AlreadyExists(order_id));
        }

        let revision = Revision::first();
        orders.insert(order_id, StoredOrder { order, revision });
        tracing::debug!(%order_id, %revision, "order inserted");
        Ok(revision)
    }

    async fn load(&self, order_id: OrderId) -> Result<Option<StoredOrder>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn save(&self, order: Order, expected: Revision) -> Result<Revision> {
        let mut orders = self.orders.write().await;
        let order_id = order.id();
        let stored = orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound(order_id))?;

        if stored.revision != expected {
            return Err(RepositoryError::ConcurrencyConflict {
                order_id,
                expected,
                actual: stored.revision,
            });
        }

        let revision = expected.next();
        *stored = StoredOrder { order, revision };
        tracing::debug!(%order_id, %revision, "order saved");
        Ok(revision)
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<_> = orders.values().map(|s| s.order.clone()).collect();
        all.sort_by_key(|o| o.created_at());
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn order() -> Order {
        Order::new(OrderId::new(), "Luis", "XYZ-987", Utc::now())
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        let order_id = order.id();

        let revision = repo.insert(order).await.unwrap();
        assert_eq!(revision, Revision::first());

        let stored = repo.load(order_id).await.unwrap().unwrap();
        assert_eq!(stored.order.id(), order_id);
        assert_eq!(stored.revision, Revision::first());
        assert_eq!(repo.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_insert_twice_fails() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        repo.insert(order.clone()).await.unwrap();

        let result = repo.insert(order).await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let repo = InMemoryOrderRepository::new();
        assert!(repo.load(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_bumps_revision() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        let revision = repo.insert(order.clone()).await.unwrap();

        let revision = repo.save(order.clone(), revision).await.unwrap();
        assert_eq!(revision, Revision::new(2));
        let revision = repo.save(order, revision).await.unwrap();
        assert_eq!(revision, Revision::new(3));
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        let order_id = order.id();
        let loaded_at = repo.insert(order.clone()).await.unwrap();

        // first writer wins
        let mut first = order.clone();
        first.mark_diagnosed().unwrap();
        repo.save(first, loaded_at).await.unwrap();

        let mut second = order;
        second.cancel("late writer").unwrap();
        let result = repo.save(second, loaded_at).await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConcurrencyConflict { expected, actual, .. })
                if expected == Revision::first() && actual == Revision::new(2)
        ));

        let stored = repo.load(order_id).await.unwrap().unwrap();
        assert_eq!(stored.order.events().len(), 1);
    }

    #[tokio::test]
    async fn test_save_unknown_order_fails() {
        let repo = InMemoryOrderRepository::new();
        let result = repo.save(order(), Revision::first()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}
