//! Identifier generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::types::{ComponentId, OrderId, ServiceId};

/// Source of fresh unique identifiers.
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    /// Returns a UUID never returned before by this generator.
    fn next_uuid(&self) -> Uuid;

    fn order_id(&self) -> OrderId {
        OrderId::from_uuid(self.next_uuid())
    }

    fn service_id(&self) -> ServiceId {
        ServiceId::from_uuid(self.next_uuid())
    }

    fn component_id(&self) -> ComponentId {
        ComponentId::from_uuid(self.next_uuid())
    }
}

/// Generator handle shared by services.
pub type SharedIds = Arc<dyn IdGenerator>;

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl RandomIds {
    pub fn shared() -> SharedIds {
        Arc::new(RandomIds)
    }
}

impl IdGenerator for RandomIds {
    fn next_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic ids `00000000-0000-0000-0000-000000000001`, `...02`, ...
///
/// Used by tests and by command scripts that need to refer to ids they
/// did not assign themselves.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedIds {
        Arc::new(Self::new())
    }
}

impl IdGenerator for SequentialIds {
    fn next_uuid(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(n))
    }
}
