//! Order service providing an application-level API over stored orders.

use std::collections::HashMap;

use common::{
    ComponentId, OrderId, RandomIds, ServiceId, SharedClock, SharedIds, SystemClock,
};
use rust_decimal::Decimal;

use crate::error::DomainError;
use crate::repository::{OrderRepository, Revision, StoredOrder};

use super::{Event, NewService, Order, OrderCommand, OrderError};

/// Command to open a new repair order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// Generated when absent.
    pub order_id: Option<OrderId>,

    /// Customer name.
    pub client: String,

    /// Vehicle identifier.
    pub vehicle: String,
}

impl CreateOrder {
    /// Creates a new CreateOrder command with a generated order ID.
    pub fn new(client: impl Into<String>, vehicle: impl Into<String>) -> Self {
        Self {
            order_id: None,
            client: client.into(),
            vehicle: vehicle.into(),
        }
    }

    /// Uses `order_id` instead of generating one.
    pub fn with_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The order after the command.
    pub order: Order,

    /// The events this command appended.
    pub events: Vec<Event>,

    /// The stored revision after the command.
    pub revision: Revision,
}

/// Service for managing repair orders.
///
/// Loads the order, runs one operation on it and stores it back with an
/// optimistic revision check. A failed operation is not stored, except for
/// a completion attempt that moved the order to `WAITING_FOR_APPROVAL`.
pub struct OrderService<R: OrderRepository> {
    repository: R,
    clock: SharedClock,
    ids: SharedIds,
}

impl<R: OrderRepository> OrderService<R> {
    /// Creates a new order service using the system clock and random ids.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            clock: SystemClock::shared(),
            ids: RandomIds::shared(),
        }
    }

    /// Replaces the clock handed to new orders.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the id generator used for orders, services and parts.
    pub fn with_ids(mut self, ids: SharedIds) -> Self {
        self.ids = ids;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Opens a new order in `CREATED` state.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<CommandResult, DomainError> {
        let order_id = cmd.order_id.unwrap_or_else(|| self.ids.order_id());
        let order = Order::new(order_id, cmd.client, cmd.vehicle, self.clock.now())
            .with_clock(self.clock.clone());

        let revision = self.repository.insert(order.clone()).await?;
        metrics::counter!("repair_orders_created_total").increment(1);
        tracing::info!(%order_id, "repair order created");

        Ok(CommandResult {
            order,
            events: Vec::new(),
            revision,
        })
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self
            .repository
            .load(order_id)
            .await?
            .map(|stored| stored.order))
    }

    /// Returns every stored order, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.repository.list().await?)
    }

    /// Adds a service, generating missing ids.
    #[tracing::instrument(skip(self))]
    pub async fn add_service(
        &self,
        order_id: OrderId,
        new_service: NewService,
    ) -> Result<CommandResult, DomainError> {
        let service = new_service.build(self.ids.as_ref());
        self.apply(order_id, "add_service", move |order| {
            order.add_service(service)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_diagnosed(&self, order_id: OrderId) -> Result<CommandResult, DomainError> {
        self.apply(order_id, "mark_diagnosed", Order::mark_diagnosed)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn authorize(
        &self,
        order_id: OrderId,
        amount: Decimal,
    ) -> Result<CommandResult, DomainError> {
        self.apply(order_id, "authorize", move |order| order.authorize(amount))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_in_progress(
        &self,
        order_id: OrderId,
    ) -> Result<CommandResult, DomainError> {
        self.apply(order_id, "mark_in_progress", Order::mark_in_progress)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn record_real_cost(
        &self,
        order_id: OrderId,
        service_id: ServiceId,
        real_cost: Decimal,
        component_real_costs: Option<HashMap<ComponentId, Decimal>>,
    ) -> Result<CommandResult, DomainError> {
        self.apply(order_id, "record_real_cost", move |order| {
            order.record_real_cost(service_id, real_cost, component_real_costs.as_ref())
        })
        .await
    }

    /// Attempts completion.
    ///
    /// On `REQUIRES_REAUTH` the order is stored in `WAITING_FOR_APPROVAL`
    /// before the error is returned.
    #[tracing::instrument(skip(self))]
    pub async fn attempt_complete(
        &self,
        order_id: OrderId,
    ) -> Result<CommandResult, DomainError> {
        self.apply(order_id, "attempt_complete", Order::attempt_complete)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn reauthorize(
        &self,
        order_id: OrderId,
        amount: Decimal,
    ) -> Result<CommandResult, DomainError> {
        self.apply(order_id, "reauthorize", move |order| {
            order.reauthorize(amount)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn deliver(&self, order_id: OrderId) -> Result<CommandResult, DomainError> {
        self.apply(order_id, "deliver", Order::deliver).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        order_id: OrderId,
        reason: String,
    ) -> Result<CommandResult, DomainError> {
        self.apply(order_id, "cancel", move |order| order.cancel(reason))
            .await
    }

    /// Runs a serialized command against an order.
    pub async fn execute(
        &self,
        order_id: OrderId,
        command: OrderCommand,
    ) -> Result<CommandResult, DomainError> {
        match command {
            OrderCommand::AddService(new_service) => {
                self.add_service(order_id, new_service).await
            }
            OrderCommand::MarkDiagnosed => self.mark_diagnosed(order_id).await,
            OrderCommand::Authorize { amount } => self.authorize(order_id, amount).await,
            OrderCommand::MarkInProgress => self.mark_in_progress(order_id).await,
            OrderCommand::RecordRealCost {
                service_id,
                real_cost,
                component_real_costs,
            } => {
                self.record_real_cost(order_id, service_id, real_cost, component_real_costs)
                    .await
            }
            OrderCommand::AttemptComplete => self.attempt_complete(order_id).await,
            OrderCommand::Reauthorize { amount } => self.reauthorize(order_id, amount).await,
            OrderCommand::Deliver => self.deliver(order_id).await,
            OrderCommand::Cancel { reason } => self.cancel(order_id, reason).await,
        }
    }

    async fn apply<F>(
        &self,
        order_id: OrderId,
        command: &'static str,
        operation: F,
    ) -> Result<CommandResult, DomainError>
    where
        F: FnOnce(&mut Order) -> Result<(), OrderError> + Send,
    {
        let StoredOrder {
            mut order,
            revision,
        } = self
            .repository
            .load(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;
        let events_before = order.events().len();

        match operation(&mut order) {
            Ok(()) => {
                let revision = self.repository.save(order.clone(), revision).await?;
                metrics::counter!("repair_order_commands_total", "command" => command, "outcome" => "ok")
                    .increment(1);
                tracing::info!(%order_id, command, state = %order.state(), "order command applied");

                let events = order.events()[events_before..].to_vec();
                Ok(CommandResult {
                    order,
                    events,
                    revision,
                })
            }
            Err(err) if err.commits_state() => {
                self.repository.save(order.clone(), revision).await?;
                metrics::counter!("repair_order_commands_total", "command" => command, "outcome" => "committed_error")
                    .increment(1);
                metrics::counter!("repair_order_reauth_required_total").increment(1);
                tracing::warn!(%order_id, command, state = %order.state(), error = %err, "reauthorization required");
                Err(err.into())
            }
            Err(err) => {
                metrics::counter!("repair_order_commands_total", "command" => command, "outcome" => "rejected")
                    .increment(1);
                tracing::info!(%order_id, command, code = %err.code(), error = %err, "order command rejected");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use common::{ManualClock, SequentialIds};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::order::{ErrorCode, OrderState};
    use crate::repository::InMemoryOrderRepository;

    fn create_service() -> OrderService<InMemoryOrderRepository> {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap();
        OrderService::new(InMemoryOrderRepository::new())
            .with_clock(Arc::new(ManualClock::new(start)))
            .with_ids(SequentialIds::shared())
    }

    #[tokio::test]
    async fn test_create_order_uses_generated_id() {
        let service = create_service();
        let result = service
            .create_order(CreateOrder::new("Ana", "ABC-123"))
            .await
            .unwrap();

        assert_eq!(result.order.id().as_uuid(), Uuid::from_u128(1));
        assert_eq!(result.revision, Revision::first());
        assert_eq!(result.order.state(), OrderState::Created);
    }

    #[tokio::test]
    async fn test_command_result_carries_only_new_events() {
        let service = create_service();
        let order_id = service
            .create_order(CreateOrder::new("Ana", "ABC-123"))
            .await
            .unwrap()
            .order
            .id();

        service
            .add_service(order_id, NewService::new("Brakes", dec!(300)))
            .await
            .unwrap();
        service.mark_diagnosed(order_id).await.unwrap();
        let result = service.authorize(order_id, dec!(350)).await.unwrap();

        assert_eq!(result.events.len(), 1);
        assert_eq!(result.order.events().len(), 2);
        assert_eq!(result.revision, Revision::new(4));
    }

    #[tokio::test]
    async fn test_rejected_command_is_not_stored() {
        let service = create_service();
        let order_id = service
            .create_order(CreateOrder::new("Ana", "ABC-123"))
            .await
            .unwrap()
            .order
            .id();

        let err = service.deliver(order_id).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SequenceError));
        assert!(!err.commits_state());

        let stored = service.repository().load(order_id).await.unwrap().unwrap();
        assert_eq!(stored.revision, Revision::first());
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let service = create_service();
        let err = service.mark_diagnosed(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::OrderNotFound(_)));
    }
}
