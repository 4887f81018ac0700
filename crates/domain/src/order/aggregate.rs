//! Repair order aggregate implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{ComponentId, OrderId, ServiceId, SharedClock, SystemClock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{checked_round_half_even, reauthorization_limit};

use super::events::{self, Event, EventMetadata, EventType, metadata};
use super::{AuthorizationVersion, OrderError, OrderState, Service};

fn system_clock() -> SharedClock {
    SystemClock::shared()
}

/// Repair order aggregate root.
///
/// Tracks one vehicle repair from intake to delivery. All changes go
/// through the operations below; each one checks the current state, applies
/// the change and appends an [`Event`] for the transition it made.
///
/// The aggregate is not synchronized. Callers that share an order across
/// tasks serialize access themselves (see
/// [`OrderRepository`](crate::repository::OrderRepository)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// Name of the customer.
    client: String,

    /// Plate, VIN or whatever the shop uses to identify the vehicle.
    vehicle: String,

    created_at: DateTime<Utc>,

    #[serde(default)]
    cancelled_at: Option<DateTime<Utc>>,

    /// Current state of the order.
    state: OrderState,

    /// Services in insertion order.
    #[serde(default)]
    services: Vec<Service>,

    /// Append-only audit trail.
    #[serde(default)]
    events: Vec<Event>,

    /// Customer-approved ceiling, always rounded to cents.
    #[serde(default)]
    authorized_amount: Option<Decimal>,

    #[serde(default)]
    authorization_version: AuthorizationVersion,

    /// Sum of service real costs as of the last recomputation.
    #[serde(default)]
    total_real_cost: Decimal,

    #[serde(skip, default = "system_clock")]
    clock: SharedClock,
}

impl Order {
    /// Creates an order in `CREATED` state.
    pub fn new(
        id: OrderId,
        client: impl Into<String>,
        vehicle: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            client: client.into(),
            vehicle: vehicle.into(),
            created_at,
            cancelled_at: None,
            state: OrderState::Created,
            services: Vec::new(),
            events: Vec::new(),
            authorized_amount: None,
            authorization_version: AuthorizationVersion::initial(),
            total_real_cost: Decimal::ZERO,
            clock: system_clock(),
        }
    }

    /// Replaces the clock used to stamp events and cancellation.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn vehicle(&self) -> &str {
        &self.vehicle
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the order was cancelled, if it was.
    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Returns the current state.
    pub fn state(&self) -> OrderState {
        self.state
    }

    /// Returns all services in the order they were added.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Returns a service by ID.
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| s.id() == id)
    }

    /// Returns the audit trail, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn authorized_amount(&self) -> Option<Decimal> {
        self.authorized_amount
    }

    pub fn authorization_version(&self) -> AuthorizationVersion {
        self.authorization_version
    }

    /// Returns the total real cost as of the last recomputation.
    pub fn total_real_cost(&self) -> Decimal {
        self.total_real_cost
    }

    /// Returns the sum of every service's estimated subtotal, or `None` on
    /// overflow.
    pub fn estimated_total(&self) -> Option<Decimal> {
        self.services
            .iter()
            .try_fold(Decimal::ZERO, |total, s| total.checked_add(s.estimated_subtotal()?))
    }

    /// Returns the real cost the current authorization tolerates.
    pub fn reauthorization_limit(&self) -> Option<Decimal> {
        self.authorized_amount.and_then(reauthorization_limit)
    }

    /// Returns true if the order has services.
    pub fn has_services(&self) -> bool {
        !self.services.is_empty()
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

// Command methods
impl Order {
    /// Adds a service. Only allowed before authorization.
    pub fn add_service(&mut self, service: Service) -> Result<(), OrderError> {
        self.ensure_not_cancelled()?;
        if !self.state.can_add_services() {
            return Err(OrderError::NotAllowedAfterAuthorization {
                current_state: self.state,
            });
        }

        self.services.push(service);
        Ok(())
    }

    /// Records that the vehicle has been diagnosed.
    pub fn mark_diagnosed(&mut self) -> Result<(), OrderError> {
        self.ensure_not_cancelled()?;
        self.ensure_transition(self.state.can_diagnose(), "mark diagnosed")?;

        self.transition(OrderState::Diagnosed, EventType::Diagnosed, metadata!());
        Ok(())
    }

    /// Records the customer's first approval of `amount`.
    ///
    /// The amount is stored rounded to cents, ties to even.
    pub fn authorize(&mut self, amount: Decimal) -> Result<(), OrderError> {
        self.ensure_not_cancelled()?;
        self.ensure_transition(self.state.can_authorize(), "authorize")?;
        if !self.has_services() {
            return Err(OrderError::NoServices);
        }

        let amount = authorizable_amount(amount, "authorize")?;
        self.authorized_amount = Some(amount);
        self.authorization_version = AuthorizationVersion::first();
        let version = self.authorization_version.as_u32();

        self.transition(
            OrderState::Authorized,
            EventType::Authorized,
            metadata! { events::AMOUNT => amount, events::VERSION => version },
        );
        Ok(())
    }

    /// Records that work has started.
    pub fn mark_in_progress(&mut self) -> Result<(), OrderError> {
        self.ensure_not_cancelled()?;
        self.ensure_transition(self.state.can_start_work(), "start work")?;

        self.transition(OrderState::InProgress, EventType::InProgress, metadata!());
        Ok(())
    }

    /// Records the real cost of a service.
    ///
    /// With a non-empty `component_real_costs`, the named parts of the
    /// service get their real cost too (ids the service doesn't own are
    /// ignored). Without one, every part's real cost is cleared.
    pub fn record_real_cost(
        &mut self,
        service_id: ServiceId,
        real_cost: Decimal,
        component_real_costs: Option<&HashMap<ComponentId, Decimal>>,
    ) -> Result<(), OrderError> {
        self.ensure_not_cancelled()?;
        let index = self
            .services
            .iter()
            .position(|s| s.id() == service_id)
            .ok_or(OrderError::ServiceNotFound { service_id })?;

        let mut updated = self.services[index].clone();
        updated.set_real_cost(real_cost);
        match component_real_costs {
            Some(costs) if !costs.is_empty() => updated.apply_component_costs(costs),
            // TODO: confirm with the shop whether an omitted map should really wipe part costs
            _ => updated.clear_component_costs(),
        }

        // Nothing is written until the new total is known to fit.
        let others = self
            .services
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, s)| s);
        let total = sum_real_costs(others.chain(std::iter::once(&updated)))
            .ok_or(OrderError::AmountOutOfRange { action: "record real cost" })?;

        self.services[index] = updated;
        self.total_real_cost = total;
        Ok(())
    }

    /// Tries to close the work.
    ///
    /// Succeeds with `COMPLETED` when the total real cost stays within the
    /// tolerance of the authorized amount. Otherwise the order moves to
    /// `WAITING_FOR_APPROVAL`, the event is kept, and
    /// [`OrderError::RequiresReauthorization`] is returned.
    pub fn attempt_complete(&mut self) -> Result<(), OrderError> {
        self.ensure_not_cancelled()?;
        self.ensure_transition(self.state.can_complete(), "complete")?;
        let authorized = self
            .authorized_amount
            .ok_or(OrderError::NotAuthorized { action: "complete" })?;

        let total_real = sum_real_costs(&self.services)
            .ok_or(OrderError::AmountOutOfRange { action: "complete" })?;
        let limit = reauthorization_limit(authorized)
            .ok_or(OrderError::AmountOutOfRange { action: "complete" })?;
        self.total_real_cost = total_real;

        if total_real > limit {
            self.transition(
                OrderState::WaitingForApproval,
                EventType::WaitingForApproval,
                metadata! { events::TOTAL_REAL => total_real, events::LIMIT => limit },
            );
            return Err(OrderError::RequiresReauthorization {
                total_real,
                limit,
                authorized,
            });
        }

        self.transition(OrderState::Completed, EventType::Completed, metadata!());
        Ok(())
    }

    /// Records a new, higher approval after real costs went over the limit.
    pub fn reauthorize(&mut self, new_amount: Decimal) -> Result<(), OrderError> {
        self.ensure_not_cancelled()?;
        self.ensure_transition(self.state.can_reauthorize(), "reauthorize")?;
        if new_amount < self.total_real_cost {
            return Err(OrderError::InvalidAmount {
                amount: new_amount,
                total_real: self.total_real_cost,
            });
        }

        let amount = authorizable_amount(new_amount, "reauthorize")?;
        self.authorization_version = self.authorization_version.next();
        self.authorized_amount = Some(amount);
        let version = self.authorization_version.as_u32();

        self.transition(
            OrderState::Authorized,
            EventType::Reauthorized,
            metadata! { events::AMOUNT => amount, events::VERSION => version },
        );
        Ok(())
    }

    /// Hands the vehicle back.
    pub fn deliver(&mut self) -> Result<(), OrderError> {
        self.ensure_not_cancelled()?;
        self.ensure_transition(self.state.can_deliver(), "deliver")?;

        self.transition(OrderState::Delivered, EventType::Delivered, metadata!());
        Ok(())
    }

    /// Cancels the order from any state but `CANCELLED`.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        if !self.state.can_cancel() {
            return Err(OrderError::Cancelled);
        }

        let reason: String = reason.into();
        self.state = OrderState::Cancelled;
        let cancelled_at = self.append_event(
            EventType::Cancelled,
            metadata! { events::REASON => reason },
        );
        self.cancelled_at = Some(cancelled_at);
        Ok(())
    }
}

// Internal helpers
impl Order {
    fn ensure_not_cancelled(&self) -> Result<(), OrderError> {
        if self.state == OrderState::Cancelled {
            return Err(OrderError::Cancelled);
        }
        Ok(())
    }

    fn ensure_transition(&self, allowed: bool, action: &'static str) -> Result<(), OrderError> {
        if !allowed {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.state,
                action,
            });
        }
        Ok(())
    }

    fn transition(&mut self, to: OrderState, event_type: EventType, metadata: EventMetadata) {
        self.state = to;
        self.append_event(event_type, metadata);
    }

    /// Appends an event stamped with the current time and returns that time.
    fn append_event(&mut self, event_type: EventType, metadata: EventMetadata) -> DateTime<Utc> {
        let occurred_at = self.clock.now();
        self.events.push(Event::new(event_type, occurred_at, metadata));
        occurred_at
    }
}

fn sum_real_costs<'a>(services: impl IntoIterator<Item = &'a Service>) -> Option<Decimal> {
    services
        .into_iter()
        .try_fold(Decimal::ZERO, |total, s| total.checked_add(s.real_cost()?))
}

/// Rounds an amount to cents, rejecting amounts whose tolerance limit
/// could not be computed.
fn authorizable_amount(amount: Decimal, action: &'static str) -> Result<Decimal, OrderError> {
    checked_round_half_even(amount)
        .filter(|rounded| reauthorization_limit(*rounded).is_some())
        .ok_or(OrderError::AmountOutOfRange { action })
}
