//! Billable services and their cost aggregation.

use common::{ComponentId, ServiceId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::checked_sum;

use super::Component;

/// A billable unit of work, possibly consuming parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    id: ServiceId,
    description: String,
    labor_estimate: Decimal,
    #[serde(default)]
    real_cost: Option<Decimal>,
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    completed: bool,
}

impl Service {
    /// Creates a service with no parts.
    ///
    /// `labor_estimate` must not be negative.
    pub fn new(id: ServiceId, description: impl Into<String>, labor_estimate: Decimal) -> Self {
        debug_assert!(
            !labor_estimate.is_sign_negative(),
            "labor estimate must not be negative"
        );
        Self {
            id,
            description: description.into(),
            labor_estimate,
            real_cost: None,
            components: Vec::new(),
            completed: false,
        }
    }

    /// Adds a part, keeping insertion order.
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the estimated labor cost, parts excluded.
    pub fn labor_estimate(&self) -> Decimal {
        self.labor_estimate
    }

    /// Returns the directly entered real cost, if any.
    pub fn recorded_real_cost(&self) -> Option<Decimal> {
        self.real_cost
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id() == id)
    }

    /// Informational flag, not used by any cost rule.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Labor estimate plus every part's estimate, or `None` on overflow.
    pub fn estimated_subtotal(&self) -> Option<Decimal> {
        checked_sum(
            std::iter::once(self.labor_estimate)
                .chain(self.components.iter().map(Component::estimated_cost)),
        )
    }

    /// Real cost of the service, or `None` if the parts overflow.
    ///
    /// A directly entered real cost already includes parts and is returned
    /// alone. Otherwise this is the labor estimate plus whatever real cost
    /// each part has (parts without one count as zero).
    pub fn real_cost(&self) -> Option<Decimal> {
        match self.real_cost {
            Some(real_cost) => Some(real_cost),
            None => checked_sum(
                std::iter::once(self.labor_estimate)
                    .chain(self.components.iter().filter_map(Component::real_cost)),
            ),
        }
    }

    pub(crate) fn set_real_cost(&mut self, real_cost: Decimal) {
        self.real_cost = Some(real_cost);
    }

    /// Sets the real cost of the parts named in `costs`; unknown ids are ignored.
    pub(crate) fn apply_component_costs<'a>(
        &mut self,
        costs: impl IntoIterator<Item = (&'a ComponentId, &'a Decimal)>,
    ) {
        for (id, cost) in costs {
            if let Some(component) = self.components.iter_mut().find(|c| c.id() == *id) {
                component.set_real_cost(Some(*cost));
            }
        }
    }

    pub(crate) fn clear_component_costs(&mut self) {
        for component in &mut self.components {
            component.set_real_cost(None);
        }
    }
}
