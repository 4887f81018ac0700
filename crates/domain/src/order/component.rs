//! Parts consumed by a service.

use common::ComponentId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A part used in a service, the smallest costed unit of an order.
///
/// Everything but the real cost is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    id: ComponentId,
    description: String,
    estimated_cost: Decimal,
    #[serde(default)]
    real_cost: Option<Decimal>,
}

impl Component {
    /// Creates a component with no real cost yet.
    ///
    /// `estimated_cost` must not be negative.
    pub fn new(id: ComponentId, description: impl Into<String>, estimated_cost: Decimal) -> Self {
        debug_assert!(
            !estimated_cost.is_sign_negative(),
            "estimated cost must not be negative"
        );
        Self {
            id,
            description: description.into(),
            estimated_cost,
            real_cost: None,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn estimated_cost(&self) -> Decimal {
        self.estimated_cost
    }

    /// Returns the real cost, if one was recorded.
    pub fn real_cost(&self) -> Option<Decimal> {
        self.real_cost
    }

    pub(crate) fn set_real_cost(&mut self, real_cost: Option<Decimal>) {
        self.real_cost = real_cost;
    }
}
