//! Repair order commands.
//!
//! Serializable descriptions of the operations on an [`Order`](super::Order),
//! for callers that receive work as data (scripts, queues) instead of
//! calling the aggregate directly. Amounts are best given as JSON strings
//! (`"1160.00"`) so they never pass through a float.

use std::collections::HashMap;

use common::{ComponentId, IdGenerator, ServiceId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Component, Service};

/// A part to attach to a new service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComponent {
    /// Assigned by the id generator when absent.
    #[serde(default)]
    pub id: Option<ComponentId>,
    pub description: String,
    pub estimated_cost: Decimal,
}

/// A service to add to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    /// Assigned by the id generator when absent.
    #[serde(default)]
    pub id: Option<ServiceId>,
    pub description: String,
    pub labor_estimate: Decimal,
    #[serde(default)]
    pub components: Vec<NewComponent>,
    #[serde(default)]
    pub completed: bool,
}

impl NewService {
    pub fn new(description: impl Into<String>, labor_estimate: Decimal) -> Self {
        Self {
            id: None,
            description: description.into(),
            labor_estimate,
            components: Vec::new(),
            completed: false,
        }
    }

    /// Pins the service id instead of generating one.
    pub fn with_id(mut self, id: ServiceId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_component(mut self, description: impl Into<String>, estimated_cost: Decimal) -> Self {
        self.components.push(NewComponent {
            id: None,
            description: description.into(),
            estimated_cost,
        });
        self
    }

    /// Builds the service, drawing missing ids from `ids`.
    pub fn build(self, ids: &dyn IdGenerator) -> Service {
        let id = self.id.unwrap_or_else(|| ids.service_id());
        self.components.into_iter().fold(
            Service::new(id, self.description, self.labor_estimate).with_completed(self.completed),
            |service, part| {
                let part_id = part.id.unwrap_or_else(|| ids.component_id());
                service.with_component(Component::new(
                    part_id,
                    part.description,
                    part.estimated_cost,
                ))
            },
        )
    }
}

/// An operation on an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum OrderCommand {
    AddService(NewService),
    MarkDiagnosed,
    Authorize {
        amount: Decimal,
    },
    MarkInProgress,
    RecordRealCost {
        service_id: ServiceId,
        real_cost: Decimal,
        #[serde(default)]
        component_real_costs: Option<HashMap<ComponentId, Decimal>>,
    },
    AttemptComplete,
    Reauthorize {
        amount: Decimal,
    },
    Deliver,
    Cancel {
        reason: String,
    },
}

impl OrderCommand {
    /// Returns the command name, as used in the `command` tag.
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::AddService(_) => "add_service",
            OrderCommand::MarkDiagnosed => "mark_diagnosed",
            OrderCommand::Authorize { .. } => "authorize",
            OrderCommand::MarkInProgress => "mark_in_progress",
            OrderCommand::RecordRealCost { .. } => "record_real_cost",
            OrderCommand::AttemptComplete => "attempt_complete",
            OrderCommand::Reauthorize { .. } => "reauthorize",
            OrderCommand::Deliver => "deliver",
            OrderCommand::Cancel { .. } => "cancel",
        }
    }
}

#[cfg(test)]
mod tests {
    use common::SequentialIds;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_build_draws_missing_ids() {
        let ids = SequentialIds::new();
        let pinned = ComponentId::from_uuid(Uuid::from_u128(99));
        let mut new_service = NewService::new("Clutch", dec!(400)).with_component("Disc", dec!(120));
        new_service.components.push(NewComponent {
            id: Some(pinned),
            description: "Bearing".to_string(),
            estimated_cost: dec!(35),
        });

        let service = new_service.build(&ids);

        assert_eq!(service.id().as_uuid(), Uuid::from_u128(1));
        assert_eq!(service.components()[0].id().as_uuid(), Uuid::from_u128(2));
        assert_eq!(service.components()[1].id(), pinned);
        assert_eq!(service.estimated_subtotal(), Some(dec!(555)));
    }

    #[test]
    fn test_build_keeps_pinned_service_id() {
        let id = ServiceId::new();
        let service = NewService::new("Alignment", dec!(60))
            .with_id(id)
            .build(&SequentialIds::new());
        assert_eq!(service.id(), id);
    }

    #[test]
    fn test_command_json_shape() {
        let json = r#"[
            {"command": "add_service", "description": "Oil change", "labor_estimate": "50",
             "components": [{"description": "Filter", "estimated_cost": "12.50"}]},
            {"command": "mark_diagnosed"},
            {"command": "authorize", "amount": "100.005"},
            {"command": "cancel", "reason": "changed mind"}
        ]"#;

        let commands: Vec<OrderCommand> = serde_json::from_str(json).unwrap();
        let names: Vec<_> = commands.iter().map(OrderCommand::name).collect();
        assert_eq!(
            names,
            vec!["add_service", "mark_diagnosed", "authorize", "cancel"]
        );
        assert_eq!(
            commands[2],
            OrderCommand::Authorize {
                amount: dec!(100.005)
            }
        );
    }

    #[test]
    fn test_record_real_cost_map_is_optional() {
        let service_id = ServiceId::new();
        let json = format!(
            r#"{{"command": "record_real_cost", "service_id": "{service_id}", "real_cost": "1050"}}"#
        );

        let command: OrderCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(
            command,
            OrderCommand::RecordRealCost {
                service_id,
                real_cost: dec!(1050),
                component_real_costs: None,
            }
        );
    }
}
