//! Command scripts and their replay.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use domain::{
    CreateOrder, DomainError, ErrorCode, Order, OrderCommand, OrderRepository, OrderService,
};
use serde::{Deserialize, Serialize};

/// One order and the commands to run against it, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub client: String,
    pub vehicle: String,
    #[serde(default)]
    pub commands: Vec<OrderCommand>,
}

impl Script {
    /// Reads a script from `path`, or from stdin when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let raw = match path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read script {}", path.display()))?,
            None => {
                let mut raw = String::new();
                std::io::stdin()
                    .read_to_string(&mut raw)
                    .context("failed to read script from stdin")?;
                raw
            }
        };
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("invalid script")
    }
}

/// A command the order rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Position of the command in the script.
    pub index: usize,
    pub command: &'static str,
    pub code: ErrorCode,
    pub message: String,
    /// The order was stored in a new state despite the failure.
    pub committed: bool,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub order: Order,
    pub failures: Vec<Failure>,
}

impl Report {
    /// True if any command failed and left the order untouched.
    pub fn has_rejections(&self) -> bool {
        self.failures.iter().any(|f| !f.committed)
    }
}

/// Opens an order for the script and runs every command against it.
///
/// Rejections by the order are collected and the run continues. Anything
/// else (storage failures) aborts the run.
pub async fn run<R: OrderRepository>(
    service: &OrderService<R>,
    script: Script,
) -> anyhow::Result<Report> {
    let created = service
        .create_order(CreateOrder::new(script.client, script.vehicle))
        .await?;
    let order_id = created.order.id();
    let mut order = created.order;
    let mut failures = Vec::new();

    for (index, command) in script.commands.into_iter().enumerate() {
        let name = command.name();
        match service.execute(order_id, command).await {
            Ok(result) => order = result.order,
            Err(DomainError::Order(err)) => {
                let committed = err.commits_state();
                tracing::warn!(index, command = name, code = %err.code(), error = %err, "command failed");
                failures.push(Failure {
                    index,
                    command: name,
                    code: err.code(),
                    message: err.to_string(),
                    committed,
                });
                if committed
                    && let Some(stored) = service.get_order(order_id).await?
                {
                    order = stored;
                }
            }
            Err(err) => bail!("command {index} ({name}) aborted the run: {err}"),
        }
    }

    Ok(Report { order, failures })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_script() {
        let script = Script::parse(r#"{ "client": "Ana", "vehicle": "ABC-123" }"#).unwrap();
        assert_eq!(script.client, "Ana");
        assert!(script.commands.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        let raw = r#"{
            "client": "Ana",
            "vehicle": "ABC-123",
            "commands": [{ "command": "teleport" }]
        }"#;
        assert!(Script::parse(raw).is_err());
    }

    #[test]
    fn test_parse_commands() {
        let raw = r#"{
            "client": "Ana",
            "vehicle": "ABC-123",
            "commands": [
                { "command": "add_service", "description": "Brakes", "labor_estimate": "300" },
                { "command": "mark_diagnosed" },
                { "command": "authorize", "amount": "350.00" }
            ]
        }"#;
        let script = Script::parse(raw).unwrap();
        let names: Vec<_> = script.commands.iter().map(OrderCommand::name).collect();
        assert_eq!(names, vec!["add_service", "mark_diagnosed", "authorize"]);
    }
}
