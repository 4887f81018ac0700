//! Runner configuration loaded from environment variables.

/// Runner configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `WORKSHOP_PRETTY`: pretty-print the resulting order (default: `false`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: String,
    pub pretty: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            pretty: lookup("WORKSHOP_PRETTY")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.pretty),
        }
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(mut self, log_level: Option<String>, pretty: bool) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self.pretty |= pretty;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            pretty: false,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.pretty);
    }

    #[test]
    fn test_missing_vars_use_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn test_reads_vars() {
        let config = Config::from_lookup(lookup(&[
            ("RUST_LOG", "domain=debug"),
            ("WORKSHOP_PRETTY", "TRUE"),
        ]));
        assert_eq!(config.log_level, "domain=debug");
        assert!(config.pretty);
    }

    #[test]
    fn test_unrecognized_flag_is_false() {
        let config = Config::from_lookup(lookup(&[("WORKSHOP_PRETTY", "maybe")]));
        assert!(!config.pretty);
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(Some("warn".to_string()), true);
        assert_eq!(config.log_level, "warn");
        assert!(config.pretty);

        let config = Config {
            log_level: "debug".to_string(),
            pretty: true,
        }
        .with_overrides(None, false);
        assert_eq!(config.log_level, "debug");
        assert!(config.pretty);
    }
}
