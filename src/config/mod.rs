//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::core::filter::FilterState;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::time::Duration;

fn default_page_size() -> usize {
    20
}

fn default_interpreter_timeout_ms() -> u64 {
    8_000
}

fn default_event_capacity() -> usize {
    1024
}

fn default_notification_capacity() -> usize {
    50
}

/// Engine and realtime settings
///
/// # Example
/// ```yaml
/// page_size: 12
/// interpreter_timeout_ms: 5000
/// default_filter:
///   hide_sold: true
///   sort: price_asc
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Rows requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Upper bound on a query interpretation call, in milliseconds
    #[serde(default = "default_interpreter_timeout_ms")]
    pub interpreter_timeout_ms: u64,

    /// Buffer size of the realtime event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Maximum notifications kept in a feed
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Filter the engine starts from
    #[serde(default)]
    pub default_filter: FilterState,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            interpreter_timeout_ms: default_interpreter_timeout_ms(),
            event_capacity: default_event_capacity(),
            notification_capacity: default_notification_capacity(),
            default_filter: FilterState::default(),
        }
    }
}

impl MarketConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string(),
            },
            _ => ConfigError::IoError {
                message: e.to_string(),
            },
        })?;

        Self::parse(&content, Some(path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, file: Option<&str>) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: file.map(str::to_string),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("page_size", self.page_size),
            ("event_capacity", self.event_capacity),
            ("notification_capacity", self.notification_capacity),
        ];
        if let Some((field, value)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if let (Some(min), Some(max)) = (
            self.default_filter.min_price,
            self.default_filter.max_price,
        ) {
            if min > max {
                return Err(ConfigError::InvalidValue {
                    field: "default_filter.min_price".to_string(),
                    value: min.to_string(),
                    message: format!("exceeds max_price {}", max),
                });
            }
        }

        Ok(())
    }

    pub fn interpreter_timeout(&self) -> Duration {
        Duration::from_millis(self.interpreter_timeout_ms)
    }
}
