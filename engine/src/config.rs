//! Handler and driver settings

use std::time::Duration;

/// Settings for a [`BattleHandler`](crate::BattleHandler)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct HandlerConfig {
    /// Log every event forwarded to the parser at debug level
    pub log_events: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self { log_events: false }
    }
}

/// Settings for a [`BattleDriver`](crate::BattleDriver)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct DriverConfig {
    /// Deadline for the handler to take one event
    pub event_timeout: Duration,

    /// Force the battle to end once this turn is announced
    pub max_turns: Option<u32>,

    pub handler: HandlerConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            event_timeout: Duration::from_secs(30),
            max_turns: None,
            handler: HandlerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.event_timeout, Duration::from_secs(30));
        assert_eq!(config.max_turns, None);
        assert!(!config.handler.log_events);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial() {
        let config: DriverConfig =
            serde_json::from_str(r#"{"max_turns": 100, "handler": {"log_events": true}}"#)
                .unwrap();
        assert_eq!(config.max_turns, Some(100));
        assert!(config.handler.log_events);
        assert_eq!(config.event_timeout, Duration::from_secs(30));
    }
}
