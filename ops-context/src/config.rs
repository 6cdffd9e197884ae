use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ContextError, Result};

/// Longest accepted historical window, one leap year.
pub const MAX_HISTORY_WINDOW_DAYS: u32 = 366;

/// Tunables for one pipeline. Insight thresholds and formatter caps are
/// constants in their own modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Headcount that counts as 100% staffing.
    pub target_headcount: u32,
    pub staff_fetch_limit: usize,
    pub backlog_fetch_limit: usize,
    /// Trailing days covered by the historical summary.
    pub history_window_days: u32,
    /// Used when no session carries a recorded turnover.
    pub default_turnover_minutes: f64,
    /// Used when no session in the week carries a status.
    pub default_cancellation_rate: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_headcount: 100,
            staff_fetch_limit: 100,
            backlog_fetch_limit: 50,
            history_window_days: 7,
            default_turnover_minutes: 25.0,
            default_cancellation_rate: 2.5,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: PipelineConfig =
            serde_yaml::from_str(raw).map_err(|e| ContextError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ContextError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_headcount == 0 {
            return Err(ContextError::ConfigError(
                "target_headcount must be greater than zero".to_string(),
            ));
        }
        if self.history_window_days > MAX_HISTORY_WINDOW_DAYS {
            return Err(ContextError::ConfigError(format!(
                "history_window_days must be at most {MAX_HISTORY_WINDOW_DAYS}"
            )));
        }
        if self.default_turnover_minutes < 0.0 || self.default_cancellation_rate < 0.0 {
            return Err(ContextError::ConfigError(
                "placeholder metrics must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = PipelineConfig::from_yaml_str("target_headcount: 40\n").unwrap();
        assert_eq!(config.target_headcount, 40);
        assert_eq!(config.history_window_days, 7);
        assert_eq!(config.default_cancellation_rate, 2.5);
    }

    #[test]
    fn zero_headcount_is_rejected() {
        let result = PipelineConfig::from_yaml_str("target_headcount: 0\n");
        assert!(matches!(result, Err(ContextError::ConfigError(_))));
    }

    #[test]
    fn oversized_history_window_is_rejected() {
        let result = PipelineConfig::from_yaml_str("history_window_days: 200000000\n");
        assert!(matches!(result, Err(ContextError::ConfigError(_))));

        let config = PipelineConfig::from_yaml_str("history_window_days: 366\n").unwrap();
        assert_eq!(config.history_window_days, MAX_HISTORY_WINDOW_DAYS);
    }
}
