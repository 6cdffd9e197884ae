use std::path::PathBuf;

use anyhow::{Context, Result};
use ops_context::PipelineConfig;

const DEFAULT_PORT: u16 = 3000;

/// Service settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    /// Selects the Postgres store when set.
    pub database_url: Option<String>,
    /// YAML seed for the in-memory store.
    pub seed_file: Option<PathBuf>,
    pub pipeline_config_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            seed_file: None,
            pipeline_config_file: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            database_url: non_empty(lookup("DATABASE_URL")),
            seed_file: non_empty(lookup("OPS_SEED_FILE")).map(PathBuf::from),
            pipeline_config_file: non_empty(lookup("OPS_PIPELINE_CONFIG")).map(PathBuf::from),
        }
    }

    /// Pipeline tunables from `OPS_PIPELINE_CONFIG`, or the defaults.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        match &self.pipeline_config_file {
            Some(path) => PipelineConfig::from_yaml_file(path)
                .with_context(|| format!("Invalid pipeline config {}", path.display())),
            None => Ok(PipelineConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(ServiceConfig::from_lookup(lookup(&[])), ServiceConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/ops"),
            ("OPS_SEED_FILE", "seed.yaml"),
            ("OPS_PIPELINE_CONFIG", "pipeline.yaml"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/ops"));
        assert_eq!(config.seed_file, Some(PathBuf::from("seed.yaml")));
        assert_eq!(config.pipeline_config_file, Some(PathBuf::from("pipeline.yaml")));
    }

    #[test]
    fn bad_port_and_blank_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[("PORT", "http"), ("DATABASE_URL", "  ")]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn missing_pipeline_config_file_is_an_error() {
        let config = ServiceConfig {
            pipeline_config_file: Some(PathBuf::from("/nonexistent/pipeline.yaml")),
            ..Default::default()
        };
        assert!(config.pipeline_config().is_err());
    }
}
