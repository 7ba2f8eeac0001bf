use crate::models::SamplingPair;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Connection settings for the text-generation provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible API endpoint
    pub api_endpoint: String,
    /// Environment variable name containing the API key
    pub env_var_api_key: String,
    /// Maximum tokens per generated response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Maximum concurrent generation calls in flight
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Per-call timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_max_in_flight() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// One prompt sweep: a prompt run against a model across sampling pairs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationSpec {
    /// Display title for this sweep
    pub title: String,
    /// Prompt text
    pub prompt: String,
    /// Model to generate with
    pub model: String,
    /// Sampling pairs to sweep; duplicates allowed for repeat sampling
    pub pairs: Vec<SamplingPair>,
    /// Optional local path to store scored records as JSON
    #[serde(default)]
    pub storage_path: Option<String>,
}

/// Root configuration: provider settings plus the list of sweeps
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Provider connection settings
    pub provider: ProviderConfig,
    /// Evaluation sweeps to run
    pub evaluations: Vec<EvaluationSpec>,
}

impl Config {
    /// Load configuration from a TOML file, rejecting out-of-range sampling
    /// parameters before anything reaches the dispatcher
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        for spec in &config.evaluations {
            for pair in &spec.pairs {
                pair.validate()
                    .with_context(|| format!("Invalid sampling pair in evaluation {:?}", spec.title))?;
            }
        }

        Ok(config)
    }
}
