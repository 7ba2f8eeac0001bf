use crate::analytics::{self, GroupBy};
use crate::config::{Config, EvaluationSpec};
use crate::dispatcher::Dispatcher;
use crate::models::{EvaluationReport, PromptEvaluationRequest, ScoredRecord};
use crate::provider::{GenerationProvider, OpenAiProvider};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Main runner that orchestrates evaluation sweeps
pub struct Runner {
    config: Config,
    group_by: GroupBy,
    verbose: bool,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config, group_by: GroupBy, verbose: bool) -> Self {
        Self {
            config,
            group_by,
            verbose,
        }
    }

    /// Run every sweep defined in the configuration
    pub async fn run_evaluations(&self) -> Result<Vec<EvaluationReport>> {
        let provider = OpenAiProvider::from_config(&self.config.provider)?;
        let dispatcher = Dispatcher::new(
            provider,
            self.config.provider.max_in_flight,
            Duration::from_secs(self.config.provider.request_timeout_secs),
        );
        self.run_with_dispatcher(&dispatcher).await
    }

    /// Run the configured sweeps against an already-built dispatcher
    pub async fn run_with_dispatcher<P: GenerationProvider>(
        &self,
        dispatcher: &Dispatcher<P>,
    ) -> Result<Vec<EvaluationReport>> {
        let mut reports = Vec::new();
        let total = self.config.evaluations.len();

        for (index, spec) in self.config.evaluations.iter().enumerate() {
            let report = self
                .run_single_evaluation(dispatcher, spec, index + 1, total)
                .await?;
            reports.push(report);
        }

        Ok(reports)
    }

    /// Dispatch one sweep, summarize it, and store records if configured
    async fn run_single_evaluation<P: GenerationProvider>(
        &self,
        dispatcher: &Dispatcher<P>,
        spec: &EvaluationSpec,
        eval_num: usize,
        total: usize,
    ) -> Result<EvaluationReport> {
        if self.verbose {
            println!(
                "Running evaluation {:?} ({}/{}): {} sampling pairs",
                spec.title,
                eval_num,
                total,
                spec.pairs.len()
            );
        }

        let request = PromptEvaluationRequest::new(
            spec.prompt.clone(),
            spec.model.clone(),
            spec.pairs.clone(),
        )
        .with_context(|| format!("Invalid request for evaluation {:?}", spec.title))?;

        let outcome = dispatcher.evaluate(&request).await;

        if self.verbose {
            println!(
                "  → {}/{} pairs succeeded, {} failed",
                outcome.records.len(),
                outcome.attempted(),
                outcome.failures.len()
            );
            for failure in &outcome.failures {
                println!(
                    "  → pair {} (temperature {}, top_p {}): {}",
                    failure.pair_index + 1,
                    failure.temperature,
                    failure.top_p,
                    failure.reason
                );
            }
        }

        let summaries = analytics::summarize(&outcome.records, self.group_by);

        if let Some(storage_path) = &spec.storage_path {
            if self.verbose {
                println!("  → Storing {} records to {}", outcome.records.len(), storage_path);
            }
            store_records(&outcome.records, storage_path)?;
        }

        Ok(EvaluationReport {
            title: spec.title.clone(),
            records: outcome.records,
            failures: outcome.failures,
            summaries,
        })
    }
}

/// Persist scored records as pretty JSON; the record list is the durable
/// unit, reloadable later for analytics
pub fn store_records(records: &[ScoredRecord], path: &str) -> Result<()> {
    let json_content =
        serde_json::to_string_pretty(records).context("Failed to serialize records to JSON")?;

    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, json_content)
        .with_context(|| format!("Failed to write records to: {}", path))
}

/// Load a previously stored record set
pub fn load_records(path: &Path) -> Result<Vec<ScoredRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))
}
