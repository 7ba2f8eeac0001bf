use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A (temperature, top_p) pair controlling one generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingPair {
    /// Sampling temperature (0.0 to 2.0)
    pub temperature: f64,
    /// Nucleus sampling threshold (exclusive 0.0 to inclusive 1.0)
    pub top_p: f64,
}

impl SamplingPair {
    /// Create a pair, rejecting out-of-range values
    pub fn new(temperature: f64, top_p: f64) -> Result<Self> {
        let pair = Self { temperature, top_p };
        pair.validate()?;
        Ok(pair)
    }

    /// Check the parameter ranges; deserialized pairs go through this at config load
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..=2.0).contains(&self.temperature),
            "temperature {} outside [0, 2]",
            self.temperature
        );
        anyhow::ensure!(
            self.top_p > 0.0 && self.top_p <= 1.0,
            "top_p {} outside (0, 1]",
            self.top_p
        );
        Ok(())
    }
}

/// One prompt to run against a model across a sequence of sampling pairs.
/// Validated at construction and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEvaluationRequest {
    /// Prompt text sent to the provider
    pub prompt: String,
    /// Provider model identifier
    pub model: String,
    /// Ordered sampling pairs; duplicates are allowed
    pub pairs: Vec<SamplingPair>,
}

impl PromptEvaluationRequest {
    /// Build a request, validating every sampling pair up front
    pub fn new(prompt: String, model: String, pairs: Vec<SamplingPair>) -> Result<Self> {
        for (index, pair) in pairs.iter().enumerate() {
            pair.validate()
                .map_err(|e| anyhow::anyhow!("sampling pair {}: {}", index + 1, e))?;
        }
        Ok(Self {
            prompt,
            model,
            pairs,
        })
    }
}

/// The four objective metric values for one response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricVector {
    /// Unique words / total words, as a percentage (0 to 100)
    pub lexical_diversity: f64,
    /// Share of prompt keywords present in the response (0 to 100)
    pub query_coverage: f64,
    /// Flesch-Kincaid grade level estimate (unbounded)
    pub flesch_kincaid_grade: f64,
    /// Share of repeated n-gram windows (0 to 100)
    pub repetition_penalty: f64,
}

/// One scored generation: the durable unit of record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Original prompt
    pub prompt: String,
    /// Model that produced the response
    pub model: String,
    /// Sampling temperature used for this call
    pub temperature: f64,
    /// Nucleus threshold used for this call
    pub top_p: f64,
    /// Generated text
    pub response: String,
    /// Raw metric values computed from the response
    pub metrics: MetricVector,
}

/// Structured diagnostic for a generation call that produced no record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationFailure {
    /// Zero-based position of the pair in the request
    pub pair_index: usize,
    /// Temperature of the failing pair
    pub temperature: f64,
    /// Top_p of the failing pair
    pub top_p: f64,
    /// Provider error, timeout, or task failure description
    pub reason: String,
}

/// Result of dispatching one request: successes plus per-pair failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// One record per successful generation, ordered by originating pair
    pub records: Vec<ScoredRecord>,
    /// Diagnostics for every pair that produced no record
    pub failures: Vec<GenerationFailure>,
}

impl EvaluationOutcome {
    /// Total generation calls attempted for this request
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

/// A scored record plus its dataset-relative normalized metrics.
/// Transient: valid only for the dataset scope it was normalized against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// The underlying scored record
    pub record: ScoredRecord,
    /// Metrics rescaled to 0-100 where higher is better for display
    pub normalized: MetricVector,
}

/// Grouping key for aggregation: a numeric bucket or a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Number(f64),
    Label(String),
}

impl GroupKey {
    /// Ordering for deterministic output: numbers ascending, labels lexicographic
    pub fn sort_cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (GroupKey::Label(a), GroupKey::Label(b)) => a.cmp(b),
            (GroupKey::Number(_), GroupKey::Label(_)) => Ordering::Less,
            (GroupKey::Label(_), GroupKey::Number(_)) => Ordering::Greater,
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::Number(n) => write!(f, "{}", n),
            GroupKey::Label(s) => write!(f, "{}", s),
        }
    }
}

/// Per-group summary over normalized records; never emitted for empty groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Grouping key this summary covers
    pub key: GroupKey,
    /// Number of records in the group (always >= 1)
    pub count: usize,
    /// Arithmetic mean of each normalized metric over the group
    pub mean: MetricVector,
}

/// Complete output for one configured evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Title from the configuration entry
    pub title: String,
    /// Scored records for successful pairs
    pub records: Vec<ScoredRecord>,
    /// Failures for pairs that produced no record
    pub failures: Vec<GenerationFailure>,
    /// Grouped summaries over the normalized records
    pub summaries: Vec<AggregateSummary>,
}
