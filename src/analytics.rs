use crate::models::{
    AggregateSummary, GroupKey, MetricVector, NormalizedRecord, ScoredRecord,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Normalized value used when every record shares the same raw value, so
/// min-max rescaling has no range to work with
const DEGENERATE_MIDPOINT: f64 = 50.0;

/// Rescale each metric of a dataset to 0-100 where higher reads as better.
///
/// The slice passed in is the whole dataset scope: min/max come from it and
/// nothing else, so the same record can normalize differently under a
/// different scope. Lexical diversity and query coverage pass through,
/// Flesch-Kincaid grade is min-max rescaled (direction preserved), and
/// repetition penalty is min-max rescaled then inverted so less repetition
/// displays as a higher score.
pub fn normalize(records: &[ScoredRecord]) -> Vec<NormalizedRecord> {
    let fk_bounds = bounds(records, |m| m.flesch_kincaid_grade);
    let rp_bounds = bounds(records, |m| m.repetition_penalty);

    records
        .iter()
        .map(|record| NormalizedRecord {
            normalized: MetricVector {
                lexical_diversity: record.metrics.lexical_diversity,
                query_coverage: record.metrics.query_coverage,
                flesch_kincaid_grade: min_max(record.metrics.flesch_kincaid_grade, fk_bounds),
                repetition_penalty: 100.0 - min_max(record.metrics.repetition_penalty, rp_bounds),
            },
            record: record.clone(),
        })
        .collect()
}

fn bounds(records: &[ScoredRecord], metric: impl Fn(&MetricVector) -> f64) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for record in records {
        let value = metric(&record.metrics);
        min = min.min(value);
        max = max.max(value);
    }
    (min, max)
}

fn min_max(value: f64, (min, max): (f64, f64)) -> f64 {
    if max - min == 0.0 {
        return DEGENERATE_MIDPOINT;
    }
    (value - min) / (max - min) * 100.0
}

/// Group normalized records by the caller-supplied key and average each
/// metric per group. Empty groups never appear; output is ordered by key
/// ascending with ties kept in first-occurrence order.
pub fn aggregate<F>(records: &[NormalizedRecord], key_fn: F) -> Vec<AggregateSummary>
where
    F: Fn(&NormalizedRecord) -> GroupKey,
{
    let mut groups: Vec<(GroupKey, MetricSums)> = Vec::new();

    for record in records {
        let key = key_fn(record);
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, sums)) => sums.add(&record.normalized),
            None => {
                let mut sums = MetricSums::default();
                sums.add(&record.normalized);
                groups.push((key, sums));
            }
        }
    }

    let mut summaries: Vec<AggregateSummary> = groups
        .into_iter()
        .map(|(key, sums)| sums.into_summary(key))
        .collect();
    // Stable sort keeps first-occurrence order for equal keys
    summaries.sort_by(|a, b| a.key.sort_cmp(&b.key));
    summaries
}

/// Dimension to group summaries by; the persisted record set carries exactly
/// these three columns as grouping candidates
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum GroupBy {
    Temperature,
    TopP,
    Model,
}

impl GroupBy {
    /// Key extraction for one record under this dimension
    pub fn key(&self, record: &NormalizedRecord) -> GroupKey {
        match self {
            GroupBy::Temperature => GroupKey::Number(record.record.temperature),
            GroupBy::TopP => GroupKey::Number(record.record.top_p),
            GroupBy::Model => GroupKey::Label(record.record.model.clone()),
        }
    }
}

/// Normalize a record set and aggregate it along one dimension: the composed
/// summary query exposed to callers
pub fn summarize(records: &[ScoredRecord], group_by: GroupBy) -> Vec<AggregateSummary> {
    let normalized = normalize(records);
    aggregate(&normalized, |record| group_by.key(record))
}

#[derive(Default)]
struct MetricSums {
    lexical_diversity: f64,
    query_coverage: f64,
    flesch_kincaid_grade: f64,
    repetition_penalty: f64,
    count: usize,
}

impl MetricSums {
    fn add(&mut self, metrics: &MetricVector) {
        self.lexical_diversity += metrics.lexical_diversity;
        self.query_coverage += metrics.query_coverage;
        self.flesch_kincaid_grade += metrics.flesch_kincaid_grade;
        self.repetition_penalty += metrics.repetition_penalty;
        self.count += 1;
    }

    fn into_summary(self, key: GroupKey) -> AggregateSummary {
        let n = self.count as f64;
        AggregateSummary {
            key,
            count: self.count,
            mean: MetricVector {
                lexical_diversity: self.lexical_diversity / n,
                query_coverage: self.query_coverage / n,
                flesch_kincaid_grade: self.flesch_kincaid_grade / n,
                repetition_penalty: self.repetition_penalty / n,
            },
        }
    }
}
