use crate::metrics;
use crate::models::{
    EvaluationOutcome, GenerationFailure, PromptEvaluationRequest, SamplingPair, ScoredRecord,
};
use crate::provider::GenerationProvider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fans one request out into one generation task per sampling pair and
/// reduces the per-pair outcomes into scored records plus failures.
pub struct Dispatcher<P> {
    provider: Arc<P>,
    max_in_flight: usize,
    request_timeout: Duration,
}

impl<P: GenerationProvider> Dispatcher<P> {
    /// Create a dispatcher; at least one call is always allowed in flight
    pub fn new(provider: P, max_in_flight: usize, request_timeout: Duration) -> Self {
        Self {
            provider: Arc::new(provider),
            max_in_flight: max_in_flight.max(1),
            request_timeout,
        }
    }

    /// Run every sampling pair concurrently and score the successes.
    ///
    /// Each pair's outcome is captured independently: an error or timeout on
    /// one pair never aborts the others. Results are merged only at the join
    /// point; records come back ordered by originating pair index. Dropping
    /// the returned future aborts any still-pending generation calls.
    pub async fn evaluate(&self, request: &PromptEvaluationRequest) -> EvaluationOutcome {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks: JoinSet<(usize, SamplingPair, Result<String, String>)> = JoinSet::new();
        let mut pair_by_task: HashMap<tokio::task::Id, (usize, SamplingPair)> = HashMap::new();

        for (index, pair) in request.pairs.iter().copied().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let prompt = request.prompt.clone();
            let model = request.model.clone();
            let timeout = self.request_timeout;

            let handle = tasks.spawn(async move {
                let outcome = match semaphore.acquire().await {
                    Ok(_permit) => {
                        match tokio::time::timeout(
                            timeout,
                            provider.generate(&prompt, &model, pair),
                        )
                        .await
                        {
                            Ok(Ok(text)) => Ok(text),
                            Ok(Err(err)) => Err(format!("{:#}", err)),
                            Err(_) => {
                                Err(format!("request timed out after {:?}", timeout))
                            }
                        }
                    }
                    Err(_) => Err("concurrency limiter closed".to_string()),
                };
                (index, pair, outcome)
            });
            pair_by_task.insert(handle.id(), (index, pair));
        }

        let mut scored: Vec<(usize, ScoredRecord)> = Vec::new();
        let mut failures: Vec<GenerationFailure> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, pair, Ok(text))) => {
                    // Metric computation is synchronous, after the call resolves
                    let metric_values = metrics::calculate_metrics(&request.prompt, &text);
                    scored.push((
                        index,
                        ScoredRecord {
                            prompt: request.prompt.clone(),
                            model: request.model.clone(),
                            temperature: pair.temperature,
                            top_p: pair.top_p,
                            response: text,
                            metrics: metric_values,
                        },
                    ));
                }
                Ok((index, pair, Err(reason))) => {
                    failures.push(GenerationFailure {
                        pair_index: index,
                        temperature: pair.temperature,
                        top_p: pair.top_p,
                        reason,
                    });
                }
                Err(join_error) => {
                    if let Some((index, pair)) = pair_by_task.get(&join_error.id()).copied() {
                        failures.push(GenerationFailure {
                            pair_index: index,
                            temperature: pair.temperature,
                            top_p: pair.top_p,
                            reason: format!("generation task failed: {}", join_error),
                        });
                    }
                }
            }
        }

        scored.sort_by_key(|(index, _)| *index);
        failures.sort_by_key(|f| f.pair_index);

        EvaluationOutcome {
            records: scored.into_iter().map(|(_, record)| record).collect(),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that fails for configured temperatures and can delay responses
    struct ScriptedProvider {
        fail_temperatures: Vec<f64>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn reliable() -> Self {
            Self {
                fail_temperatures: vec![],
                delay: None,
            }
        }

        fn failing_at(temperatures: Vec<f64>) -> Self {
            Self {
                fail_temperatures: temperatures,
                delay: None,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                fail_temperatures: vec![],
                delay: Some(delay),
            }
        }
    }

    impl GenerationProvider for ScriptedProvider {
        async fn generate(
            &self,
            prompt: &str,
            _model: &str,
            pair: SamplingPair,
        ) -> Result<String> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_temperatures.contains(&pair.temperature) {
                anyhow::bail!("simulated provider outage at temperature {}", pair.temperature);
            }
            Ok(format!("{} echoed at temperature {}", prompt, pair.temperature))
        }
    }

    fn request(pairs: Vec<(f64, f64)>) -> PromptEvaluationRequest {
        let pairs = pairs
            .into_iter()
            .map(|(t, p)| SamplingPair::new(t, p).unwrap())
            .collect();
        PromptEvaluationRequest::new(
            "Explain the quick brown fox".to_string(),
            "test-model".to_string(),
            pairs,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_all_pairs_succeed() {
        let dispatcher = Dispatcher::new(
            ScriptedProvider::reliable(),
            4,
            Duration::from_secs(5),
        );
        let outcome = dispatcher
            .evaluate(&request(vec![(0.2, 0.9), (0.7, 0.9), (1.2, 0.9)]))
            .await;

        assert_eq!(outcome.records.len(), 3);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.attempted(), 3);
        // Records come back in pair order regardless of completion order
        assert_eq!(outcome.records[0].temperature, 0.2);
        assert_eq!(outcome.records[1].temperature, 0.7);
        assert_eq!(outcome.records[2].temperature, 1.2);
    }

    #[tokio::test]
    async fn test_failing_pair_is_isolated() {
        let dispatcher = Dispatcher::new(
            ScriptedProvider::failing_at(vec![0.7]),
            4,
            Duration::from_secs(5),
        );
        let outcome = dispatcher
            .evaluate(&request(vec![(0.2, 0.9), (0.7, 0.9), (1.2, 0.9)]))
            .await;

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.attempted(), 3);

        let failure = &outcome.failures[0];
        assert_eq!(failure.pair_index, 1);
        assert_eq!(failure.temperature, 0.7);
        assert!(failure.reason.contains("simulated provider outage"));

        // The surviving records are the unaffected pairs
        assert_eq!(outcome.records[0].temperature, 0.2);
        assert_eq!(outcome.records[1].temperature, 1.2);
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_failure() {
        let dispatcher = Dispatcher::new(
            ScriptedProvider::slow(Duration::from_millis(200)),
            4,
            Duration::from_millis(10),
        );
        let outcome = dispatcher.evaluate(&request(vec![(0.7, 0.9)])).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_successful_records_carry_metrics() {
        let dispatcher = Dispatcher::new(
            ScriptedProvider::reliable(),
            4,
            Duration::from_secs(5),
        );
        let outcome = dispatcher.evaluate(&request(vec![(0.5, 0.9)])).await;

        let record = &outcome.records[0];
        assert!(record.response.contains("echoed"));
        assert!(record.metrics.lexical_diversity > 0.0);
        assert!((0.0..=100.0).contains(&record.metrics.query_coverage));
    }

    #[tokio::test]
    async fn test_empty_pair_list_yields_empty_outcome() {
        let dispatcher = Dispatcher::new(
            ScriptedProvider::reliable(),
            4,
            Duration::from_secs(5),
        );
        let outcome = dispatcher.evaluate(&request(vec![])).await;
        assert!(outcome.records.is_empty());
        assert!(outcome.failures.is_empty());
    }

    /// Provider that tracks how many calls run at once
    struct CountingProvider {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl GenerationProvider for Arc<CountingProvider> {
        async fn generate(
            &self,
            _prompt: &str,
            _model: &str,
            _pair: SamplingPair,
        ) -> Result<String> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok("counted".to_string())
        }
    }

    #[tokio::test]
    async fn test_in_flight_calls_are_bounded() {
        let counter = Arc::new(CountingProvider {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let dispatcher = Dispatcher::new(Arc::clone(&counter), 2, Duration::from_secs(5));

        let pairs: Vec<(f64, f64)> = (0..6).map(|i| (0.1 * i as f64, 0.9)).collect();
        let outcome = dispatcher.evaluate(&request(pairs)).await;

        assert_eq!(outcome.records.len(), 6);
        assert!(counter.peak.load(Ordering::SeqCst) <= 2);
    }
}
