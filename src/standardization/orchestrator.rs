// src/standardization/orchestrator.rs - batched calls to the standardization service with local fallback
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::sleep;

use crate::errors::StandardizationError;
use crate::matching::name::normalize;
use crate::models::{CustomerRecord, DuplicateGroup, StandardizationMetadata, StandardizationStats};
use crate::standardization::client::{
    AddressResult, NameComparison, NameResult, Operation, ServiceDuplicateGroup, ServiceRequest,
    ServiceResponse, StandardizationResult, StandardizationService,
};
use crate::standardization::config::StandardizationConfig;
use crate::standardization::fallback::{
    fallback_address, fallback_comparison, fallback_name, fallback_record, find_duplicates_locally,
    BatchOperation,
};
use crate::utils::progress_bars::logging::{DedupLogger, PipelineStage};

/// Receives a completion percentage (never decreasing within one run) and a message.
pub type ProgressCallback = Arc<dyn Fn(u8, String) + Send + Sync>;

/// Cooperative stop flag, checked between batches only.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// One entry per processed record, in input order.
    pub results: Vec<StandardizationResult>,
    pub stats: StandardizationStats,
    /// Set when the run stopped early; `results` then covers only finished batches.
    pub cancelled: Option<StandardizationError>,
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateOutcome {
    /// Indices point into the slice passed to `find_duplicates`.
    pub groups: Vec<DuplicateGroup>,
    pub stats: StandardizationStats,
    pub cancelled: Option<StandardizationError>,
}

struct ProgressTracker {
    callback: Option<ProgressCallback>,
    last_percent: u8,
}

impl ProgressTracker {
    fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last_percent: 0,
        }
    }

    fn report(&mut self, done: usize, total: usize, message: String) {
        let percent = if total == 0 {
            100
        } else {
            ((done * 100) / total).min(100) as u8
        };
        self.last_percent = self.last_percent.max(percent);
        if let Some(callback) = &self.callback {
            callback(self.last_percent, message);
        }
    }
}

pub struct StandardizationOrchestrator<S> {
    service: S,
    config: StandardizationConfig,
    progress: Option<ProgressCallback>,
    cancellation: CancellationToken,
}

impl<S: StandardizationService> StandardizationOrchestrator<S> {
    pub fn new(service: S, config: StandardizationConfig) -> Self {
        Self {
            service,
            config,
            progress: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &StandardizationConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Waits out the rate-limit delay, then issues one request.
    async fn request(
        &self,
        operation: Operation,
        data: serde_json::Value,
    ) -> Result<ServiceResponse, StandardizationError> {
        if !self.config.request_delay.is_zero() {
            sleep(self.config.request_delay).await;
        }
        self.service
            .call(ServiceRequest::new(operation, data))
            .await?
            .into_checked()
    }

    pub async fn standardize_name(&self, name: &str) -> NameResult {
        let response = self
            .request(Operation::StandardizeName, json!({ "name": name }))
            .await
            .and_then(|r| r.parse_result::<NameResult>());
        match response {
            Ok(result) => result,
            Err(e) => fallback_name(name, &e.to_string()),
        }
    }

    pub async fn standardize_address(&self, address: &str) -> AddressResult {
        let response = self
            .request(Operation::StandardizeAddress, json!({ "address": address }))
            .await
            .and_then(|r| r.parse_result::<AddressResult>());
        match response {
            Ok(result) => result,
            Err(e) => fallback_address(address, &e.to_string()),
        }
    }

    pub async fn compare_names(&self, name_a: &str, name_b: &str) -> NameComparison {
        let response = self
            .request(Operation::CompareNames, json!({ "name1": name_a, "name2": name_b }))
            .await
            .and_then(|r| r.parse_result::<NameComparison>());
        match response {
            Ok(result) => result,
            Err(e) => fallback_comparison(name_a, name_b, &e.to_string()),
        }
    }

    async fn process_batch(
        &self,
        batch: &[CustomerRecord],
        operation: BatchOperation,
    ) -> Result<Vec<StandardizationResult>, StandardizationError> {
        let payload: Vec<serde_json::Value> = batch
            .iter()
            .enumerate()
            .map(|(i, r)| {
                json!({
                    "index": i,
                    "customerName": r.customer_name,
                    "address1": r.address1,
                    "address2": r.address2,
                    "city": r.city,
                    "state": r.state,
                    "zip": r.zip,
                    "combinedAddress": r.combined_address,
                })
            })
            .collect();
        let results: Vec<StandardizationResult> = self
            .request(
                Operation::ProcessBatch,
                json!({ "type": operation.as_str(), "records": payload }),
            )
            .await?
            .parse_results()?;
        if results.len() != batch.len() {
            return Err(StandardizationError::ServiceUnavailable(format!(
                "expected {} results, got {}",
                batch.len(),
                results.len()
            )));
        }
        Ok(results)
    }

    /// Standardizes records in fixed-size batches, one request at a time.
    ///
    /// A failed batch is never dropped: each of its records gets a local
    /// fallback result carrying the error message.
    pub async fn standardize_batch(&self, records: &[CustomerRecord], operation: BatchOperation) -> BatchOutcome {
        let logger = DedupLogger::new(PipelineStage::Standardization);
        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<&[CustomerRecord]> = records.chunks(batch_size).collect();
        logger.log_batch_processing_start(records.len(), batch_size);

        let mut outcome = BatchOutcome::default();
        outcome.stats.total_records = records.len();
        outcome.stats.batches_total = batches.len();
        let mut progress = ProgressTracker::new(self.progress.clone());
        progress.report(0, batches.len(), format!("Standardizing {} records", records.len()));

        for (batch_index, batch) in batches.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                logger.log_warning(&format!("Cancelled before batch {}", batch_index + 1));
                outcome.stats.cancelled = true;
                outcome.cancelled = Some(StandardizationError::Cancelled {
                    completed_batches: batch_index,
                    total_batches: batches.len(),
                });
                break;
            }

            match self.process_batch(batch, operation).await {
                Ok(results) => {
                    logger.log_debug(&format!("Batch {} standardized {} records", batch_index + 1, results.len()));
                    outcome.stats.batches_succeeded += 1;
                    outcome.results.extend(results);
                }
                Err(e) => {
                    let message = e.to_string();
                    logger.log_batch_fallback(batch_index, batch.len(), &message);
                    outcome.stats.batches_failed += 1;
                    outcome.stats.fallback_records += batch.len();
                    outcome
                        .results
                        .extend(batch.iter().map(|r| fallback_record(r, operation, &message)));
                }
            }

            progress.report(
                batch_index + 1,
                batches.len(),
                format!("Batch {}/{}", batch_index + 1, batches.len()),
            );
        }

        logger.log_completion(&format!(
            "{} results, {} of {} batches fell back to local processing",
            outcome.results.len(),
            outcome.stats.batches_failed,
            outcome.stats.batches_total
        ));
        outcome
    }

    async fn request_duplicates(&self, chunk: &[CustomerRecord]) -> Result<Vec<ServiceDuplicateGroup>, StandardizationError> {
        let payload: Vec<serde_json::Value> = chunk
            .iter()
            .enumerate()
            .map(|(i, r)| {
                json!({
                    "index": i,
                    "customerName": r.customer_name,
                    "combinedAddress": r.combined_address,
                })
            })
            .collect();
        let groups: Vec<ServiceDuplicateGroup> = self
            .request(Operation::FindDuplicates, json!({ "records": payload }))
            .await?
            .parse_results()?;
        if let Some(bad) = groups
            .iter()
            .flat_map(|g| g.member_indices.iter().chain(std::iter::once(&g.canonical_index)))
            .find(|&&i| i >= chunk.len())
        {
            return Err(StandardizationError::ServiceUnavailable(format!(
                "duplicate group references record {} of a {}-record request",
                bad,
                chunk.len()
            )));
        }
        Ok(groups)
    }

    /// Asks the service for duplicate groups, chunking large inputs.
    ///
    /// Above the chunk threshold, records are sent in chunks and the per-chunk
    /// groups are concatenated; duplicates that span two chunks are not found.
    /// A failed chunk is grouped locally by name similarity instead.
    pub async fn find_duplicates(&self, records: &[CustomerRecord]) -> DuplicateOutcome {
        let logger = DedupLogger::new(PipelineStage::DuplicateFinding);
        let chunk_size = if records.len() > self.config.duplicate_chunk_threshold {
            self.config.duplicate_chunk_size.max(1)
        } else {
            records.len().max(1)
        };
        let chunks: Vec<&[CustomerRecord]> = records.chunks(chunk_size).collect();
        logger.log_batch_processing_start(records.len(), chunk_size);

        let mut outcome = DuplicateOutcome::default();
        outcome.stats.total_records = records.len();
        outcome.stats.batches_total = chunks.len();
        let mut progress = ProgressTracker::new(self.progress.clone());
        progress.report(0, chunks.len(), format!("Finding duplicates among {} records", records.len()));

        let mut assigned: HashSet<usize> = HashSet::new();
        for (chunk_index, chunk) in chunks.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                logger.log_warning(&format!("Cancelled before chunk {}", chunk_index + 1));
                outcome.stats.cancelled = true;
                outcome.cancelled = Some(StandardizationError::Cancelled {
                    completed_batches: chunk_index,
                    total_batches: chunks.len(),
                });
                break;
            }
            let offset = chunk_index * chunk_size;

            let local_groups: Vec<DuplicateGroup> = match self.request_duplicates(chunk).await {
                Ok(groups) => {
                    outcome.stats.batches_succeeded += 1;
                    groups
                        .into_iter()
                        .map(|g| DuplicateGroup {
                            key: g
                                .member_indices
                                .first()
                                .map(|&i| normalize(&chunk[i].customer_name))
                                .unwrap_or_default(),
                            canonical_index: g.canonical_index,
                            member_indices: g.member_indices,
                            confidence: g.confidence.clamp(0.0, 1.0),
                            reasoning: g.reasoning,
                        })
                        .collect()
                }
                Err(e) => {
                    logger.log_batch_fallback(chunk_index, chunk.len(), &e.to_string());
                    outcome.stats.batches_failed += 1;
                    outcome.stats.fallback_records += chunk.len();
                    find_duplicates_locally(chunk)
                }
            };

            for group in local_groups {
                if let Some(group) = offset_group(group, offset, &mut assigned) {
                    outcome.groups.push(group);
                }
            }

            progress.report(
                chunk_index + 1,
                chunks.len(),
                format!("Chunk {}/{}", chunk_index + 1, chunks.len()),
            );
        }

        logger.log_completion(&format!(
            "{} duplicate groups from {} chunks ({} fell back to local matching)",
            outcome.groups.len(),
            outcome.stats.batches_total,
            outcome.stats.batches_failed
        ));
        outcome
    }
}

/// Shifts chunk-relative indices to the full slice and drops members already
/// placed in an earlier group. Groups left with fewer than two members vanish.
fn offset_group(group: DuplicateGroup, offset: usize, assigned: &mut HashSet<usize>) -> Option<DuplicateGroup> {
    let mut seen = HashSet::new();
    let members: Vec<usize> = group
        .member_indices
        .iter()
        .map(|&i| i + offset)
        .filter(|i| !assigned.contains(i) && seen.insert(*i))
        .collect();
    if members.len() < 2 {
        return None;
    }
    let canonical = group.canonical_index + offset;
    let canonical_index = if members.contains(&canonical) {
        canonical
    } else {
        members[0]
    };
    assigned.extend(members.iter().copied());
    Some(DuplicateGroup {
        canonical_index,
        member_indices: members,
        ..group
    })
}

/// Overwrites a record with a standardization result and attaches its metadata.
///
/// Empty fields in the result leave the record's value in place;
/// `combined_address` is recomputed.
pub fn apply_standardization(record: &mut CustomerRecord, result: &StandardizationResult) {
    let fields = [
        (&mut record.customer_name, &result.customer_name),
        (&mut record.address1, &result.address1),
        (&mut record.address2, &result.address2),
        (&mut record.city, &result.city),
        (&mut record.state, &result.state),
        (&mut record.zip, &result.zip),
    ];
    for (target, value) in fields {
        if !value.trim().is_empty() {
            *target = value.trim().to_string();
        }
    }
    record.recompute_combined_address();
    record.standardization = Some(StandardizationMetadata {
        confidence: result.confidence,
        changes: result.changes.clone(),
        business_type: result.business_type.clone(),
        error: result.error.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standardization::client::{HealthState, HealthStatus};
    use std::sync::Mutex;
    use std::time::Duration;

    type Handler = Box<dyn Fn(&ServiceRequest, usize) -> Result<ServiceResponse, StandardizationError> + Send + Sync>;

    struct MockService {
        handler: Handler,
        calls: Mutex<Vec<ServiceRequest>>,
    }

    impl MockService {
        fn new(handler: Handler) -> Self {
            Self {
                handler,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl StandardizationService for MockService {
        async fn call(&self, request: ServiceRequest) -> Result<ServiceResponse, StandardizationError> {
            let call_index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(request.clone());
                calls.len() - 1
            };
            (self.handler)(&request, call_index)
        }

        async fn health_check(&self) -> Result<HealthStatus, StandardizationError> {
            Ok(HealthStatus {
                status: HealthState::Healthy,
                api_configured: true,
            })
        }
    }

    fn fast_config() -> StandardizationConfig {
        StandardizationConfig {
            request_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn records(n: usize) -> Vec<CustomerRecord> {
        (0..n)
            .map(|i| CustomerRecord::new(format!("customer {} llc", i), format!("{} Main St", i), "", "Reno", "NV", "", "Order File"))
            .collect()
    }

    /// Echoes each record back upper-cased.
    fn echo_batch(request: &ServiceRequest) -> Result<ServiceResponse, StandardizationError> {
        let results: Vec<serde_json::Value> = request.data["records"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|r| {
                json!({
                    "customerName": r["customerName"].as_str().unwrap_or_default().to_uppercase(),
                    "address1": r["address1"],
                    "city": r["city"],
                    "state": r["state"],
                    "confidence": 0.95,
                    "changes": ["Upper-cased"],
                })
            })
            .collect();
        Ok(ServiceResponse::ok_results(json!(results)))
    }

    #[tokio::test]
    async fn test_whole_batch_failure_falls_back_per_record() {
        let service = MockService::new(Box::new(|_: &ServiceRequest, _: usize| {
            Err(StandardizationError::ServiceUnavailable("connection refused".to_string()))
        }));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let input = records(25);

        let outcome = orchestrator.standardize_batch(&input, BatchOperation::Full).await;

        assert_eq!(outcome.results.len(), 25);
        assert_eq!(orchestrator.service().call_count(), 1);
        assert_eq!(outcome.stats.batches_failed, 1);
        assert_eq!(outcome.stats.fallback_records, 25);
        for (i, result) in outcome.results.iter().enumerate() {
            assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
            assert_eq!(result.customer_name, format!("Customer {} Llc", i));
            assert_eq!(result.business_type.as_deref(), Some("LLC"));
        }
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_abort_others() {
        let service = MockService::new(Box::new(|request: &ServiceRequest, call_index: usize| {
            if call_index == 1 {
                Ok(ServiceResponse::failure("rate limited"))
            } else {
                echo_batch(request)
            }
        }));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let input = records(60);

        let outcome = orchestrator.standardize_batch(&input, BatchOperation::Names).await;

        assert_eq!(orchestrator.service().call_count(), 3);
        assert_eq!(outcome.results.len(), 60);
        assert_eq!(outcome.stats.batches_succeeded, 2);
        assert_eq!(outcome.stats.batches_failed, 1);
        assert_eq!(outcome.results[0].customer_name, "CUSTOMER 0 LLC");
        assert!(outcome.results[0].error.is_none());
        assert_eq!(outcome.results[30].customer_name, "Customer 30 Llc");
        assert!(outcome.results[30].error.as_deref().unwrap().contains("rate limited"));
        assert_eq!(outcome.results[59].customer_name, "CUSTOMER 59 LLC");
    }

    #[tokio::test]
    async fn test_short_response_treated_as_failure() {
        let service = MockService::new(Box::new(|_: &ServiceRequest, _: usize| Ok(ServiceResponse::ok_results(json!([])))));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let outcome = orchestrator.standardize_batch(&records(3), BatchOperation::Full).await;
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.results[0].error.as_deref().unwrap().contains("expected 3 results"));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_completes() {
        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let service = MockService::new(Box::new(|request: &ServiceRequest, _: usize| echo_batch(request)));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config())
            .with_progress(Arc::new(move |percent: u8, _: String| sink.lock().unwrap().push(percent)));

        orchestrator.standardize_batch(&records(80), BatchOperation::Full).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_cancellation_between_batches() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let service = MockService::new(Box::new(move |request: &ServiceRequest, _: usize| {
            trigger.cancel();
            echo_batch(request)
        }));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config()).with_cancellation(token);

        let outcome = orchestrator.standardize_batch(&records(60), BatchOperation::Full).await;

        assert_eq!(outcome.results.len(), 25);
        assert!(outcome.stats.cancelled);
        assert_eq!(
            outcome.cancelled,
            Some(StandardizationError::Cancelled {
                completed_batches: 1,
                total_batches: 3
            })
        );
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_requests() {
        let service = MockService::new(Box::new(|request: &ServiceRequest, _: usize| echo_batch(request)));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let outcome = orchestrator.standardize_batch(&[], BatchOperation::Full).await;
        assert!(outcome.results.is_empty());
        assert_eq!(orchestrator.service().call_count(), 0);
    }

    #[tokio::test]
    async fn test_request_delay_applied() {
        let service = MockService::new(Box::new(|request: &ServiceRequest, _: usize| echo_batch(request)));
        let config = StandardizationConfig {
            request_delay: Duration::from_millis(20),
            ..Default::default()
        };
        let orchestrator = StandardizationOrchestrator::new(service, config);
        let started = std::time::Instant::now();
        orchestrator.standardize_batch(&records(50), BatchOperation::Full).await;
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_find_duplicates_single_request_under_threshold() {
        let service = MockService::new(Box::new(|_: &ServiceRequest, _: usize| {
            Ok(ServiceResponse::ok_results(json!([
                {"canonicalIndex": 2, "memberIndices": [0, 2], "confidence": 0.9, "reasoning": "same company"}
            ])))
        }));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let outcome = orchestrator.find_duplicates(&records(100)).await;

        assert_eq!(orchestrator.service().call_count(), 1);
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].canonical_index, 2);
        assert_eq!(outcome.groups[0].member_indices, vec![0, 2]);
        assert_eq!(outcome.groups[0].key, "customer 0 llc");
    }

    #[tokio::test]
    async fn test_find_duplicates_chunks_and_offsets() {
        let service = MockService::new(Box::new(|request: &ServiceRequest, _: usize| {
            let len = request.data["records"].as_array().map(|a| a.len()).unwrap_or(0);
            assert!(len <= 50);
            Ok(ServiceResponse::ok_results(json!([
                {"canonicalIndex": 0, "memberIndices": [0, 1], "confidence": 0.8, "reasoning": "pair"}
            ])))
        }));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let outcome = orchestrator.find_duplicates(&records(120)).await;

        assert_eq!(orchestrator.service().call_count(), 3);
        let members: Vec<Vec<usize>> = outcome.groups.iter().map(|g| g.member_indices.clone()).collect();
        assert_eq!(members, vec![vec![0, 1], vec![50, 51], vec![100, 101]]);
    }

    #[tokio::test]
    async fn test_find_duplicates_falls_back_locally() {
        let service = MockService::new(Box::new(|_: &ServiceRequest, _: usize| {
            Err(StandardizationError::ServiceUnavailable("timeout".to_string()))
        }));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let input = vec![
            CustomerRecord::new("Acme Telecom", "", "", "", "", "", "x"),
            CustomerRecord::new("Zenith", "", "", "", "", "", "x"),
            CustomerRecord::new("ACME Telecom", "1 Elm", "", "", "", "", "x"),
        ];
        let outcome = orchestrator.find_duplicates(&input).await;
        assert_eq!(outcome.stats.batches_failed, 1);
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].member_indices, vec![0, 2]);
        assert_eq!(outcome.groups[0].canonical_index, 2);
    }

    #[tokio::test]
    async fn test_find_duplicates_rejects_out_of_range_indices() {
        let service = MockService::new(Box::new(|_: &ServiceRequest, _: usize| {
            Ok(ServiceResponse::ok_results(json!([
                {"canonicalIndex": 0, "memberIndices": [0, 7]}
            ])))
        }));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let distinct = vec![
            CustomerRecord::new("Acme", "1 Elm", "", "", "", "", "x"),
            CustomerRecord::new("Zenith", "2 Oak", "", "", "", "", "x"),
            CustomerRecord::new("Orbit", "3 Pine", "", "", "", "", "x"),
        ];
        let outcome = orchestrator.find_duplicates(&distinct).await;
        assert_eq!(outcome.stats.batches_failed, 1);
        assert!(outcome.groups.is_empty());

        // similar names still group locally once the response is rejected
        let similar = records(3);
        let outcome = orchestrator.find_duplicates(&similar).await;
        assert_eq!(outcome.stats.batches_failed, 1);
        assert_eq!(outcome.groups, find_duplicates_locally(&similar));
        assert_eq!(outcome.groups[0].member_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_offset_group_keeps_membership_exclusive() {
        let mut assigned = HashSet::new();
        let group = |members: Vec<usize>, canonical: usize| DuplicateGroup {
            key: "k".to_string(),
            canonical_index: canonical,
            member_indices: members,
            confidence: 1.0,
            reasoning: String::new(),
        };
        let first = offset_group(group(vec![0, 1, 1], 1), 10, &mut assigned).unwrap();
        assert_eq!(first.member_indices, vec![10, 11]);
        assert_eq!(first.canonical_index, 11);
        assert!(offset_group(group(vec![1, 2], 1), 10, &mut assigned).is_none());
        let third = offset_group(group(vec![1, 2, 3], 1), 10, &mut assigned).unwrap();
        assert_eq!(third.member_indices, vec![12, 13]);
        assert_eq!(third.canonical_index, 12);
    }

    #[tokio::test]
    async fn test_single_operations_fall_back() {
        let service = MockService::new(Box::new(|_: &ServiceRequest, _: usize| Ok(ServiceResponse::failure("quota exceeded"))));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());

        let name = orchestrator.standardize_name("acme INC").await;
        assert_eq!(name.standardized, "Acme Inc");
        assert_eq!(name.error.as_deref(), Some("standardization service unavailable: quota exceeded"));

        let address = orchestrator.standardize_address("1 Elm St, Dayton, OH 45402").await;
        assert_eq!(address.city, "Dayton");
        assert_eq!(address.zip, "45402");

        let comparison = orchestrator.compare_names("Acme Inc", "ACME Inc.").await;
        assert!(comparison.is_same);
        assert!(comparison.error.is_some());
    }

    #[tokio::test]
    async fn test_single_operations_use_service_result() {
        let service = MockService::new(Box::new(|request: &ServiceRequest, _: usize| match request.operation {
            Operation::StandardizeName => Ok(ServiceResponse::ok_result(json!({
                "original": request.data["name"], "standardized": "Acme, Inc.", "confidence": 0.97
            }))),
            Operation::CompareNames => Ok(ServiceResponse::ok_result(json!({
                "isSame": false, "confidence": 0.2
            }))),
            _ => Ok(ServiceResponse::failure("unsupported")),
        }));
        let orchestrator = StandardizationOrchestrator::new(service, fast_config());
        let name = orchestrator.standardize_name("acme inc").await;
        assert_eq!(name.standardized, "Acme, Inc.");
        assert!(name.error.is_none());
        let comparison = orchestrator.compare_names("Acme", "Acme").await;
        assert!(!comparison.is_same);
    }

    #[test]
    fn test_apply_standardization() {
        let mut record = CustomerRecord::new("acme llc", "1 Elm St, Dayton, OH 45402", "", "", "", "", "Order File");
        let result = fallback_record(&record, BatchOperation::Full, "down");
        apply_standardization(&mut record, &result);
        assert_eq!(record.customer_name, "Acme Llc");
        assert_eq!(record.address1, "1 Elm St");
        assert_eq!(record.combined_address, "1 Elm St, Dayton, OH, 45402");
        let meta = record.standardization.as_ref().unwrap();
        assert_eq!(meta.error.as_deref(), Some("down"));
        assert_eq!(meta.business_type.as_deref(), Some("LLC"));
    }
}
