use std::{sync::Arc, time::Duration};

use cameo_config::Retry;
use cameo_resilience::{BreakerState, OverallStatus};
use cameo_testkit::{IndexStep, ScriptedIndex, test_config};

use crate::acceptance::{ServiceBuilder, request};

fn breaker_state(service: &cameo_service::MatchService, name: &str) -> BreakerState {
	service
		.health()
		.dependencies
		.into_iter()
		.find(|dependency| dependency.name == name)
		.map(|dependency| dependency.state)
		.expect("dependency must be reported")
}

#[tokio::test]
async fn vector_breaker_opens_short_circuits_and_recovers_through_a_probe() {
	let mut cfg = test_config();

	cfg.resilience.failure_threshold = 2;
	cfg.resilience.reset_ms = 50;
	cfg.resilience.retry = Retry { max_attempts: 1, base_delay_ms: 1, max_delay_ms: 2 };

	let index = Arc::new(ScriptedIndex::scripted(
		vec![IndexStep::Unavailable, IndexStep::Unavailable],
		vec![("mm", 0.90), ("md", 0.85), ("cc", 0.80)],
	));
	let service =
		ServiceBuilder::new().with_cfg(cfg).with_index(index.clone()).build().await;

	// Two terminal failures trip the breaker; both requests degrade.
	for _ in 0..2 {
		let response = service
			.match_assignment(request("Investing 101"))
			.await
			.expect("fallback must succeed");

		assert!(response.is_fallback);
	}

	assert_eq!(breaker_state(&service, "vector-index"), BreakerState::Open);
	assert_eq!(service.health().status, OverallStatus::Critical);

	// Inside the open window the index is not even consulted.
	let short_circuited = service
		.match_assignment(request("Investing 101"))
		.await
		.expect("fallback must succeed");

	assert!(short_circuited.is_fallback);
	assert_eq!(index.query_calls(), 2);

	tokio::time::sleep(Duration::from_millis(70)).await;

	assert_eq!(breaker_state(&service, "vector-index"), BreakerState::HalfOpen);

	// The half-open probe succeeds and the vector path comes back.
	let recovered = service
		.match_assignment(request("Investing 101"))
		.await
		.expect("probe request must succeed");

	assert!(!recovered.is_fallback);
	assert_eq!(recovered.matches.len(), 3);
	assert_eq!(index.query_calls(), 3);
	assert_eq!(breaker_state(&service, "vector-index"), BreakerState::Closed);
	// Recent fallbacks keep health degraded even though the breaker closed.
	assert_eq!(service.health().status, OverallStatus::Degraded);
}

#[tokio::test]
async fn open_embedding_breaker_reports_critical() {
	let mut cfg = test_config();

	cfg.resilience.failure_threshold = 1;
	cfg.resilience.retry = Retry { max_attempts: 1, base_delay_ms: 1, max_delay_ms: 2 };

	let embedding = Arc::new(cameo_testkit::ScriptedEmbedding::scripted(
		vec![cameo_testkit::EmbeddingStep::Unavailable],
		crate::acceptance::TEST_VECTOR.to_vec(),
	));
	let service =
		ServiceBuilder::new().with_cfg(cfg).with_embedding(embedding).build().await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("must degrade");

	assert!(response.is_fallback);
	assert_eq!(breaker_state(&service, "embedding"), BreakerState::Open);
	assert_eq!(service.health().status, OverallStatus::Critical);
}
