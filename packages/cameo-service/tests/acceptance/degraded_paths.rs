use std::{sync::Arc, time::Duration};

use cameo_resilience::OverallStatus;
use cameo_service::{Error, MatchRequest, rationale};
use cameo_testkit::{
	CompletionStep, RecordingSink, ScriptedCompletion, assignment, test_config,
};

use crate::acceptance::{ServiceBuilder, SlowEmbedding, request};

#[tokio::test]
async fn completion_failure_substitutes_the_canned_rationale() {
	let completion = Arc::new(ScriptedCompletion::scripted(
		vec![
			CompletionStep::Unavailable,
			CompletionStep::Unavailable,
			CompletionStep::Unavailable,
		],
		"unused",
	));
	let service = ServiceBuilder::new().with_completion(completion).build().await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");

	assert!(!response.is_fallback);
	assert_eq!(response.matches.len(), 3);
	assert_eq!(response.reasoning.as_deref(), Some(rationale::FALLBACK_RATIONALE));
}

#[tokio::test]
async fn open_completion_breaker_degrades_health_but_not_matching() {
	let mut cfg = test_config();

	cfg.resilience.failure_threshold = 1;

	let completion = Arc::new(ScriptedCompletion::scripted(
		vec![CompletionStep::Unavailable, CompletionStep::Unavailable, CompletionStep::Unavailable],
		"unused",
	));
	let service =
		ServiceBuilder::new().with_cfg(cfg).with_completion(completion).build().await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");

	assert_eq!(response.matches.len(), 3);
	assert_eq!(service.health().status, OverallStatus::Degraded);
}

#[tokio::test]
async fn persistence_failure_never_fails_the_response() {
	let sink = Arc::new(RecordingSink::failing());
	let service = ServiceBuilder::new().with_sink(sink).build().await;
	let response = service
		.match_assignment(MatchRequest {
			assignment: assignment("Investing 101", "Save more", "Teen audience"),
			assignment_id: Some("assignment-9".to_string()),
		})
		.await
		.expect("match must succeed despite the sink");

	assert_eq!(response.matches.len(), 3);
}

#[tokio::test]
async fn request_deadline_bounds_the_whole_pipeline() {
	let mut cfg = test_config();

	cfg.matching.request_deadline_ms = 50;

	let service = ServiceBuilder::new()
		.with_cfg(cfg)
		.with_embedding(Arc::new(SlowEmbedding { delay: Duration::from_millis(300) }))
		.build()
		.await;
	let err = service
		.match_assignment(request("Investing 101"))
		.await
		.expect_err("slow pipeline must hit the request deadline");

	assert!(matches!(err, Error::DeadlineExceeded { timeout_ms: 50 }));
}
