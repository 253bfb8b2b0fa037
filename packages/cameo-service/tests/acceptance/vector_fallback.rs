use std::sync::Arc;

use cameo_service::{Error, rationale};
use cameo_testkit::{ScriptedEmbedding, ScriptedIndex, sample_catalog};

use crate::acceptance::{
	ServiceBuilder, TEST_VECTOR, empty_cache, loaded_cache, never_loaded_cache, request,
};

#[tokio::test]
async fn vector_outage_degrades_to_rule_only_ranking() {
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::always_unavailable()))
		.build()
		.await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");

	assert!(response.is_fallback);
	// Catalog has 4 creators; K = 3.
	assert_eq!(response.matches.len(), 3);

	for entry in &response.matches {
		assert_eq!(entry.score_breakdown.semantic_similarity, 0.5);
	}

	assert_eq!(service.metrics().fallback_responses(), 1);
}

#[tokio::test]
async fn embedding_outage_also_triggers_fallback() {
	let embedding = Arc::new(ScriptedEmbedding::scripted(
		vec![
			cameo_testkit::EmbeddingStep::Unavailable,
			cameo_testkit::EmbeddingStep::Unavailable,
			cameo_testkit::EmbeddingStep::Unavailable,
		],
		TEST_VECTOR.to_vec(),
	));
	let index = Arc::new(ScriptedIndex::returning(vec![("mm", 0.9)]));
	let service = ServiceBuilder::new()
		.with_embedding(embedding.clone())
		.with_index(index.clone())
		.build()
		.await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");

	assert!(response.is_fallback);
	// The embedding terminal failure consumed the retry budget; the vector
	// index was never queried.
	assert_eq!(embedding.calls(), 3);
	assert_eq!(index.query_calls(), 0);
}

#[tokio::test]
async fn fallback_with_an_unloaded_catalog_is_a_hard_failure() {
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::always_unavailable()))
		.build_with_cache(never_loaded_cache());
	let err = service
		.match_assignment(request("Investing 101"))
		.await
		.expect_err("no catalog and no vectors must fail");

	match err {
		Error::DependencyUnavailable { dependency, .. } => assert_eq!(dependency, "catalog"),
		other => panic!("Unexpected error: {other}"),
	}
}

#[tokio::test]
async fn empty_catalog_yields_an_empty_success() {
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(Vec::new())))
		.build_with_cache(empty_cache().await);
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");

	assert!(!response.is_fallback);
	assert!(response.matches.is_empty());
	assert_eq!(response.reasoning.as_deref(), Some(rationale::NO_MATCHES_REASONING));
}

#[tokio::test]
async fn fallback_ranking_uses_rule_components() {
	use cameo_service::MatchRequest;
	use cameo_testkit::assignment;

	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::always_unavailable()))
		.build_with_cache(loaded_cache(sample_catalog()).await);
	let mut brief = assignment("Classroom money habits", "Budgeting is a skill", "For teens");

	brief.creator_niches = vec!["Budgeting".to_string()];

	let response = service
		.match_assignment(MatchRequest { assignment: brief, assignment_id: None })
		.await
		.expect("match must succeed");

	// cc is the only budgeting creator; with semantics neutral the niche
	// key puts it first.
	assert!(response.is_fallback);
	assert_eq!(response.matches[0].creator.id, "cc");
	assert_eq!(response.matches[0].score_breakdown.niche_alignment, 1);
}
