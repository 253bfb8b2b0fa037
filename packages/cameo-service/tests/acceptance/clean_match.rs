use std::sync::Arc;

use cameo_domain::ranking::rank_cmp;
use cameo_service::MatchRequest;
use cameo_testkit::{RecordingSink, ScriptedIndex, assignment, creator, sample_catalog};

use crate::acceptance::{ServiceBuilder, loaded_cache, request};

#[tokio::test]
async fn clean_semantic_match_returns_the_top_three_in_score_order() {
	let service = ServiceBuilder::new().build().await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");

	assert!(!response.is_fallback);
	assert_eq!(response.matches.len(), 3);

	let ids: Vec<&str> =
		response.matches.iter().map(|entry| entry.creator.id.as_str()).collect();

	assert_eq!(ids, vec!["mm", "md", "cc"]);

	for entry in &response.matches {
		assert_eq!(entry.score_breakdown.niche_alignment, 0);
		assert!((0.0..=1.0).contains(&entry.match_score));
	}
	for pair in response.matches.windows(2) {
		assert_ne!(rank_cmp(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
		assert!(pair[0].match_score >= pair[1].match_score);
	}

	assert_eq!(response.reasoning.as_deref(), Some("A strong topical fit."));
}

#[tokio::test]
async fn result_count_is_bounded_by_the_candidate_pool() {
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(vec![("mm", 0.9), ("md", 0.8)])))
		.build()
		.await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");

	assert_eq!(response.matches.len(), 2);
}

#[tokio::test]
async fn stale_vectors_without_catalog_entries_are_dropped() {
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(vec![
			("zz", 0.99),
			("mm", 0.9),
			("md", 0.8),
		])))
		.build()
		.await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");
	let ids: Vec<&str> =
		response.matches.iter().map(|entry| entry.creator.id.as_str()).collect();

	assert_eq!(ids, vec!["mm", "md"]);
}

#[tokio::test]
async fn engagement_ratio_breaks_otherwise_tied_candidates() {
	let catalog = vec![
		creator("q").with_primary_niches(&["finance"]).with_followers(10_000).with_hearts(500).build(),
		creator("p").with_primary_niches(&["finance"]).with_followers(10_000).with_hearts(1_000).build(),
	];
	let cache = loaded_cache(catalog).await;
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(vec![("q", 0.80), ("p", 0.801)])))
		.build_with_cache(cache);
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");
	let ids: Vec<&str> =
		response.matches.iter().map(|entry| entry.creator.id.as_str()).collect();

	assert_eq!(ids, vec!["p", "q"]);
}

#[tokio::test]
async fn matches_are_persisted_when_an_assignment_id_is_supplied() {
	let sink = Arc::new(RecordingSink::default());
	let service = ServiceBuilder::new().with_sink(sink.clone()).build().await;
	let response = service
		.match_assignment(MatchRequest {
			assignment: assignment("Investing 101", "Save more", "Teen audience"),
			assignment_id: Some("assignment-7".to_string()),
		})
		.await
		.expect("match must succeed");

	assert_eq!(response.matches.len(), 3);
	assert_eq!(sink.persisted(), vec![("assignment-7".to_string(), 3)]);
}

#[tokio::test]
async fn nothing_is_persisted_without_an_assignment_id() {
	let sink = Arc::new(RecordingSink::default());
	let service = ServiceBuilder::new().with_sink(sink.clone()).build().await;

	service.match_assignment(request("Investing 101")).await.expect("match must succeed");

	assert!(sink.persisted().is_empty());
}

#[tokio::test]
async fn non_finite_semantic_scores_are_neutralized_and_counted() {
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(vec![("mm", f64::NAN), ("md", 0.8)])))
		.build()
		.await;
	let response =
		service.match_assignment(request("Investing 101")).await.expect("match must succeed");
	let neutral = response
		.matches
		.iter()
		.find(|entry| entry.creator.id == "mm")
		.expect("mm must still be scored");

	assert_eq!(neutral.score_breakdown.semantic_similarity, 0.5);
	assert_eq!(service.metrics().scoring_warnings(), 1);
}

#[tokio::test]
async fn invalid_assignment_fails_before_any_downstream_call() {
	let index = Arc::new(ScriptedIndex::returning(vec![("mm", 0.9)]));
	let service = ServiceBuilder::new()
		.with_index(index.clone())
		.build_with_cache(loaded_cache(sample_catalog()).await);
	let err = service
		.match_assignment(MatchRequest {
			assignment: assignment("", "Save more", "Teen audience"),
			assignment_id: None,
		})
		.await
		.expect_err("blank topic must fail validation");

	match err {
		cameo_service::Error::Validation { fields } => {
			assert_eq!(fields, vec!["topic".to_string()]);
		},
		other => panic!("Unexpected error: {other}"),
	}

	assert_eq!(index.query_calls(), 0);
}
