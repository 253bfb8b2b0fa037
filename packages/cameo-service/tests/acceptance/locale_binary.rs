use std::sync::Arc;

use cameo_domain::TargetAudience;
use cameo_service::MatchRequest;
use cameo_testkit::{ScriptedIndex, assignment, creator};

use crate::acceptance::{ServiceBuilder, loaded_cache};

#[tokio::test]
async fn locale_match_is_case_insensitive_and_binary() {
	let catalog = vec![
		creator("x").with_primary_niches(&["travel"]).with_region("ca").build(),
		creator("y").with_primary_niches(&["travel"]).with_region("US").build(),
	];
	let cache = loaded_cache(catalog).await;
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(vec![("y", 0.5), ("x", 0.5)])))
		.build_with_cache(cache);
	let mut brief = assignment("West coast food tour", "Eat local", "Short-form series");

	brief.target_audience =
		Some(TargetAudience { locale: Some("CA".to_string()), demographic: None });

	let response = service
		.match_assignment(MatchRequest { assignment: brief, assignment_id: None })
		.await
		.expect("match must succeed");
	let first = &response.matches[0];
	let second = &response.matches[1];

	assert_eq!(first.creator.id, "x");
	assert_eq!(first.score_breakdown.audience_match, 1.0);
	assert_eq!(second.creator.id, "y");
	assert_eq!(second.score_breakdown.audience_match, 0.0);
}

#[tokio::test]
async fn absent_locale_contributes_nothing() {
	let catalog = vec![creator("x").with_primary_niches(&["travel"]).with_region("ca").build()];
	let cache = loaded_cache(catalog).await;
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(vec![("x", 0.5)])))
		.build_with_cache(cache);
	let response = service
		.match_assignment(MatchRequest {
			assignment: assignment("West coast food tour", "Eat local", "Short-form series"),
			assignment_id: None,
		})
		.await
		.expect("match must succeed");

	assert_eq!(response.matches[0].score_breakdown.audience_match, 0.0);
}
