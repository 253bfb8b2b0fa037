use std::sync::Arc;

use cameo_domain::scoring::round4;
use cameo_service::MatchRequest;
use cameo_testkit::{ScriptedIndex, assignment, creator};

use crate::acceptance::{ServiceBuilder, loaded_cache};

#[tokio::test]
async fn niche_count_dominates_equal_semantic_scores() {
	let catalog = vec![
		creator("a").with_primary_niches(&["home improvement", "diy"]).build(),
		creator("b").with_primary_niches(&["diy"]).build(),
		creator("c").with_primary_niches(&["cooking"]).build(),
	];
	let cache = loaded_cache(catalog).await;
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(vec![
			("c", 0.5),
			("b", 0.5),
			("a", 0.5),
		])))
		.build_with_cache(cache);
	let mut brief = assignment("Weekend workshop refresh", "Anyone can renovate", "Spring push");

	brief.creator_niches = vec!["Home Improvement".to_string(), "DIY".to_string()];

	let response = service
		.match_assignment(MatchRequest { assignment: brief, assignment_id: None })
		.await
		.expect("match must succeed");
	let ids: Vec<&str> =
		response.matches.iter().map(|entry| entry.creator.id.as_str()).collect();

	assert_eq!(ids, vec!["a", "b", "c"]);
	assert_eq!(response.matches[0].score_breakdown.niche_alignment, 2);
	assert_eq!(response.matches[0].score_breakdown.niche_boost, 1.0);
	assert_eq!(response.matches[1].score_breakdown.niche_boost, round4(0.5_f64.sqrt()));
	assert_eq!(response.matches[2].score_breakdown.niche_boost, 0.0);
}

#[tokio::test]
async fn secondary_niches_count_toward_alignment() {
	let catalog = vec![
		creator("a")
			.with_primary_niches(&["lifestyle"])
			.with_secondary_niches(&["diy"])
			.build(),
		creator("b").with_primary_niches(&["lifestyle"]).build(),
	];
	let cache = loaded_cache(catalog).await;
	let service = ServiceBuilder::new()
		.with_index(Arc::new(ScriptedIndex::returning(vec![("b", 0.5), ("a", 0.5)])))
		.build_with_cache(cache);
	let mut brief = assignment("Weekend workshop refresh", "Anyone can renovate", "Spring push");

	brief.creator_niches = vec!["DIY".to_string()];

	let response = service
		.match_assignment(MatchRequest { assignment: brief, assignment_id: None })
		.await
		.expect("match must succeed");

	assert_eq!(response.matches[0].creator.id, "a");
	assert_eq!(response.matches[0].score_breakdown.niche_alignment, 1);
	assert_eq!(response.matches[1].score_breakdown.niche_alignment, 0);
}
