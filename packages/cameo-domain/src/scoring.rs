use std::collections::HashSet;

use cameo_config::ScoreWeights;

use crate::{Assignment, Creator, CreatorMatch, ScoreBreakdown};

/// Build a match for one candidate. Pure: no I/O, no clocks, no
/// randomness; identical inputs yield a bitwise-identical breakdown.
///
/// `semantic_score` is a raw cosine in [-1, 1]; non-finite values are
/// treated as a neutral 0 cosine.
pub fn score_creator(
	assignment: &Assignment,
	creator: &Creator,
	semantic_score: f64,
	weights: &ScoreWeights,
) -> CreatorMatch {
	let cosine = if semantic_score.is_finite() { semantic_score.clamp(-1.0, 1.0) } else { 0.0 };
	let semantic_similarity = (cosine + 1.0) / 2.0;

	let wanted_niches = fold_tags(&assignment.creator_niches);
	let creator_niches = {
		let mut tags = fold_tags(&creator.analysis.primary_niches);

		tags.extend(fold_tags(&creator.analysis.secondary_niches));

		tags
	};
	let niche_alignment = wanted_niches.intersection(&creator_niches).count() as u32;
	let niche_match_ratio = niche_alignment as f64 / wanted_niches.len().max(1) as f64;
	let niche_boost = niche_match_ratio.sqrt();

	let audience_match = match assignment.target_audience.as_ref().and_then(|audience| {
		audience.locale.as_deref().map(str::trim).filter(|locale| !locale.is_empty())
	}) {
		Some(locale) if locale.eq_ignore_ascii_case(creator.region.trim()) => 1.0,
		_ => 0.0,
	};

	let wanted_values = fold_tags(&assignment.creator_values);
	let value_alignment = if wanted_values.is_empty() {
		0.0
	} else {
		let matched =
			wanted_values.intersection(&fold_tags(&creator.analysis.apparent_values)).count();

		matched as f64 / wanted_values.len() as f64
	};

	let base = weights.semantic * semantic_similarity
		+ weights.niche * niche_match_ratio
		+ weights.audience * audience_match
		+ weights.value * value_alignment;
	let match_score = (base * (1.0 + niche_boost)).min(1.0);

	CreatorMatch {
		creator: creator.clone(),
		match_score: round4(match_score.clamp(0.0, 1.0)),
		score_breakdown: ScoreBreakdown {
			semantic_similarity: round4(semantic_similarity),
			niche_alignment,
			audience_match,
			value_alignment: round4(value_alignment),
			niche_boost: round4(niche_boost.clamp(0.0, 1.0)),
		},
		reasoning: None,
	}
}

fn fold_tags(tags: &[String]) -> HashSet<String> {
	tags.iter()
		.map(|tag| tag.trim().to_lowercase())
		.filter(|tag| !tag.is_empty())
		.collect()
}

/// Round to four decimals for stable equality across runs.
pub fn round4(value: f64) -> f64 {
	(value * 10_000.0).round() / 10_000.0
}
