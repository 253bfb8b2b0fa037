use std::cmp::Ordering;

use crate::{Creator, CreatorMatch};

/// Tolerance under which two semantic similarities are considered equal.
const SEMANTIC_EPSILON: f64 = 0.01;
/// Tolerance under which two composite scores are considered equal.
const SCORE_EPSILON: f64 = 0.001;

/// Sort matches into the five-key total order, best first. The sort is
/// stable, so elements that tie on every key keep their input order; the
/// input order is the vector-query order, which makes the final ranking
/// independent of scoring completion order.
pub fn rank(mut matches: Vec<CreatorMatch>) -> Vec<CreatorMatch> {
	matches.sort_by(rank_cmp);

	matches
}

/// The total order over matches: niche alignment count, then semantic
/// similarity (±0.01), then composite score (±0.001), then engagement
/// ratio, then follower count, all descending.
pub fn rank_cmp(left: &CreatorMatch, right: &CreatorMatch) -> Ordering {
	right
		.score_breakdown
		.niche_alignment
		.cmp(&left.score_breakdown.niche_alignment)
		.then_with(|| {
			cmp_desc_with_tolerance(
				left.score_breakdown.semantic_similarity,
				right.score_breakdown.semantic_similarity,
				SEMANTIC_EPSILON,
			)
		})
		.then_with(|| cmp_desc_with_tolerance(left.match_score, right.match_score, SCORE_EPSILON))
		.then_with(|| {
			cmp_f64_desc(engagement_ratio(&left.creator), engagement_ratio(&right.creator))
		})
		.then_with(|| right.creator.follower_count.cmp(&left.creator.follower_count))
}

/// Hearts per follower, the engagement proxy used as a tie-break.
pub fn engagement_ratio(creator: &Creator) -> f64 {
	creator.heart_count.unwrap_or(0) as f64 / creator.follower_count.max(1) as f64
}

fn cmp_desc_with_tolerance(left: f64, right: f64, epsilon: f64) -> Ordering {
	if (left - right).abs() <= epsilon {
		return Ordering::Equal;
	}

	cmp_f64_desc(left, right)
}

fn cmp_f64_desc(left: f64, right: f64) -> Ordering {
	match (left.is_nan(), right.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
	}
}
