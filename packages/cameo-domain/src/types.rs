use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A content brief. Immutable for the duration of a match call.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
	pub topic: String,
	pub key_takeaway: String,
	pub additional_context: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_audience: Option<TargetAudience>,
	#[serde(default)]
	pub creator_niches: Vec<String>,
	#[serde(default)]
	pub creator_values: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tone_style: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub locale: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub demographic: Option<String>,
}

/// A catalog entry. Tag fields are normalized to lower case at ingest.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
	pub id: String,
	pub nickname: String,
	pub bio: String,
	pub follower_count: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub heart_count: Option<u64>,
	pub region: String,
	pub analysis: CreatorAnalysis,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorAnalysis {
	pub primary_niches: Vec<String>,
	#[serde(default)]
	pub secondary_niches: Vec<String>,
	#[serde(default)]
	pub apparent_values: Vec<String>,
	#[serde(default)]
	pub audience_interests: Vec<String>,
	#[serde(default)]
	pub tone: Vec<String>,
	#[serde(default)]
	pub summary: String,
}

/// A creator proposed by the vector index, before scoring. Created per
/// query and discarded once the match is built.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
	pub creator_id: String,
	pub semantic_score: f64,
}

/// Per-component explanation of a composite score. Every field is
/// populated even when its contributing input is absent.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
	pub semantic_similarity: f64,
	pub niche_alignment: u32,
	pub audience_match: f64,
	pub value_alignment: f64,
	pub niche_boost: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorMatch {
	pub creator: Creator,
	pub match_score: f64,
	pub score_breakdown: ScoreBreakdown,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reasoning: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
	pub assignment: Assignment,
	pub matches: Vec<CreatorMatch>,
	pub reasoning: Option<String>,
	pub is_fallback: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}
