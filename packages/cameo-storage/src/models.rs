use serde_json::Value;

use cameo_domain::{Creator, CreatorAnalysis};

use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
pub struct CreatorRow {
	pub id: String,
	pub nickname: String,
	pub bio: String,
	pub follower_count: i64,
	pub heart_count: Option<i64>,
	pub region: String,
	pub analysis: Value,
}
impl CreatorRow {
	/// Map a stored row into the domain model. Negative counters are
	/// clamped to zero rather than rejecting the row.
	pub fn into_creator(self) -> Result<Creator> {
		let analysis: CreatorAnalysis =
			serde_json::from_value(self.analysis).map_err(|err| Error::InvalidRecord {
				message: format!("Creator {} has a malformed analysis column: {err}.", self.id),
			})?;

		if analysis.primary_niches.is_empty() {
			return Err(Error::InvalidRecord {
				message: format!("Creator {} has no primary niches.", self.id),
			});
		}

		Ok(Creator {
			id: self.id,
			nickname: self.nickname,
			bio: self.bio,
			follower_count: self.follower_count.max(0) as u64,
			heart_count: self.heart_count.map(|hearts| hearts.max(0) as u64),
			region: self.region,
			analysis,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row(analysis: Value) -> CreatorRow {
		CreatorRow {
			id: "mm".to_string(),
			nickname: "@moneymaven".to_string(),
			bio: "Personal finance, simplified.".to_string(),
			follower_count: 120_000,
			heart_count: Some(9_000),
			region: "US".to_string(),
			analysis,
		}
	}

	#[test]
	fn maps_a_complete_row() {
		let creator = row(serde_json::json!({
			"primaryNiches": ["finance"],
			"secondaryNiches": ["education"],
			"apparentValues": ["transparency"],
			"audienceInterests": ["investing"],
			"tone": ["direct"],
			"summary": "Explains money without jargon."
		}))
		.into_creator()
		.expect("complete row must map");

		assert_eq!(creator.id, "mm");
		assert_eq!(creator.analysis.primary_niches, vec!["finance".to_string()]);
		assert_eq!(creator.heart_count, Some(9_000));
	}

	#[test]
	fn clamps_negative_counters() {
		let mut negative = row(serde_json::json!({ "primaryNiches": ["finance"] }));

		negative.follower_count = -5;
		negative.heart_count = Some(-1);

		let creator = negative.into_creator().expect("row must map");

		assert_eq!(creator.follower_count, 0);
		assert_eq!(creator.heart_count, Some(0));
	}

	#[test]
	fn rejects_missing_primary_niches() {
		let err = row(serde_json::json!({ "primaryNiches": [] }))
			.into_creator()
			.expect_err("empty primary niches must fail");

		assert!(matches!(err, Error::InvalidRecord { .. }));
	}
}
