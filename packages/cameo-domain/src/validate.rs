use crate::Assignment;

const MAX_TOPIC_CHARS: usize = 200;
const MAX_TAKEAWAY_CHARS: usize = 2_000;
const MAX_CONTEXT_CHARS: usize = 4_000;
const MAX_LOCALE_CHARS: usize = 16;
const MAX_TONE_CHARS: usize = 100;
const MAX_TAG_CHARS: usize = 64;
const MAX_TAGS: usize = 32;

/// Check an assignment before any downstream call. Returns the wire names
/// of the offending fields; empty means valid.
pub fn validate_assignment(assignment: &Assignment) -> Vec<String> {
	let mut fields = Vec::new();

	if !within(&assignment.topic, MAX_TOPIC_CHARS) {
		fields.push("topic".to_string());
	}
	if !within(&assignment.key_takeaway, MAX_TAKEAWAY_CHARS) {
		fields.push("keyTakeaway".to_string());
	}
	if !within(&assignment.additional_context, MAX_CONTEXT_CHARS) {
		fields.push("additionalContext".to_string());
	}
	if let Some(audience) = assignment.target_audience.as_ref() {
		if let Some(locale) = audience.locale.as_deref()
			&& !within(locale, MAX_LOCALE_CHARS)
		{
			fields.push("targetAudience.locale".to_string());
		}
		if let Some(demographic) = audience.demographic.as_deref()
			&& demographic.trim().is_empty()
		{
			fields.push("targetAudience.demographic".to_string());
		}
	}
	if !tags_valid(&assignment.creator_niches) {
		fields.push("creatorNiches".to_string());
	}
	if !tags_valid(&assignment.creator_values) {
		fields.push("creatorValues".to_string());
	}
	if let Some(tone) = assignment.tone_style.as_deref()
		&& !within(tone, MAX_TONE_CHARS)
	{
		fields.push("toneStyle".to_string());
	}

	fields
}

fn within(text: &str, max_chars: usize) -> bool {
	let trimmed = text.trim();

	!trimmed.is_empty() && trimmed.chars().count() <= max_chars
}

fn tags_valid(tags: &[String]) -> bool {
	tags.len() <= MAX_TAGS && tags.iter().all(|tag| within(tag, MAX_TAG_CHARS))
}
