use std::fmt::Write;

use cameo_domain::{Assignment, CreatorMatch};

/// Returned when the completion provider is unavailable; the ranking
/// itself is unaffected.
pub const FALLBACK_RATIONALE: &str =
	"These creators were selected for topical similarity to the brief and overlap with the \
	 requested niches, values, and audience.";

/// Aggregate reasoning for an empty result set.
pub const NO_MATCHES_REASONING: &str = "no suitable creators found";

/// Build the completion prompt from the brief and the ranked shortlist.
/// The output text is advisory only and never feeds back into ranking.
pub fn rationale_prompt(assignment: &Assignment, matches: &[CreatorMatch]) -> String {
	let mut prompt = String::with_capacity(1_024);

	let _ = writeln!(
		prompt,
		"You help a marketing team pick content creators. Explain in two or three sentences \
		 why the creators below fit this brief. Mention concrete overlaps; do not invent facts."
	);
	let _ = writeln!(prompt, "\nBrief:");
	let _ = writeln!(prompt, "- Topic: {}", assignment.topic.trim());
	let _ = writeln!(prompt, "- Key takeaway: {}", assignment.key_takeaway.trim());
	let _ = writeln!(prompt, "- Context: {}", assignment.additional_context.trim());

	if !assignment.creator_niches.is_empty() {
		let _ = writeln!(prompt, "- Requested niches: {}", assignment.creator_niches.join(", "));
	}
	if !assignment.creator_values.is_empty() {
		let _ = writeln!(prompt, "- Requested values: {}", assignment.creator_values.join(", "));
	}
	if let Some(locale) =
		assignment.target_audience.as_ref().and_then(|audience| audience.locale.as_deref())
	{
		let _ = writeln!(prompt, "- Target locale: {locale}");
	}

	let _ = writeln!(prompt, "\nSelected creators:");

	for (position, entry) in matches.iter().enumerate() {
		let niches = entry.creator.analysis.primary_niches.join(", ");
		let _ = writeln!(
			prompt,
			"{}. {} (niches: {niches}; score {:.4})",
			position + 1,
			entry.creator.nickname,
			entry.match_score
		);

		let summary = entry.creator.analysis.summary.trim();

		if !summary.is_empty() {
			let _ = writeln!(prompt, "   {summary}");
		}
	}

	prompt
}

/// The brief text that gets embedded: the three description fields joined
/// by single spaces, with structured filters appended only when enabled.
pub fn brief_text(assignment: &Assignment, include_filters: bool) -> String {
	let mut text = format!(
		"{} {} {}",
		assignment.topic.trim(),
		assignment.key_takeaway.trim(),
		assignment.additional_context.trim()
	);

	if include_filters {
		if !assignment.creator_niches.is_empty() {
			text.push_str(" Niches: ");
			text.push_str(&assignment.creator_niches.join(", "));
		}
		if !assignment.creator_values.is_empty() {
			text.push_str(" Values: ");
			text.push_str(&assignment.creator_values.join(", "));
		}
		if let Some(tone) = assignment.tone_style.as_deref().map(str::trim)
			&& !tone.is_empty()
		{
			text.push_str(" Tone: ");
			text.push_str(tone);
		}
	}

	text
}
