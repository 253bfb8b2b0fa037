use std::{sync::Arc, time::Duration};

use futures::{StreamExt, stream};
use serde::Deserialize;
use time::OffsetDateTime;

use cameo_domain::{
	Assignment, Candidate, CreatorMatch, MatchResponse, ranking, scoring,
	validate::validate_assignment,
};
use cameo_storage::index::{IndexHit, VectorIndex};

use crate::{
	CompletionProvider, EmbeddingProvider, Error, MatchService, MatchSink, Result,
	catalog_cache::CatalogSnapshot, rationale,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
	pub assignment: Assignment,
	#[serde(default)]
	pub assignment_id: Option<String>,
}

impl MatchService {
	/// Run the whole match pipeline under the request deadline.
	pub async fn match_assignment(&self, request: MatchRequest) -> Result<MatchResponse> {
		let timeout_ms = self.cfg.matching.request_deadline_ms;
		let deadline = Duration::from_millis(timeout_ms);

		match tokio::time::timeout(deadline, self.match_inner(request)).await {
			Ok(result) => result,
			Err(_) => Err(Error::DeadlineExceeded { timeout_ms }),
		}
	}

	async fn match_inner(&self, request: MatchRequest) -> Result<MatchResponse> {
		let MatchRequest { assignment, assignment_id } = request;
		let fields = validate_assignment(&assignment);

		if !fields.is_empty() {
			return Err(Error::Validation { fields });
		}

		// Both the semantic join and the rule-only fallback need creators;
		// without any snapshot the request cannot degrade gracefully.
		let Some(snapshot) = self.catalog.snapshot() else {
			return Err(Error::DependencyUnavailable {
				dependency: "catalog",
				message: "The creator catalog has not loaded yet.".to_string(),
				retry_after: Some(Duration::from_secs(5)),
			});
		};

		let text = rationale::brief_text(&assignment, self.cfg.matching.embed_filters);
		let (candidates, is_fallback) = self.gather_candidates(&text, &snapshot).await;

		if is_fallback {
			self.metrics.note_fallback();
			self.health.record_fallback();
		}

		let timestamp = OffsetDateTime::now_utc();

		if candidates.is_empty() {
			return Ok(MatchResponse {
				assignment,
				matches: Vec::new(),
				reasoning: Some(rationale::NO_MATCHES_REASONING.to_string()),
				is_fallback,
				timestamp,
			});
		}

		let scored = self.score_candidates(&assignment, candidates, &snapshot).await;
		let ranked = ranking::rank(scored);
		let matches: Vec<CreatorMatch> =
			ranked.into_iter().take(self.cfg.matching.top_k as usize).collect();
		let reasoning = self.generate_rationale(&assignment, &matches).await;

		if let Some(assignment_id) = assignment_id.as_deref() {
			self.persist(assignment_id, &matches).await;
		}

		Ok(MatchResponse {
			assignment,
			matches,
			reasoning: Some(reasoning),
			is_fallback,
			timestamp,
		})
	}

	/// Embed the brief and query the index. Any terminal failure on that
	/// path degrades to rule-only ranking over the whole catalog with a
	/// neutral semantic score.
	async fn gather_candidates(
		&self,
		text: &str,
		snapshot: &Arc<CatalogSnapshot>,
	) -> (Vec<Candidate>, bool) {
		match self.semantic_candidates(text).await {
			Ok(hits) => {
				let candidates = hits
					.into_iter()
					.filter(|hit| {
						let known = snapshot.get(&hit.creator_id).is_some();

						if !known {
							tracing::debug!(
								creator_id = %hit.creator_id,
								"Dropping stale vector with no catalog entry."
							);
						}

						known
					})
					.map(|hit| Candidate {
						creator_id: hit.creator_id,
						semantic_score: hit.score,
					})
					.collect();

				(candidates, false)
			},
			Err(reason) => {
				tracing::warn!(
					error = %reason,
					"Semantic path failed; degrading to rule-only ranking."
				);

				let candidates = snapshot
					.all()
					.iter()
					.map(|creator| Candidate {
						creator_id: creator.id.clone(),
						semantic_score: 0.0,
					})
					.collect();

				(candidates, true)
			},
		}
	}

	async fn semantic_candidates(&self, text: &str) -> std::result::Result<Vec<IndexHit>, String> {
		let embedding_cfg = &self.cfg.providers.embedding;
		let vector = self
			.embedding_shield
			.call(|| self.collaborators.embedding.embed(embedding_cfg, text))
			.await
			.map_err(|err| err.to_string())?;
		let hits = self
			.vector_shield
			.call(|| self.index.query(&vector, self.cfg.matching.query_top_k, None))
			.await
			.map_err(|err| err.to_string())?;

		Ok(hits)
	}

	/// Score candidates with bounded fan-out. `buffered` keeps output in
	/// input order, so concurrent completion can never perturb the stable
	/// ranking downstream.
	async fn score_candidates(
		&self,
		assignment: &Assignment,
		candidates: Vec<Candidate>,
		snapshot: &Arc<CatalogSnapshot>,
	) -> Vec<CreatorMatch> {
		let parallelism = self.cfg.matching.scoring_parallelism.min(candidates.len()).max(1);
		let weights = self.cfg.matching.weights;

		stream::iter(candidates)
			.map(|candidate| {
				let snapshot = snapshot.clone();

				async move {
					let creator = snapshot.get(&candidate.creator_id)?;
					let semantic = if candidate.semantic_score.is_finite() {
						candidate.semantic_score
					} else {
						self.metrics.note_scoring_warning();

						0.0
					};

					Some(scoring::score_creator(assignment, &creator, semantic, &weights))
				}
			})
			.buffered(parallelism)
			.filter_map(|scored| async move { scored })
			.collect()
			.await
	}

	/// The rationale is advisory; a completion failure downgrades to a
	/// canned message and never fails the request.
	async fn generate_rationale(
		&self,
		assignment: &Assignment,
		matches: &[CreatorMatch],
	) -> String {
		let completion_cfg = &self.cfg.providers.completion;
		let prompt = rationale::rationale_prompt(assignment, matches);

		match self
			.completion_shield
			.call(|| self.collaborators.completion.complete(completion_cfg, &prompt))
			.await
		{
			Ok(text) => text,
			Err(err) => {
				tracing::warn!(error = %err, "Rationale generation failed; using canned text.");

				rationale::FALLBACK_RATIONALE.to_string()
			},
		}
	}

	/// Write-back is best-effort; failures are logged only.
	async fn persist(&self, assignment_id: &str, matches: &[CreatorMatch]) {
		let Some(persistence_cfg) = self.cfg.providers.persistence.as_ref() else {
			return;
		};

		if let Err(err) = self
			.persistence_shield
			.call(|| self.collaborators.sink.persist_matches(persistence_cfg, assignment_id, matches))
			.await
		{
			tracing::warn!(error = %err, assignment_id, "Match persistence failed.");
		}
	}
}
