use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Payload, Qdrant, QdrantError,
	qdrant::{
		CollectionStatus, Condition, CreateCollectionBuilder, Distance, Filter, PointStruct,
		Query, QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, VectorParamsBuilder,
		value::Kind,
	},
};
use uuid::Uuid;

use crate::{BoxFuture, Error, Result};

/// Hard bound on the candidate pool a single query may request.
const MAX_TOP_K: u32 = 100;
/// Points per upsert request.
const UPSERT_BATCH: usize = 100;

const PAYLOAD_CREATOR_ID: &str = "creator_id";

/// A creator vector headed for the index.
#[derive(Clone, Debug)]
pub struct CreatorVector {
	pub creator_id: String,
	pub vector: Vec<f32>,
}

/// One nearest-neighbour result: raw cosine score in [-1, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct IndexHit {
	pub creator_id: String,
	pub score: f64,
}

#[derive(Clone, Debug)]
pub struct IndexStats {
	pub vector_count: u64,
	pub status: String,
}

/// Payload equality conditions attached to a query.
#[derive(Clone, Debug, Default)]
pub struct IndexFilter {
	pub must: Vec<(String, String)>,
}

/// An approximate-nearest-neighbour store over fixed-dimension cosine
/// vectors. `query` is side-effect free; `upsert` is idempotent on
/// creator id.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn ensure_index(&self) -> BoxFuture<'_, Result<()>>;
	fn upsert<'a>(&'a self, points: &'a [CreatorVector]) -> BoxFuture<'a, Result<()>>;
	fn query<'a>(
		&'a self,
		vector: &'a [f32],
		top_k: u32,
		filter: Option<&'a IndexFilter>,
	) -> BoxFuture<'a, Result<Vec<IndexHit>>>;
	fn stats(&self) -> BoxFuture<'_, Result<IndexStats>>;
}

pub struct QdrantIndex {
	client: Qdrant,
	index_name: String,
	dimension: u32,
}
impl QdrantIndex {
	pub fn new(cfg: &cameo_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url)
			.timeout(Duration::from_millis(cfg.query_timeout_ms))
			.build()
			.map_err(|err| Error::InvalidConfig { message: err.to_string() })?;

		Ok(Self { client, index_name: cfg.index_name.clone(), dimension: cfg.vector_dim })
	}

	fn check_dimension(&self, vector: &[f32]) -> Result<()> {
		if vector.len() != self.dimension as usize {
			return Err(Error::InvalidConfig {
				message: format!(
					"Vector dimension {} does not match index dimension {}.",
					vector.len(),
					self.dimension
				),
			});
		}

		Ok(())
	}
}
impl VectorIndex for QdrantIndex {
	fn ensure_index(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let exists = self
				.client
				.collection_exists(self.index_name.as_str())
				.await
				.map_err(classify)?;

			if exists {
				return Ok(());
			}

			let create = CreateCollectionBuilder::new(self.index_name.as_str()).vectors_config(
				VectorParamsBuilder::new(u64::from(self.dimension), Distance::Cosine),
			);

			match self.client.create_collection(create).await {
				Ok(_) => Ok(()),
				// Another instance may win the creation race.
				Err(err) if is_already_exists(&err) => Ok(()),
				Err(err) => Err(classify(err)),
			}
		})
	}

	fn upsert<'a>(&'a self, points: &'a [CreatorVector]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			for point in points {
				self.check_dimension(&point.vector)?;
			}

			for batch in points.chunks(UPSERT_BATCH) {
				let structs: Vec<PointStruct> = batch
					.iter()
					.map(|point| {
						let mut payload_map = HashMap::new();

						payload_map.insert(
							PAYLOAD_CREATOR_ID.to_string(),
							qdrant_client::qdrant::Value::from(point.creator_id.clone()),
						);

						PointStruct::new(
							point_id_for(&point.creator_id),
							point.vector.clone(),
							Payload::from(payload_map),
						)
					})
					.collect();
				let upsert =
					UpsertPointsBuilder::new(self.index_name.as_str(), structs).wait(true);

				self.client.upsert_points(upsert).await.map_err(classify)?;
			}

			Ok(())
		})
	}

	fn query<'a>(
		&'a self,
		vector: &'a [f32],
		top_k: u32,
		filter: Option<&'a IndexFilter>,
	) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			self.check_dimension(vector)?;

			let mut builder = QueryPointsBuilder::new(self.index_name.as_str())
				.query(Query::new_nearest(vector.to_vec()))
				.limit(u64::from(clamp_top_k(top_k)))
				.with_payload(true);

			if let Some(filter) = filter
				&& !filter.must.is_empty()
			{
				let conditions: Vec<Condition> = filter
					.must
					.iter()
					.map(|(key, value)| Condition::matches(key.clone(), value.clone()))
					.collect();

				builder = builder.filter(Filter::must(conditions));
			}

			let response = self.client.query(builder).await.map_err(classify)?;
			let mut hits: Vec<IndexHit> =
				response.result.iter().filter_map(hit_from_point).collect();

			hits.sort_by(|left, right| right.score.total_cmp(&left.score));

			Ok(hits)
		})
	}

	fn stats(&self) -> BoxFuture<'_, Result<IndexStats>> {
		Box::pin(async move {
			let response = self
				.client
				.collection_info(self.index_name.as_str())
				.await
				.map_err(classify)?;
			let info = response.result.ok_or_else(|| Error::Unavailable {
				message: "Collection info response was empty.".to_string(),
			})?;
			let status = match info.status() {
				CollectionStatus::Green => "green",
				CollectionStatus::Yellow => "yellow",
				CollectionStatus::Red => "red",
				_ => "unknown",
			};

			Ok(IndexStats {
				vector_count: info.points_count.unwrap_or(0),
				status: status.to_string(),
			})
		})
	}
}

/// Catalog ids are arbitrary strings, but point ids must be u64 or UUID;
/// derive a stable UUIDv5 per creator so upserts stay idempotent.
pub fn point_id_for(creator_id: &str) -> String {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, creator_id.as_bytes()).to_string()
}

fn clamp_top_k(top_k: u32) -> u32 {
	top_k.clamp(1, MAX_TOP_K)
}

fn hit_from_point(point: &ScoredPoint) -> Option<IndexHit> {
	let value = point.payload.get(PAYLOAD_CREATOR_ID)?;
	let creator_id = match &value.kind {
		Some(Kind::StringValue(text)) => text.clone(),
		_ => return None,
	};

	Some(IndexHit { creator_id, score: f64::from(point.score) })
}

fn is_already_exists(err: &QdrantError) -> bool {
	err.to_string().to_lowercase().contains("already exists")
}

fn classify(err: QdrantError) -> Error {
	let message = err.to_string();
	let lower = message.to_lowercase();

	if lower.contains("too many requests") || lower.contains("resource_exhausted") {
		Error::Throttled { retry_after: None }
	} else if lower.contains("doesn't exist") || lower.contains("not found") {
		Error::NotFound(message)
	} else if lower.contains("initializ") || lower.contains("optimiz") {
		Error::NotReady { message }
	} else {
		Error::Unavailable { message }
	}
}
