use std::{fs, path::PathBuf};

use cameo_domain::Creator;

use crate::{BoxFuture, Error, Result, db::Db, models::CreatorRow};

/// Where the creator catalog is loaded from. Implementations return a
/// complete snapshot; incremental updates are the cache's concern.
pub trait CatalogSource
where
	Self: Send + Sync,
{
	fn list_all(&self) -> BoxFuture<'_, Result<Vec<Creator>>>;
}

pub struct PgCatalogSource {
	db: Db,
}
impl PgCatalogSource {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl CatalogSource for PgCatalogSource {
	fn list_all(&self) -> BoxFuture<'_, Result<Vec<Creator>>> {
		Box::pin(async move {
			let rows: Vec<CreatorRow> = sqlx::query_as(
				"SELECT id, nickname, bio, follower_count, heart_count, region, analysis \
				 FROM creators \
				 ORDER BY id",
			)
			.fetch_all(&self.db.pool)
			.await?;

			rows.into_iter().map(CreatorRow::into_creator).collect()
		})
	}
}

/// A JSON-file snapshot: an array of creator records in wire format.
/// Useful for small catalogs and local development.
pub struct FileCatalogSource {
	path: PathBuf,
}
impl FileCatalogSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}
impl CatalogSource for FileCatalogSource {
	fn list_all(&self) -> BoxFuture<'_, Result<Vec<Creator>>> {
		Box::pin(async move {
			let raw = fs::read_to_string(&self.path).map_err(|err| Error::Unavailable {
				message: format!("Failed to read catalog file {:?}: {err}.", self.path),
			})?;
			let creators: Vec<Creator> =
				serde_json::from_str(&raw).map_err(|err| Error::InvalidRecord {
					message: format!("Catalog file {:?} is malformed: {err}.", self.path),
				})?;

			for creator in &creators {
				if creator.analysis.primary_niches.is_empty() {
					return Err(Error::InvalidRecord {
						message: format!("Creator {} has no primary niches.", creator.id),
					});
				}
			}

			Ok(creators)
		})
	}
}
