use std::{sync::Arc, time::Duration};

use color_eyre::eyre;

use cameo_config::{CatalogBackend, Config};
use cameo_service::{
	Collaborators, MatchService,
	catalog_cache::{CatalogCache, spawn_refresh_worker},
};
use cameo_storage::{
	catalog::{CatalogSource, FileCatalogSource, PgCatalogSource},
	db::Db,
	index::{QdrantIndex, VectorIndex},
};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MatchService>,
}
impl AppState {
	/// The composition root: build the catalog source, cache, index, and
	/// collaborators, wire them into the service, and start the refresh
	/// worker. Core components never construct their own dependencies.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let source: Arc<dyn CatalogSource> = match config.catalog.source {
			CatalogBackend::Postgres => {
				let postgres = config
					.storage
					.postgres
					.as_ref()
					.ok_or_else(|| eyre::eyre!("storage.postgres is required."))?;
				let db = Db::connect(postgres).await?;

				db.ensure_schema().await?;

				Arc::new(PgCatalogSource::new(db))
			},
			CatalogBackend::File => {
				let path = config
					.catalog
					.file_path
					.clone()
					.ok_or_else(|| eyre::eyre!("catalog.file_path is required."))?;

				Arc::new(FileCatalogSource::new(path))
			},
		};
		let cache = Arc::new(CatalogCache::new(
			source,
			Duration::from_millis(config.catalog.refresh_ttl_ms),
		));

		// A cold catalog is not fatal; requests fail with a retry hint
		// until the refresh worker brings a snapshot in.
		if let Err(err) = cache.load().await {
			tracing::warn!(error = %err, "Initial catalog load failed.");
		}

		let index = Arc::new(QdrantIndex::new(&config.storage.qdrant)?);

		if let Err(err) = index.ensure_index().await {
			tracing::warn!(error = %err, "Vector index bootstrap failed; relying on fallback.");
		}

		let service = Arc::new(MatchService::new(
			config,
			cache.clone(),
			index,
			Collaborators::default(),
		));

		spawn_refresh_worker(cache);

		Ok(Self { service })
	}

	pub fn with_service(service: Arc<MatchService>) -> Self {
		Self { service }
	}
}
