use std::{
	collections::HashMap,
	sync::{Arc, Mutex, RwLock},
	time::{Duration, Instant},
};

use cameo_domain::Creator;
use cameo_storage::catalog::CatalogSource;

/// An immutable view of the whole catalog. Snapshots are built off to the
/// side and swapped in atomically, so readers never observe a partial
/// update.
pub struct CatalogSnapshot {
	by_id: HashMap<String, Arc<Creator>>,
	order: Vec<Arc<Creator>>,
}
impl CatalogSnapshot {
	fn build(creators: Vec<Creator>) -> Self {
		let mut by_id = HashMap::with_capacity(creators.len());
		let mut order = Vec::with_capacity(creators.len());

		for mut creator in creators {
			if by_id.contains_key(&creator.id) {
				tracing::warn!(creator_id = %creator.id, "Duplicate creator id dropped.");

				continue;
			}

			normalize_tags(&mut creator);

			let creator = Arc::new(creator);

			by_id.insert(creator.id.clone(), creator.clone());
			order.push(creator);
		}

		Self { by_id, order }
	}

	pub fn get(&self, id: &str) -> Option<Arc<Creator>> {
		self.by_id.get(id).cloned()
	}

	pub fn all(&self) -> &[Arc<Creator>] {
		&self.order
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}
}

fn normalize_tags(creator: &mut Creator) {
	let analysis = &mut creator.analysis;

	for tags in [
		&mut analysis.primary_niches,
		&mut analysis.secondary_niches,
		&mut analysis.apparent_values,
		&mut analysis.audience_interests,
		&mut analysis.tone,
	] {
		for tag in tags.iter_mut() {
			*tag = tag.trim().to_lowercase();
		}

		tags.retain(|tag| !tag.is_empty());
	}
}

/// The in-memory creator catalog with bounded staleness. One writer (the
/// refresh worker), many readers; lookups during a refresh keep reading
/// the previous snapshot.
pub struct CatalogCache {
	source: Arc<dyn CatalogSource>,
	snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
	refresh_ttl: Duration,
	last_refresh: Mutex<Option<Instant>>,
}
impl CatalogCache {
	pub fn new(source: Arc<dyn CatalogSource>, refresh_ttl: Duration) -> Self {
		Self {
			source,
			snapshot: RwLock::new(None),
			refresh_ttl,
			last_refresh: Mutex::new(None),
		}
	}

	/// Load a fresh snapshot and swap it in. A failure leaves the current
	/// snapshot untouched.
	pub async fn load(&self) -> cameo_storage::Result<()> {
		let creators = self.source.list_all().await?;
		let next = Arc::new(CatalogSnapshot::build(creators));

		tracing::info!(creators = next.len(), "Catalog snapshot refreshed.");

		{
			let mut snapshot = self.snapshot.write().unwrap_or_else(|err| err.into_inner());

			*snapshot = Some(next);
		}
		{
			let mut last_refresh =
				self.last_refresh.lock().unwrap_or_else(|err| err.into_inner());

			*last_refresh = Some(Instant::now());
		}

		Ok(())
	}

	/// The current snapshot; `None` until the first successful load.
	pub fn snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
		self.snapshot.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn refresh_due(&self) -> bool {
		let last_refresh = self.last_refresh.lock().unwrap_or_else(|err| err.into_inner());

		last_refresh.map(|at| at.elapsed() >= self.refresh_ttl).unwrap_or(true)
	}

	pub fn refresh_ttl(&self) -> Duration {
		self.refresh_ttl
	}
}

/// Run the single-writer refresh loop. Failures are logged and the stale
/// snapshot stays live until the next tick succeeds.
pub fn spawn_refresh_worker(cache: Arc<CatalogCache>) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			tokio::time::sleep(cache.refresh_ttl()).await;

			if let Err(err) = cache.load().await {
				tracing::error!(error = %err, "Catalog refresh failed; keeping stale snapshot.");
			}
		}
	})
}
