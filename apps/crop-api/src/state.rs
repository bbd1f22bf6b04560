use std::sync::Arc;

use crop_retrieval::RetrievalService;
use crop_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RetrievalService>,
}
impl AppState {
	pub async fn new(config: crop_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		if config.storage.postgres.ensure_schema {
			let embedding = &config.providers.embedding;

			db.ensure_schema(embedding.text_dimensions, embedding.image_dimensions).await?;
		}

		Ok(Self::from_service(RetrievalService::new(config, db)))
	}

	pub fn from_service(service: RetrievalService) -> Self {
		Self { service: Arc::new(service) }
	}
}
