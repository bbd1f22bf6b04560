pub mod assemble;
pub mod features;
pub mod hints;
pub mod models;
pub mod planner;
pub mod search;
pub mod service;
pub mod store;

mod error;

pub use error::{Error, Result};
pub use features::RankingFeatures;
pub use hints::HintResolution;
pub use models::{
	AssembledContext, Candidate, Modality, RankBreakdown, RetrievalPlan, RetrievedChunk, Source,
	SourceType,
};
pub use planner::{InputType, PlanInput};
pub use service::{RetrievalService, RetrieveRequest, RetrieveResponse};
pub use store::PgStore;

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use crop_config::EmbeddingProviderConfig;
use crop_providers::embedding;
use crop_storage::models::{ChunkRow, SourceRow};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
		dimensions: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

/// Read-only access to the chunk corpus and its sources.
pub trait ChunkStore
where
	Self: Send + Sync,
{
	fn top_k<'a>(
		&'a self,
		modality: Modality,
		vector: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ChunkRow>>>;

	/// The most similar chunk of each listed source, with no similarity floor.
	fn best_per_source<'a>(
		&'a self,
		modality: Modality,
		vector: &'a [f32],
		source_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChunkRow>>>;

	/// The first chunk of each listed source with zero similarity, for requests that have
	/// no query vector.
	fn first_per_source<'a>(
		&'a self,
		modality: Modality,
		source_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChunkRow>>>;

	fn sources_by_ids<'a>(
		&'a self,
		source_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<SourceRow>>>;

	/// Sources whose title or URL contains any hint, case-insensitively.
	fn search_sources<'a>(&'a self, hints: &'a [String]) -> BoxFuture<'a, Result<Vec<SourceRow>>>;
}

pub trait BoostStore
where
	Self: Send + Sync,
{
	/// Snapshot of the feedback-derived boost per source id.
	fn boosts(&self) -> BoxFuture<'_, Result<HashMap<String, f32>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

#[derive(Clone)]
pub struct Stores {
	pub chunks: Arc<dyn ChunkStore>,
	pub boosts: Arc<dyn BoostStore>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
		dimensions: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text, dimensions))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

impl Stores {
	pub fn new(chunks: Arc<dyn ChunkStore>, boosts: Arc<dyn BoostStore>) -> Self {
		Self { chunks, boosts }
	}

	pub fn postgres(store: PgStore) -> Self {
		let store = Arc::new(store);

		Self { chunks: store.clone(), boosts: store }
	}
}
