use std::collections::HashMap;

use tracing::warn;

use crop_storage::{
	db::Db,
	models::{ChunkRow, SourceRow},
	queries::{self, vector_to_pg},
};

use crate::{BoostStore, BoxFuture, ChunkStore, Result, models::Modality};

/// Chunk and boost store backed by Postgres with pgvector.
pub struct PgStore {
	pub db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

impl ChunkStore for PgStore {
	fn top_k<'a>(
		&'a self,
		modality: Modality,
		vector: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ChunkRow>>> {
		Box::pin(async move {
			let vec_text = vector_to_pg(vector);

			Ok(queries::top_k_chunks(&self.db.pool, modality, &vec_text, limit).await?)
		})
	}

	fn best_per_source<'a>(
		&'a self,
		modality: Modality,
		vector: &'a [f32],
		source_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChunkRow>>> {
		Box::pin(async move {
			let vec_text = vector_to_pg(vector);

			Ok(queries::best_chunk_per_source(&self.db.pool, modality, &vec_text, source_ids)
				.await?)
		})
	}

	fn first_per_source<'a>(
		&'a self,
		modality: Modality,
		source_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChunkRow>>> {
		Box::pin(async move {
			Ok(queries::first_chunk_per_source(&self.db.pool, modality, source_ids).await?)
		})
	}

	fn sources_by_ids<'a>(
		&'a self,
		source_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<SourceRow>>> {
		Box::pin(async move { Ok(queries::sources_by_ids(&self.db.pool, source_ids).await?) })
	}

	fn search_sources<'a>(&'a self, hints: &'a [String]) -> BoxFuture<'a, Result<Vec<SourceRow>>> {
		Box::pin(async move { Ok(queries::search_sources(&self.db.pool, hints).await?) })
	}
}

impl BoostStore for PgStore {
	fn boosts(&self) -> BoxFuture<'_, Result<HashMap<String, f32>>> {
		Box::pin(async move {
			let rows = queries::source_boosts(&self.db.pool).await?;
			let mut out = HashMap::with_capacity(rows.len());

			for row in rows {
				if !row.boost.is_finite() {
					warn!(source_id = %row.source_id, "Skipping non-finite learned boost.");

					continue;
				}

				out.insert(row.source_id, row.boost);
			}

			Ok(out)
		})
	}
}
