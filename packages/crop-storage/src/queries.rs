use sqlx::PgExecutor;

use crate::{
	Error, Result,
	models::{ChunkRow, Modality, SourceBoostRow, SourceRow},
};

/// Nearest chunks of one modality by cosine similarity, best first.
pub async fn top_k_chunks<'e, E>(
	executor: E,
	modality: Modality,
	vec_text: &str,
	limit: u32,
) -> Result<Vec<ChunkRow>>
where
	E: PgExecutor<'e>,
{
	if limit == 0 {
		return Err(Error::InvalidArgument("limit must be greater than zero.".to_string()));
	}

	let sql = format!(
		"\
SELECT
	chunk_id,
	source_id,
	{content} AS content,
	metadata,
	(1 - (embedding <=> $1::text::vector))::real AS similarity
FROM {table}
ORDER BY embedding <=> $1::text::vector ASC, chunk_id ASC
LIMIT $2",
		content = modality.content_column(),
		table = modality.table(),
	);
	let rows = sqlx::query_as::<_, ChunkRow>(&sql)
		.bind(vec_text)
		.bind(i64::from(limit))
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

/// The single most similar chunk of each listed source, without a similarity floor.
pub async fn best_chunk_per_source<'e, E>(
	executor: E,
	modality: Modality,
	vec_text: &str,
	source_ids: &[String],
) -> Result<Vec<ChunkRow>>
where
	E: PgExecutor<'e>,
{
	if source_ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"\
SELECT DISTINCT ON (source_id)
	chunk_id,
	source_id,
	{content} AS content,
	metadata,
	(1 - (embedding <=> $1::text::vector))::real AS similarity
FROM {table}
WHERE source_id = ANY($2)
ORDER BY source_id ASC, embedding <=> $1::text::vector ASC, chunk_id ASC",
		content = modality.content_column(),
		table = modality.table(),
	);
	let rows = sqlx::query_as::<_, ChunkRow>(&sql)
		.bind(vec_text)
		.bind(source_ids)
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

/// The first chunk of each listed source by chunk id, reported with zero similarity. Used
/// when there is no query vector to rank by.
pub async fn first_chunk_per_source<'e, E>(
	executor: E,
	modality: Modality,
	source_ids: &[String],
) -> Result<Vec<ChunkRow>>
where
	E: PgExecutor<'e>,
{
	if source_ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"\
SELECT DISTINCT ON (source_id)
	chunk_id,
	source_id,
	{content} AS content,
	metadata,
	0::real AS similarity
FROM {table}
WHERE source_id = ANY($1)
ORDER BY source_id ASC, chunk_id ASC",
		content = modality.content_column(),
		table = modality.table(),
	);
	let rows = sqlx::query_as::<_, ChunkRow>(&sql).bind(source_ids).fetch_all(executor).await?;

	Ok(rows)
}

pub async fn sources_by_ids<'e, E>(executor: E, source_ids: &[String]) -> Result<Vec<SourceRow>>
where
	E: PgExecutor<'e>,
{
	if source_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, SourceRow>(
		"\
SELECT source_id, title, url, source_type, institution
FROM sources
WHERE source_id = ANY($1)
ORDER BY source_id ASC",
	)
	.bind(source_ids)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Sources whose title or URL contains any of the hints, case-insensitively.
pub async fn search_sources<'e, E>(executor: E, hints: &[String]) -> Result<Vec<SourceRow>>
where
	E: PgExecutor<'e>,
{
	let patterns: Vec<String> = hints
		.iter()
		.map(|hint| hint.trim())
		.filter(|hint| !hint.is_empty())
		.map(like_pattern)
		.collect();

	if patterns.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, SourceRow>(
		"\
SELECT source_id, title, url, source_type, institution
FROM sources
WHERE title ILIKE ANY($1) OR coalesce(url, '') ILIKE ANY($1)
ORDER BY source_id ASC",
	)
	.bind(&patterns)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn source_boosts<'e, E>(executor: E) -> Result<Vec<SourceBoostRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, SourceBoostRow>(
		"SELECT source_id, boost FROM source_boosts ORDER BY source_id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8 + 2);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

fn like_pattern(hint: &str) -> String {
	let mut out = String::with_capacity(hint.len() + 2);

	out.push('%');

	for ch in hint.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('%');

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_pgvector_literal() {
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
		assert_eq!(vector_to_pg(&[]), "[]");
	}

	#[test]
	fn escapes_like_wildcards() {
		assert_eq!(like_pattern("Gray Leaf Spot"), "%Gray Leaf Spot%");
		assert_eq!(like_pattern("100%_pure\\"), "%100\\%\\_pure\\\\%");
	}

	#[test]
	fn modality_tables_differ() {
		assert_eq!(Modality::Text.table(), "text_chunks");
		assert_eq!(Modality::Image.content_column(), "caption");
	}
}
