use std::env;

use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use crop_storage::{
	models::Modality,
	queries::{self, vector_to_pg},
	schema,
};

fn env_dsn() -> Option<String> {
	env::var("CROP_PG_DSN").ok().filter(|dsn| !dsn.trim().is_empty())
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set CROP_PG_DSN to run."]
async fn queries_run_against_bootstrapped_schema() {
	let Some(dsn) = env_dsn() else {
		eprintln!("Skipping queries_run_against_bootstrapped_schema; set CROP_PG_DSN to run.");

		return;
	};
	let mut conn = PgConnection::connect(&dsn).await.expect("Failed to connect to Postgres.");
	let mut tx = conn.begin().await.expect("Failed to begin transaction.");
	let schema_name = format!("crop_smoke_{}", Uuid::new_v4().simple());

	sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
		.execute(&mut *tx)
		.await
		.expect("Failed to create extension.");
	sqlx::query(&format!(r#"CREATE SCHEMA "{schema_name}""#))
		.execute(&mut *tx)
		.await
		.expect("Failed to create schema.");
	sqlx::query(&format!(r#"SET LOCAL search_path TO "{schema_name}", public"#))
		.execute(&mut *tx)
		.await
		.expect("Failed to set search path.");

	let sql = schema::render_schema(3, 2);

	for statement in schema::statements(&sql) {
		sqlx::query(statement).execute(&mut *tx).await.expect("Failed to apply schema.");
	}

	sqlx::query(
		"\
INSERT INTO sources (source_id, title, url, source_type)
VALUES
	('s1', 'Gray Leaf Spot of Corn', 'https://extension.example.edu/gls', 'UNIVERSITY_EXTENSION'),
	('s2', 'Soil pH Basics', NULL, 'GOVERNMENT')",
	)
	.execute(&mut *tx)
	.await
	.expect("Failed to seed sources.");
	sqlx::query(
		"\
INSERT INTO text_chunks (chunk_id, source_id, content, metadata, embedding)
VALUES
	('c1', 's1', 'Rectangular lesions.', '{\"crops\": [\"corn\"]}', '[1,0,0]'),
	('c2', 's1', 'Residue management.', '{}', '[0,1,0]'),
	('c3', 's2', 'Lime acidic soils.', '{}', '[0,0,1]')",
	)
	.execute(&mut *tx)
	.await
	.expect("Failed to seed chunks.");
	sqlx::query("INSERT INTO source_boosts (source_id, boost) VALUES ('s2', 0.05)")
		.execute(&mut *tx)
		.await
		.expect("Failed to seed boosts.");

	let query = vector_to_pg(&[1.0, 0.0, 0.0]);
	let top = queries::top_k_chunks(&mut *tx, Modality::Text, &query, 2)
		.await
		.expect("Failed to run top-k.");

	assert_eq!(top.len(), 2);
	assert_eq!(top[0].chunk_id, "c1");
	assert!((top[0].similarity - 1.0).abs() < 1e-5);

	let best = queries::best_chunk_per_source(
		&mut *tx,
		Modality::Text,
		&vector_to_pg(&[0.0, 1.0, 0.0]),
		&["s1".to_string(), "s2".to_string()],
	)
	.await
	.expect("Failed to run best-chunk query.");
	let best_ids: Vec<&str> = best.iter().map(|row| row.chunk_id.as_str()).collect();

	assert_eq!(best_ids, vec!["c2", "c3"]);

	let first = queries::first_chunk_per_source(&mut *tx, Modality::Text, &["s1".to_string()])
		.await
		.expect("Failed to run first-chunk query.");

	assert_eq!(first.len(), 1);
	assert_eq!(first[0].chunk_id, "c1");
	assert_eq!(first[0].similarity, 0.0);

	let found = queries::search_sources(&mut *tx, &["leaf spot".to_string()])
		.await
		.expect("Failed to search sources.");

	assert_eq!(found.len(), 1);
	assert_eq!(found[0].source_id, "s1");

	let by_url = queries::search_sources(&mut *tx, &["EXTENSION.EXAMPLE".to_string()])
		.await
		.expect("Failed to search sources by url.");

	assert_eq!(by_url.len(), 1);

	let sources = queries::sources_by_ids(&mut *tx, &["s2".to_string(), "missing".to_string()])
		.await
		.expect("Failed to load sources.");

	assert_eq!(sources.len(), 1);
	assert_eq!(sources[0].source_type, "GOVERNMENT");

	let boosts = queries::source_boosts(&mut *tx).await.expect("Failed to load boosts.");

	assert_eq!(boosts.len(), 1);
	assert!((boosts[0].boost - 0.05).abs() < 1e-6);

	tx.rollback().await.expect("Failed to roll back.");
}
