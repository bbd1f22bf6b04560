use std::collections::{HashMap, HashSet};

use tracing::debug;

use crop_config::Hints;

use crate::{BoostStore, ChunkStore, Result};

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct HintResolution {
	pub required_source_ids: Vec<String>,
	pub source_boosts: HashMap<String, f32>,
}

/// Resolves title hints into required sources and merges their boost into the learned
/// boost snapshot. The snapshot is always read, even without hints.
pub async fn resolve_hints(
	cfg: &Hints,
	chunks: &dyn ChunkStore,
	boosts: &dyn BoostStore,
	title_hints: &[String],
	caller_required: &[String],
) -> Result<HintResolution> {
	let learned = boosts.boosts().await?;
	let hints: Vec<String> = title_hints
		.iter()
		.map(|hint| hint.trim())
		.filter(|hint| !hint.is_empty())
		.map(str::to_string)
		.collect();
	let matched = if hints.is_empty() {
		Vec::new()
	} else {
		chunks.search_sources(&hints).await?.into_iter().map(|row| row.source_id).collect()
	};
	let required_source_ids = union_ids(caller_required, &matched);
	let source_boosts = merge_boosts(cfg, learned, &required_source_ids);

	debug!(
		hints = hints.len(),
		matched = matched.len(),
		required = required_source_ids.len(),
		boosted = source_boosts.len(),
		"Resolved source hints."
	);

	Ok(HintResolution { required_source_ids, source_boosts })
}

/// Caller ids first, then hint matches, each id once.
pub fn union_ids(first: &[String], second: &[String]) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for id in first.iter().chain(second) {
		let id = id.trim();

		if id.is_empty() {
			continue;
		}
		if seen.insert(id.to_string()) {
			out.push(id.to_string());
		}
	}

	out
}

/// Adds the required boost to every required source, then bounds every total to
/// `[-max_source_boost, max_source_boost]`.
pub fn merge_boosts(
	cfg: &Hints,
	learned: HashMap<String, f32>,
	required_source_ids: &[String],
) -> HashMap<String, f32> {
	let mut out: HashMap<String, f32> =
		learned.into_iter().filter(|(_, boost)| boost.is_finite()).collect();

	for id in required_source_ids {
		*out.entry(id.clone()).or_insert(0.0) += cfg.required_boost;
	}

	for boost in out.values_mut() {
		*boost = boost.clamp(-cfg.max_source_boost, cfg.max_source_boost);
	}

	out
}
