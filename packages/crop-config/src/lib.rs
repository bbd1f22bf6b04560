mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Assembly, Config, EmbeddingProviderConfig, Hints, NutrientBand, Planner, Postgres, Providers,
	Ranking, Search, Service, Storage, default_nutrient_bands, default_stopwords,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::invalid("storage.postgres.pool_max_conns", "must be greater than zero."));
	}

	validate_embedding(&cfg.providers.embedding)?;
	validate_search(&cfg.search)?;
	validate_ranking(&cfg.ranking)?;
	validate_hints(&cfg.hints)?;
	validate_assembly(&cfg.assembly)?;
	validate_planner(&cfg.planner)?;

	Ok(())
}

fn validate_embedding(cfg: &EmbeddingProviderConfig) -> Result<()> {
	if cfg.api_key.trim().is_empty() {
		return Err(Error::invalid("providers.embedding.api_key", "must be non-empty."));
	}
	if cfg.api_base.trim().is_empty() {
		return Err(Error::invalid("providers.embedding.api_base", "must be non-empty."));
	}
	if cfg.text_dimensions == 0 {
		return Err(Error::invalid(
			"providers.embedding.text_dimensions",
			"must be greater than zero.",
		));
	}
	if cfg.image_dimensions == 0 {
		return Err(Error::invalid(
			"providers.embedding.image_dimensions",
			"must be greater than zero.",
		));
	}
	if cfg.timeout_ms == 0 {
		return Err(Error::invalid("providers.embedding.timeout_ms", "must be greater than zero."));
	}

	Ok(())
}

fn validate_search(cfg: &Search) -> Result<()> {
	if cfg.text_limit == 0 {
		return Err(Error::invalid("search.text_limit", "must be greater than zero."));
	}
	if cfg.candidate_multiplier == 0 {
		return Err(Error::invalid("search.candidate_multiplier", "must be greater than zero."));
	}

	check_unit("search.min_similarity", cfg.min_similarity)?;
	check_unit("search.keyword_boost", cfg.keyword_boost)?;

	Ok(())
}

fn validate_ranking(cfg: &Ranking) -> Result<()> {
	if cfg.max_keywords == 0 {
		return Err(Error::invalid("ranking.max_keywords", "must be greater than zero."));
	}

	for (key, value) in [
		("ranking.crop_boost", cfg.crop_boost),
		("ranking.topic_boost_per_match", cfg.topic_boost_per_match),
		("ranking.topic_boost_max", cfg.topic_boost_max),
		("ranking.region_boost", cfg.region_boost),
	] {
		check_unit(key, value)?;
	}

	Ok(())
}

fn validate_hints(cfg: &Hints) -> Result<()> {
	check_unit("hints.required_boost", cfg.required_boost)?;
	check_unit("hints.max_source_boost", cfg.max_source_boost)?;

	Ok(())
}

fn validate_assembly(cfg: &Assembly) -> Result<()> {
	if cfg.thresholds.is_empty() {
		return Err(Error::invalid("assembly.thresholds", "must be non-empty."));
	}

	for threshold in &cfg.thresholds {
		check_unit("assembly.thresholds", *threshold)?;
	}

	if cfg.thresholds.windows(2).any(|pair| pair[1] >= pair[0]) {
		return Err(Error::invalid("assembly.thresholds", "must be strictly descending."));
	}
	if cfg.max_chunks_per_source == 0 {
		return Err(Error::invalid("assembly.max_chunks_per_source", "must be greater than zero."));
	}
	if cfg.small_pool_max_chunks_per_source < cfg.max_chunks_per_source {
		return Err(Error::invalid(
			"assembly.small_pool_max_chunks_per_source",
			"must be at least assembly.max_chunks_per_source.",
		));
	}
	if cfg.max_chunk_chars == 0 || cfg.max_chunk_chars > cfg.max_context_chars {
		return Err(Error::invalid(
			"assembly.max_chunk_chars",
			"must be greater than zero and at most assembly.max_context_chars.",
		));
	}
	if cfg.min_tail_chars > cfg.max_chunk_chars {
		return Err(Error::invalid(
			"assembly.min_tail_chars",
			"must be at most assembly.max_chunk_chars.",
		));
	}
	if cfg.chars_per_token == 0 {
		return Err(Error::invalid("assembly.chars_per_token", "must be greater than zero."));
	}

	check_unit("assembly.relevance_weight", cfg.relevance_weight)?;
	check_unit("assembly.authority_weight", cfg.authority_weight)?;

	if cfg.relevance_weight + cfg.authority_weight > 1.0 + f32::EPSILON {
		return Err(Error::invalid(
			"assembly.relevance_weight",
			"plus assembly.authority_weight must be 1.0 or less.",
		));
	}

	Ok(())
}

fn validate_planner(cfg: &Planner) -> Result<()> {
	for band in &cfg.nutrient_bands {
		if band.keys.iter().all(|key| key.trim().is_empty()) {
			return Err(Error::invalid(
				"planner.nutrient_bands.keys",
				format!("band {:?} must declare at least one key.", band.label),
			));
		}
		if band.low.is_none() && band.high.is_none() {
			return Err(Error::invalid(
				"planner.nutrient_bands",
				format!("band {:?} must declare low, high, or both.", band.label),
			));
		}
		if let (Some(low), Some(high)) = (band.low, band.high)
			&& low >= high
		{
			return Err(Error::invalid(
				"planner.nutrient_bands",
				format!("band {:?} must have low below high.", band.label),
			));
		}
	}

	Ok(())
}

fn check_unit(key: &str, value: f32) -> Result<()> {
	if !value.is_finite() {
		return Err(Error::invalid(key, "must be a finite number."));
	}
	if !(0.0..=1.0).contains(&value) {
		return Err(Error::invalid(key, "must be in the range 0.0-1.0."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.providers.embedding.api_base.trim_end_matches('/').to_string();

	cfg.providers.embedding.api_base = trimmed;

	let mut seen = HashSet::new();

	cfg.ranking.stopwords = cfg
		.ranking
		.stopwords
		.iter()
		.map(|word| word.trim().to_lowercase())
		.filter(|word| !word.is_empty() && seen.insert(word.clone()))
		.collect();

	for band in &mut cfg.planner.nutrient_bands {
		band.keys = band.keys.iter().map(|key| normalize_key(key)).collect();
	}
}

/// Lowercases and drops every non-alphanumeric character, so `organic_matter` and
/// `organicMatter` compare equal.
pub fn normalize_key(raw: &str) -> String {
	raw.chars().filter(|ch| ch.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}
