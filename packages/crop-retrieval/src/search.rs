pub mod ranking;

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crop_config::{Config, Search};

use crate::{
	ChunkStore, Providers, Result,
	models::{Candidate, Modality},
	search::ranking::{RankingSignals, cmp_ranked, rank_candidates},
};

/// Per-request options shared by both modality searches.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions<'a> {
	pub crop: Option<&'a str>,
	pub region: Option<&'a str>,
	pub topics: &'a [String],
	pub source_boosts: &'a HashMap<String, f32>,
	pub min_similarity: f32,
	pub candidate_multiplier: u32,
	pub keyword_boost: f32,
}
impl<'a> SearchOptions<'a> {
	pub fn from_config(
		cfg: &Search,
		crop: Option<&'a str>,
		region: Option<&'a str>,
		topics: &'a [String],
		source_boosts: &'a HashMap<String, f32>,
	) -> Self {
		Self {
			crop,
			region,
			topics,
			source_boosts,
			min_similarity: cfg.min_similarity,
			candidate_multiplier: cfg.candidate_multiplier,
			keyword_boost: cfg.keyword_boost,
		}
	}

	fn signals(&self) -> RankingSignals<'a> {
		RankingSignals {
			crop: self.crop,
			region: self.region,
			topics: self.topics,
			source_boosts: self.source_boosts,
			keyword_boost: self.keyword_boost,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalityResults {
	pub modality: Modality,
	/// Ranked top-k candidates that cleared the similarity floor.
	pub candidates: Vec<Candidate>,
	/// Best chunk per required source, ranked but never floored.
	pub required: Vec<Candidate>,
}
impl ModalityResults {
	pub fn empty(modality: Modality) -> Self {
		Self { modality, candidates: Vec::new(), required: Vec::new() }
	}
}

/// Vector search over one modality's table.
pub struct VectorSearch<'a> {
	pub cfg: &'a Config,
	pub providers: &'a Providers,
	pub chunks: &'a dyn ChunkStore,
	pub modality: Modality,
}
impl VectorSearch<'_> {
	pub fn limit(&self) -> u32 {
		match self.modality {
			Modality::Text => self.cfg.search.text_limit,
			Modality::Image => self.cfg.search.image_limit,
		}
	}

	pub fn dimensions(&self) -> u32 {
		let embedding = &self.cfg.providers.embedding;

		match self.modality {
			Modality::Text => embedding.text_dimensions,
			Modality::Image => embedding.image_dimensions,
		}
	}

	/// Embeds the query once, then runs the top-k search and the required fetch with the
	/// same vector. An empty query skips embedding and top-k; required sources are still
	/// fetched, one chunk each at zero similarity.
	pub async fn run(
		&self,
		query: &str,
		required_source_ids: &[String],
		options: &SearchOptions<'_>,
	) -> Result<ModalityResults> {
		let limit = self.limit();
		let query = query.trim();

		if required_source_ids.is_empty() && (query.is_empty() || limit == 0) {
			return Ok(ModalityResults::empty(self.modality));
		}
		if query.is_empty() {
			let rows = self.chunks.first_per_source(self.modality, required_source_ids).await?;
			let mut required: Vec<Candidate> =
				rows.into_iter().map(|row| Candidate::from_row(self.modality, row)).collect();

			rank_candidates(&mut required, query, &options.signals(), &self.cfg.ranking);
			required.sort_by(cmp_ranked);

			debug!(
				modality = self.modality.as_str(),
				required = required.len(),
				"Fetched required sources without a query."
			);

			return Ok(ModalityResults { modality: self.modality, candidates: Vec::new(), required });
		}

		let vector = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, query, self.dimensions())
			.await?;
		let candidates = if limit == 0 {
			Vec::new()
		} else {
			let fetch_limit = candidate_limit(limit, options.candidate_multiplier);
			let rows = self.chunks.top_k(self.modality, &vector, fetch_limit).await?;
			let fetched = rows.into_iter().map(|row| Candidate::from_row(self.modality, row)).collect();

			rank_and_filter(fetched, query, limit, options, &self.cfg.ranking)
		};
		let required = if required_source_ids.is_empty() {
			Vec::new()
		} else {
			let rows =
				self.chunks.best_per_source(self.modality, &vector, required_source_ids).await?;
			let mut fetched: Vec<Candidate> =
				rows.into_iter().map(|row| Candidate::from_row(self.modality, row)).collect();

			rank_candidates(&mut fetched, query, &options.signals(), &self.cfg.ranking);
			fetched.sort_by(cmp_ranked);

			fetched
		};

		debug!(
			modality = self.modality.as_str(),
			candidates = candidates.len(),
			required = required.len(),
			"Vector search finished."
		);

		Ok(ModalityResults { modality: self.modality, candidates, required })
	}
}

pub fn candidate_limit(limit: u32, multiplier: u32) -> u32 {
	limit.max(limit.saturating_mul(multiplier))
}

/// Ranks the candidates and keeps the best `limit` at or above the raw similarity floor.
pub fn rank_and_filter(
	mut candidates: Vec<Candidate>,
	query: &str,
	limit: u32,
	options: &SearchOptions<'_>,
	cfg: &crop_config::Ranking,
) -> Vec<Candidate> {
	rank_candidates(&mut candidates, query, &options.signals(), cfg);

	let mut seen = HashSet::new();
	let mut kept: Vec<Candidate> = candidates
		.into_iter()
		.filter(|candidate| candidate.similarity >= options.min_similarity)
		.filter(|candidate| seen.insert(candidate.id.clone()))
		.collect();

	kept.sort_by(cmp_ranked);
	kept.truncate(limit as usize);

	kept
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn candidate(id: &str, similarity: f32, content: &str) -> Candidate {
		Candidate {
			id: id.to_string(),
			modality: Modality::Text,
			content: content.to_string(),
			similarity,
			source_id: "s1".to_string(),
			metadata: json!({}),
			rank_score: None,
			breakdown: None,
		}
	}

	#[test]
	fn candidate_limit_overfetches() {
		assert_eq!(candidate_limit(12, 4), 48);
		assert_eq!(candidate_limit(5, 0), 5);
		assert_eq!(candidate_limit(u32::MAX, 4), u32::MAX);
	}

	#[test]
	fn boosts_never_rescue_low_similarity() {
		let boosts = HashMap::from([("s1".to_string(), 0.25)]);
		let options = SearchOptions {
			crop: None,
			region: None,
			topics: &[],
			source_boosts: &boosts,
			min_similarity: 0.2,
			candidate_multiplier: 4,
			keyword_boost: 0.08,
		};
		let kept = rank_and_filter(
			vec![
				candidate("low", 0.15, "lesions everywhere"),
				candidate("mid", 0.3, "nothing"),
				candidate("high", 0.35, "lesions"),
				candidate("mid", 0.3, "duplicate"),
			],
			"lesions",
			5,
			&options,
			&crop_config::Ranking::default(),
		);
		let ids: Vec<&str> = kept.iter().map(|candidate| candidate.id.as_str()).collect();

		assert_eq!(ids, vec!["high", "mid"]);
		assert!(kept.iter().all(|candidate| candidate.rank_score.is_some()));
	}

	#[test]
	fn truncates_to_limit_by_rank_score() {
		let boosts = HashMap::new();
		let options = SearchOptions {
			crop: None,
			region: None,
			topics: &[],
			source_boosts: &boosts,
			min_similarity: 0.2,
			candidate_multiplier: 4,
			keyword_boost: 0.08,
		};
		let kept = rank_and_filter(
			vec![
				candidate("a", 0.50, "unrelated"),
				candidate("b", 0.45, "tar spot stromata"),
				candidate("c", 0.40, "unrelated"),
			],
			"stromata",
			2,
			&options,
			&crop_config::Ranking::default(),
		);
		let ids: Vec<&str> = kept.iter().map(|candidate| candidate.id.as_str()).collect();

		assert_eq!(ids, vec!["b", "a"]);
	}
}
