use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crop_config::Assembly;

use crate::{
	ChunkStore, Result,
	features::RankingFeatures,
	models::{AssembledContext, Candidate, RetrievedChunk, Source},
	search::{ModalityResults, ranking::cmp_f32_desc},
};

const ELLIPSIS: char = '…';

/// Searched candidates that survived the relevance threshold plus every required-source
/// candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
	pub candidates: Vec<Candidate>,
	pub relevance_threshold: f32,
}
impl Selection {
	/// Distinct source ids in candidate order, for one batched lookup.
	pub fn source_ids(&self) -> Vec<String> {
		let mut seen = HashSet::new();

		self.candidates
			.iter()
			.filter(|candidate| seen.insert(candidate.source_id.as_str()))
			.map(|candidate| candidate.source_id.clone())
			.collect()
	}
}

/// Text candidates first, then image candidates, keeping the first occurrence of an id.
pub fn merge_candidates(text: Vec<Candidate>, image: Vec<Candidate>) -> Vec<Candidate> {
	let mut seen = HashSet::new();
	let mut out = Vec::with_capacity(text.len() + image.len());

	for candidate in text.into_iter().chain(image) {
		if seen.insert(candidate.id.clone()) {
			out.push(candidate);
		}
	}

	out
}

/// The first configured threshold that keeps at least `min_results` candidates, else the
/// last one. Each attempt filters the full set afresh.
pub fn escalate_threshold(cfg: &Assembly, candidates: &[Candidate]) -> f32 {
	let min_results = cfg.min_results as usize;

	for &threshold in &cfg.thresholds {
		let surviving =
			candidates.iter().filter(|candidate| candidate.similarity >= threshold).count();

		if surviving >= min_results {
			return threshold;
		}
	}

	cfg.thresholds.last().copied().unwrap_or(0.0)
}

/// Picks the threshold from searched candidates alone, then appends the required-fetch
/// candidates. Searched candidates from a required source bypass the threshold too.
pub fn select_candidates(
	cfg: &Assembly,
	searched: Vec<Candidate>,
	required_fetch: Vec<Candidate>,
	required_source_ids: &[String],
) -> Selection {
	let relevance_threshold = escalate_threshold(cfg, &searched);
	let required: HashSet<&str> = required_source_ids.iter().map(String::as_str).collect();
	let kept: Vec<Candidate> = searched
		.into_iter()
		.filter(|candidate| {
			candidate.similarity >= relevance_threshold
				|| required.contains(candidate.source_id.as_str())
		})
		.collect();
	let candidates = merge_candidates(kept, required_fetch);

	debug!(
		relevance_threshold,
		surviving = candidates.len(),
		required = required.len(),
		"Selected candidates for assembly."
	);

	Selection { candidates, relevance_threshold }
}

/// Authority-weighted ordering followed by the per-source cap and the character budget.
pub fn finalize(
	cfg: &Assembly,
	selection: Selection,
	sources: &HashMap<String, Source>,
	required_source_ids: &[String],
) -> AssembledContext {
	let Selection { candidates, relevance_threshold } = selection;
	let pool_size = candidates.len();
	let required: HashSet<&str> = required_source_ids.iter().map(String::as_str).collect();
	let mut ordered: Vec<(f32, Candidate, Source)> = candidates
		.into_iter()
		.map(|candidate| {
			let source = resolve_source(sources, &candidate.source_id);
			let combined = cfg.relevance_weight * candidate.score()
				+ cfg.authority_weight * source.source_type.authority_weight();

			(combined, candidate, source)
		})
		.collect();

	ordered.sort_by(|(a_score, a, _), (b_score, b, _)| {
		cmp_f32_desc(*a_score, *b_score).then_with(|| a.id.cmp(&b.id))
	});

	let cap = per_source_cap(cfg, pool_size);
	let mut per_source: HashMap<String, usize> = HashMap::new();
	let diverse: Vec<(Candidate, Source)> = ordered
		.into_iter()
		.filter(|(_, candidate, _)| {
			if required.contains(candidate.source_id.as_str()) {
				return true;
			}

			let count = per_source.entry(candidate.source_id.clone()).or_insert(0);

			*count += 1;

			*count <= cap
		})
		.map(|(_, candidate, source)| (candidate, source))
		.collect();
	let budgeted = fit_budget(cfg, diverse);
	let total_chars: usize = budgeted.iter().map(|(content, ..)| content.chars().count()).sum();
	let total = budgeted.len();
	let chunks: Vec<RetrievedChunk> = budgeted
		.into_iter()
		.enumerate()
		.map(|(position, (content, truncated, candidate, source))| {
			let features =
				RankingFeatures::for_candidate(&candidate, source.source_type, position, total);

			RetrievedChunk {
				id: candidate.id,
				modality: candidate.modality,
				content,
				truncated,
				similarity: candidate.similarity,
				rank_score: candidate.rank_score,
				source_id: candidate.source_id,
				source,
				metadata: candidate.metadata,
				features,
			}
		})
		.collect();
	let included: HashSet<&str> = chunks.iter().map(|chunk| chunk.source_id.as_str()).collect();
	let mut excluded_seen = HashSet::new();
	let required_but_excluded: Vec<String> = required_source_ids
		.iter()
		.filter(|id| !included.contains(id.as_str()) && excluded_seen.insert(id.as_str()))
		.cloned()
		.collect();
	let chars_per_token = (cfg.chars_per_token as usize).max(1);

	if !required_but_excluded.is_empty() {
		debug!(missing = ?required_but_excluded, "Required sources missing from context.");
	}

	AssembledContext {
		total_chunks: chunks.len(),
		total_tokens: total_chars.div_ceil(chars_per_token),
		chunks,
		relevance_threshold,
		required_but_excluded,
	}
}

/// Full assembly with a single batched source lookup between selection and ordering.
pub async fn assemble(
	cfg: &Assembly,
	chunks: &dyn ChunkStore,
	text: ModalityResults,
	image: ModalityResults,
	required_source_ids: &[String],
) -> Result<AssembledContext> {
	let searched = merge_candidates(text.candidates, image.candidates);
	let required_fetch = merge_candidates(text.required, image.required);
	let selection = select_candidates(cfg, searched, required_fetch, required_source_ids);
	let source_ids = selection.source_ids();
	let sources: HashMap<String, Source> = if source_ids.is_empty() {
		HashMap::new()
	} else {
		chunks
			.sources_by_ids(&source_ids)
			.await?
			.into_iter()
			.map(Source::from_row)
			.map(|source| (source.id.clone(), source))
			.collect()
	};

	Ok(finalize(cfg, selection, &sources, required_source_ids))
}

pub fn per_source_cap(cfg: &Assembly, pool_size: usize) -> usize {
	if pool_size <= cfg.small_pool_size as usize {
		cfg.small_pool_max_chunks_per_source as usize
	} else {
		cfg.max_chunks_per_source as usize
	}
}

/// Caps `text` at `max_chars` chars, ending with an ellipsis when shortened.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
	if text.chars().count() <= max_chars {
		return (text.to_string(), false);
	}
	if max_chars == 0 {
		return (String::new(), true);
	}

	let mut out: String = text.chars().take(max_chars - 1).collect();

	out.truncate(out.trim_end().len());
	out.push(ELLIPSIS);

	(out, true)
}

fn resolve_source(sources: &HashMap<String, Source>, source_id: &str) -> Source {
	match sources.get(source_id) {
		Some(source) => source.clone(),
		None => {
			warn!(source_id, "Source metadata not found; treating as unknown authority.");

			Source::unresolved(source_id)
		},
	}
}

fn fit_budget(
	cfg: &Assembly,
	ordered: Vec<(Candidate, Source)>,
) -> Vec<(String, bool, Candidate, Source)> {
	let budget = cfg.max_context_chars as usize;
	let min_tail = cfg.min_tail_chars as usize;
	let mut used = 0_usize;
	let mut out = Vec::new();

	for (candidate, source) in ordered {
		let (content, truncated) = truncate_chars(&candidate.content, cfg.max_chunk_chars as usize);
		let len = content.chars().count();

		if used + len <= budget {
			used += len;

			out.push((content, truncated, candidate, source));

			continue;
		}

		let remaining = budget.saturating_sub(used);

		if remaining > 0 && remaining >= min_tail {
			let (tail, _) = truncate_chars(&content, remaining);

			out.push((tail, true, candidate, source));
		}

		break;
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truncation_counts_chars_and_marks_ellipsis() {
		assert_eq!(truncate_chars("short", 10), ("short".to_string(), false));
		assert_eq!(truncate_chars("abcdef", 4), ("abc…".to_string(), true));
		assert_eq!(truncate_chars("ab  cdef", 4), ("ab…".to_string(), true));
		assert_eq!(truncate_chars("ééééé", 3).0.chars().count(), 3);
		assert_eq!(truncate_chars("abc", 0), (String::new(), true));
	}

	#[test]
	fn small_pools_get_a_larger_cap() {
		let cfg = Assembly::default();

		assert_eq!(per_source_cap(&cfg, 6), 3);
		assert_eq!(per_source_cap(&cfg, 7), 2);
	}
}
