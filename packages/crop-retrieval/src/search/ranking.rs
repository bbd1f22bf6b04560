mod text;

pub use text::{extract_keywords, keyword_score, tokenize};

use std::{cmp::Ordering, collections::HashMap};

use serde_json::Value;

use crop_config::Ranking;

use crate::models::{Candidate, RankBreakdown, clamp_unit};

/// Query-side signals the hybrid ranker scores candidates against.
#[derive(Debug, Clone, Copy)]
pub struct RankingSignals<'a> {
	pub crop: Option<&'a str>,
	pub region: Option<&'a str>,
	pub topics: &'a [String],
	pub source_boosts: &'a HashMap<String, f32>,
	pub keyword_boost: f32,
}

/// Sets `rank_score` on every candidate. Boosts are added to similarity and the sum is
/// clamped to [0, 1].
pub fn rank_candidates(
	candidates: &mut [Candidate],
	query_text: &str,
	signals: &RankingSignals<'_>,
	cfg: &Ranking,
) {
	let keywords = extract_keywords(query_text, cfg);

	for candidate in candidates.iter_mut() {
		if keywords.is_empty() {
			candidate.rank_score = Some(candidate.similarity);
			candidate.breakdown = Some(RankBreakdown::default());

			continue;
		}

		let keyword_score = keyword_score(&keywords, &candidate.content);
		let crop_match = signals.crop.is_some_and(|crop| metadata_has_crop(&candidate.metadata, crop));
		let topic_matches = matching_topic_count(&candidate.metadata, signals.topics);
		let region_match =
			signals.region.is_some_and(|region| metadata_has_region(&candidate.metadata, region));
		let mut metadata_boost = 0.0;

		if crop_match {
			metadata_boost += cfg.crop_boost;
		}

		metadata_boost += (topic_matches as f32 * cfg.topic_boost_per_match).min(cfg.topic_boost_max);

		if region_match {
			metadata_boost += cfg.region_boost;
		}

		let source_boost = signals.source_boosts.get(&candidate.source_id).copied().unwrap_or(0.0);
		let score = candidate.similarity
			+ keyword_score * signals.keyword_boost
			+ metadata_boost
			+ source_boost;

		candidate.rank_score = Some(clamp_unit(score));
		candidate.breakdown =
			Some(RankBreakdown { keyword_score, metadata_boost, source_boost, crop_match });
	}
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Best rank score first. Equal scores fall back to similarity, then id.
pub fn cmp_ranked(a: &Candidate, b: &Candidate) -> Ordering {
	cmp_f32_desc(a.score(), b.score())
		.then_with(|| cmp_f32_desc(a.similarity, b.similarity))
		.then_with(|| a.id.cmp(&b.id))
}

fn string_list(value: Option<&Value>) -> Vec<&str> {
	match value {
		Some(Value::String(item)) => vec![item.as_str()],
		Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
		_ => Vec::new(),
	}
}

fn metadata_has_crop(metadata: &Value, crop: &str) -> bool {
	let crop = crop.trim();

	if crop.is_empty() {
		return false;
	}

	let mut crops = string_list(metadata.get("crops"));

	crops.extend(string_list(metadata.get("crop")));

	crops.iter().any(|item| item.trim().eq_ignore_ascii_case(crop))
}

fn matching_topic_count(metadata: &Value, topics: &[String]) -> usize {
	if topics.is_empty() {
		return 0;
	}

	let tagged = string_list(metadata.get("topics"));

	topics
		.iter()
		.filter(|topic| tagged.iter().any(|item| item.trim().eq_ignore_ascii_case(topic)))
		.count()
}

fn metadata_has_region(metadata: &Value, region: &str) -> bool {
	let region = region.trim().to_lowercase();

	if region.is_empty() {
		return false;
	}

	metadata
		.get("region")
		.and_then(Value::as_str)
		.is_some_and(|value| value.to_lowercase().contains(&region))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::models::Modality;

	fn candidate(id: &str, content: &str, similarity: f32, metadata: Value) -> Candidate {
		Candidate {
			id: id.to_string(),
			modality: Modality::Text,
			content: content.to_string(),
			similarity,
			source_id: format!("src-{id}"),
			metadata,
			rank_score: None,
			breakdown: None,
		}
	}

	fn signals<'a>(boosts: &'a HashMap<String, f32>, topics: &'a [String]) -> RankingSignals<'a> {
		RankingSignals {
			crop: Some("corn"),
			region: Some("iowa"),
			topics,
			source_boosts: boosts,
			keyword_boost: 0.08,
		}
	}

	#[test]
	fn no_keywords_keeps_similarity() {
		let boosts = HashMap::from([("src-a".to_string(), 0.2)]);
		let mut candidates = vec![candidate("a", "corn lesions", 0.42, json!({ "crops": ["corn"] }))];

		rank_candidates(&mut candidates, "Crop: pH.", &signals(&boosts, &[]), &Ranking::default());

		assert_eq!(candidates[0].rank_score, Some(0.42));
		assert_eq!(candidates[0].breakdown, Some(RankBreakdown::default()));
	}

	#[test]
	fn boosts_are_additive() {
		let boosts = HashMap::from([("src-a".to_string(), 0.1)]);
		let topics = vec!["gray-leaf-spot".to_string(), "foliar-disease".to_string()];
		let mut candidates = vec![candidate(
			"a",
			"Gray lesions on corn leaves",
			0.5,
			json!({
				"crops": ["Corn"],
				"topics": ["foliar-disease", "gray-leaf-spot"],
				"region": "Central Iowa",
			}),
		)];

		rank_candidates(
			&mut candidates,
			"lesions leaves tassel",
			&signals(&boosts, &topics),
			&Ranking::default(),
		);

		let breakdown = candidates[0].breakdown.expect("ranked");
		let expected = 0.5 + (2.0 / 3.0) * 0.08 + 0.06 + 0.04 + 0.03 + 0.1;

		assert!(breakdown.crop_match);
		assert!((breakdown.metadata_boost - 0.13).abs() < 1e-5);
		assert!((candidates[0].rank_score.expect("ranked") - expected).abs() < 1e-5);
	}

	#[test]
	fn topic_boost_is_capped() {
		let boosts = HashMap::new();
		let topics: Vec<String> = (0..5).map(|i| format!("t{i}")).collect();
		let mut candidates = vec![candidate(
			"a",
			"nothing relevant",
			0.3,
			json!({ "topics": ["t0", "t1", "t2", "t3", "t4"] }),
		)];

		rank_candidates(&mut candidates, "lesions", &signals(&boosts, &topics), &Ranking::default());

		let breakdown = candidates[0].breakdown.expect("ranked");

		assert!((breakdown.metadata_boost - 0.06).abs() < 1e-6);
	}

	#[test]
	fn rank_score_stays_in_unit_range() {
		let boosts =
			HashMap::from([("src-a".to_string(), 0.25), ("src-b".to_string(), -0.25)]);
		let mut candidates = vec![
			candidate("a", "lesions", 0.98, json!({ "crops": ["corn"] })),
			candidate("b", "other", 0.1, json!({})),
		];

		rank_candidates(&mut candidates, "lesions", &signals(&boosts, &[]), &Ranking::default());

		for candidate in &candidates {
			let score = candidate.rank_score.expect("ranked");

			assert!((0.0..=1.0).contains(&score));
		}

		assert_eq!(candidates[0].rank_score, Some(1.0));
		assert_eq!(candidates[1].rank_score, Some(0.0));
	}

	#[test]
	fn crop_match_is_exact_ignoring_case() {
		let metadata = json!({ "crops": ["Sweet Corn"], "crop": "CORN" });

		assert!(metadata_has_crop(&metadata, "corn"));
		assert!(!metadata_has_crop(&json!({ "crops": ["sweet corn"] }), "corn"));
	}

	#[test]
	fn nan_sorts_last() {
		assert_eq!(cmp_f32_desc(0.9, 0.1), Ordering::Less);
		assert_eq!(cmp_f32_desc(f32::NAN, 0.1), Ordering::Greater);
	}
}
