//! Per-chunk ranking features in the column order the learned re-ranker trains on.

use crate::models::{Candidate, SourceType};

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankingFeatures {
	pub f0_similarity: f32,
	pub f1_rank_score: f32,
	pub f2_authority: f32,
	pub f3_source_boost: f32,
	pub f4_crop_match: f32,
	pub f5_term_density: f32,
	pub f6_chunk_pos: f32,
}
impl RankingFeatures {
	pub const COLUMNS: [&'static str; 7] = [
		"f0_similarity",
		"f1_rank_score",
		"f2_authority",
		"f3_source_boost",
		"f4_crop_match",
		"f5_term_density",
		"f6_chunk_pos",
	];

	/// `position` is the chunk's index in the final list of `total` chunks.
	pub fn for_candidate(
		candidate: &Candidate,
		source_type: SourceType,
		position: usize,
		total: usize,
	) -> Self {
		let breakdown = candidate.breakdown.unwrap_or_default();

		Self {
			f0_similarity: candidate.similarity,
			f1_rank_score: candidate.score(),
			f2_authority: source_type.authority_weight(),
			f3_source_boost: breakdown.source_boost,
			f4_crop_match: if breakdown.crop_match { 1.0 } else { 0.0 },
			f5_term_density: breakdown.keyword_score,
			f6_chunk_pos: if total == 0 { 0.0 } else { position as f32 / total as f32 },
		}
	}

	pub fn as_row(&self) -> [f32; 7] {
		[
			self.f0_similarity,
			self.f1_rank_score,
			self.f2_authority,
			self.f3_source_boost,
			self.f4_crop_match,
			self.f5_term_density,
			self.f6_chunk_pos,
		]
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::models::{Modality, RankBreakdown};

	#[test]
	fn row_follows_column_order() {
		let candidate = Candidate {
			id: "c1".to_string(),
			modality: Modality::Text,
			content: "lesions".to_string(),
			similarity: 0.6,
			source_id: "s1".to_string(),
			metadata: json!({}),
			rank_score: Some(0.7),
			breakdown: Some(RankBreakdown {
				keyword_score: 0.5,
				metadata_boost: 0.06,
				source_boost: 0.04,
				crop_match: true,
			}),
		};
		let features = RankingFeatures::for_candidate(&candidate, SourceType::Government, 1, 4);

		assert_eq!(features.as_row(), [0.6, 0.7, 1.0, 0.04, 1.0, 0.5, 0.25]);
		assert_eq!(RankingFeatures::COLUMNS.len(), features.as_row().len());
	}

	#[test]
	fn unranked_candidates_fall_back_to_similarity() {
		let candidate = Candidate {
			id: "c1".to_string(),
			modality: Modality::Image,
			content: "caption".to_string(),
			similarity: 0.3,
			source_id: "s1".to_string(),
			metadata: json!({}),
			rank_score: None,
			breakdown: None,
		};
		let features = RankingFeatures::for_candidate(&candidate, SourceType::Unknown, 0, 1);

		assert_eq!(features.f1_rank_score, 0.3);
		assert_eq!(features.f4_crop_match, 0.0);
		assert_eq!(features.f6_chunk_pos, 0.0);
	}
}
