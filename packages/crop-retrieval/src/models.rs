use serde_json::Value;

use crop_storage::models::{ChunkRow, SourceRow};

pub use crop_storage::models::Modality;

use crate::features::RankingFeatures;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
	Government,
	UniversityExtension,
	ResearchPaper,
	Manufacturer,
	Retailer,
	Unknown,
}
impl SourceType {
	pub const MAX_AUTHORITY: u8 = 4;

	pub fn parse(raw: &str) -> Self {
		let normalized: String = raw
			.trim()
			.chars()
			.map(|ch| if ch == '-' || ch == ' ' { '_' } else { ch.to_ascii_uppercase() })
			.collect();

		match normalized.as_str() {
			"GOVERNMENT" => Self::Government,
			"UNIVERSITY_EXTENSION" => Self::UniversityExtension,
			"RESEARCH_PAPER" => Self::ResearchPaper,
			"MANUFACTURER" => Self::Manufacturer,
			"RETAILER" => Self::Retailer,
			_ => Self::Unknown,
		}
	}

	pub fn authority(self) -> u8 {
		match self {
			Self::Government => 4,
			Self::UniversityExtension => 3,
			Self::ResearchPaper => 2,
			Self::Manufacturer => 1,
			Self::Retailer | Self::Unknown => 0,
		}
	}

	/// Authority scaled to [0, 1].
	pub fn authority_weight(self) -> f32 {
		f32::from(self.authority()) / f32::from(Self::MAX_AUTHORITY)
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Source {
	pub id: String,
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	pub source_type: SourceType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub institution: Option<String>,
}
impl Source {
	pub fn from_row(row: SourceRow) -> Self {
		Self {
			id: row.source_id,
			title: row.title,
			url: row.url,
			source_type: SourceType::parse(&row.source_type),
			institution: row.institution,
		}
	}

	/// Placeholder for a source id the store no longer knows. It carries no authority.
	pub fn unresolved(id: &str) -> Self {
		Self {
			id: id.to_string(),
			title: String::new(),
			url: None,
			source_type: SourceType::Unknown,
			institution: None,
		}
	}
}

/// How the hybrid ranker arrived at a candidate's rank score.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankBreakdown {
	pub keyword_score: f32,
	pub metadata_boost: f32,
	pub source_boost: f32,
	pub crop_match: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candidate {
	pub id: String,
	pub modality: Modality,
	pub content: String,
	pub similarity: f32,
	pub source_id: String,
	pub metadata: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rank_score: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub breakdown: Option<RankBreakdown>,
}
impl Candidate {
	pub fn from_row(modality: Modality, row: ChunkRow) -> Self {
		Self {
			id: row.chunk_id,
			modality,
			content: row.content,
			similarity: clamp_unit(row.similarity),
			source_id: row.source_id,
			metadata: row.metadata,
			rank_score: None,
			breakdown: None,
		}
	}

	pub fn score(&self) -> f32 {
		self.rank_score.unwrap_or(self.similarity)
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetrievedChunk {
	pub id: String,
	pub modality: Modality,
	pub content: String,
	pub truncated: bool,
	pub similarity: f32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rank_score: Option<f32>,
	pub source_id: String,
	pub source: Source,
	pub metadata: Value,
	pub features: RankingFeatures,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssembledContext {
	pub chunks: Vec<RetrievedChunk>,
	pub total_chunks: usize,
	pub total_tokens: usize,
	pub relevance_threshold: f32,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub required_but_excluded: Vec<String>,
}
impl AssembledContext {
	pub fn empty(relevance_threshold: f32) -> Self {
		Self {
			chunks: Vec::new(),
			total_chunks: 0,
			total_tokens: 0,
			relevance_threshold,
			required_but_excluded: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RetrievalPlan {
	pub query: String,
	pub topics: Vec<String>,
	pub source_title_hints: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub crop: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub region: Option<String>,
}
impl RetrievalPlan {
	pub fn is_empty(&self) -> bool {
		self.query.is_empty() && self.topics.is_empty() && self.source_title_hints.is_empty()
	}
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
	if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_types_parse_loosely() {
		assert_eq!(SourceType::parse("university-extension"), SourceType::UniversityExtension);
		assert_eq!(SourceType::parse(" Government "), SourceType::Government);
		assert_eq!(SourceType::parse("blog"), SourceType::Unknown);
	}

	#[test]
	fn authority_ordinals_are_fixed() {
		let ordinals: Vec<u8> = [
			SourceType::Government,
			SourceType::UniversityExtension,
			SourceType::ResearchPaper,
			SourceType::Manufacturer,
			SourceType::Retailer,
			SourceType::Unknown,
		]
		.into_iter()
		.map(SourceType::authority)
		.collect();

		assert_eq!(ordinals, vec![4, 3, 2, 1, 0, 0]);
		assert_eq!(SourceType::UniversityExtension.authority_weight(), 0.75);
	}

	#[test]
	fn similarity_is_clamped_from_rows() {
		let row = ChunkRow {
			chunk_id: "c1".to_string(),
			source_id: "s1".to_string(),
			content: "text".to_string(),
			metadata: Value::Null,
			similarity: -0.3,
		};

		assert_eq!(Candidate::from_row(Modality::Text, row).similarity, 0.0);
		assert_eq!(clamp_unit(f32::NAN), 0.0);
		assert_eq!(clamp_unit(1.4), 1.0);
	}
}
