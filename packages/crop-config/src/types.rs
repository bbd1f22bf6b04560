use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub ranking: Ranking,
	#[serde(default)]
	pub hints: Hints,
	#[serde(default)]
	pub assembly: Assembly,
	#[serde(default)]
	pub planner: Planner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Create the chunk and source tables on startup when they are missing.
	#[serde(default)]
	pub ensure_schema: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	/// Dimensionality of the text chunk embedding space.
	pub text_dimensions: u32,
	/// Dimensionality of the image caption embedding space.
	pub image_dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub text_limit: u32,
	pub image_limit: u32,
	/// Raw similarity floor. Boosts never lift a candidate over it.
	pub min_similarity: f32,
	pub candidate_multiplier: u32,
	pub keyword_boost: f32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			text_limit: 12,
			image_limit: 4,
			min_similarity: 0.2,
			candidate_multiplier: 4,
			keyword_boost: 0.08,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub max_keywords: u32,
	pub min_keyword_chars: u32,
	pub crop_boost: f32,
	pub topic_boost_per_match: f32,
	pub topic_boost_max: f32,
	pub region_boost: f32,
	pub stopwords: Vec<String>,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			max_keywords: 10,
			min_keyword_chars: 4,
			crop_boost: 0.06,
			topic_boost_per_match: 0.02,
			topic_boost_max: 0.06,
			region_boost: 0.03,
			stopwords: default_stopwords(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Hints {
	/// Additive boost for every source that a title hint or the caller marked as required.
	pub required_boost: f32,
	/// Upper bound on the magnitude of any single source's total boost.
	pub max_source_boost: f32,
}
impl Default for Hints {
	fn default() -> Self {
		Self { required_boost: 0.12, max_source_boost: 0.25 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Assembly {
	/// Similarity thresholds tried in order until one keeps `min_results` candidates.
	pub thresholds: Vec<f32>,
	pub min_results: u32,
	pub max_chunks_per_source: u32,
	/// Pools at or below this size use `small_pool_max_chunks_per_source`.
	pub small_pool_size: u32,
	pub small_pool_max_chunks_per_source: u32,
	pub max_chunk_chars: u32,
	pub max_context_chars: u32,
	pub min_tail_chars: u32,
	pub chars_per_token: u32,
	pub relevance_weight: f32,
	pub authority_weight: f32,
}
impl Default for Assembly {
	fn default() -> Self {
		Self {
			thresholds: vec![0.5, 0.4, 0.35],
			min_results: 4,
			max_chunks_per_source: 2,
			small_pool_size: 6,
			small_pool_max_chunks_per_source: 3,
			max_chunk_chars: 1_200,
			max_context_chars: 12_000,
			min_tail_chars: 200,
			chars_per_token: 3,
			relevance_weight: 0.8,
			authority_weight: 0.2,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Planner {
	pub max_soil_signals: u32,
	pub max_visual_cues: u32,
	pub max_description_chars: u32,
	pub nutrient_bands: Vec<NutrientBand>,
}
impl Default for Planner {
	fn default() -> Self {
		Self {
			max_soil_signals: 6,
			max_visual_cues: 6,
			max_description_chars: 8_000,
			nutrient_bands: default_nutrient_bands(),
		}
	}
}

/// Reference band for one soil test measurement.
#[derive(Debug, Clone, Deserialize)]
pub struct NutrientBand {
	/// Structured-data keys that carry this measurement, compared after lowercasing and
	/// dropping non-alphanumeric characters.
	pub keys: Vec<String>,
	pub label: String,
	pub low: Option<f64>,
	pub high: Option<f64>,
	pub low_phrase: Option<String>,
	pub high_phrase: Option<String>,
}
impl NutrientBand {
	fn new(keys: &[&str], label: &str, low: Option<f64>, high: Option<f64>) -> Self {
		Self {
			keys: keys.iter().map(|key| key.to_string()).collect(),
			label: label.to_string(),
			low,
			high,
			low_phrase: None,
			high_phrase: None,
		}
	}

	fn with_phrases(mut self, low: &str, high: &str) -> Self {
		self.low_phrase = Some(low.to_string());
		self.high_phrase = Some(high.to_string());

		self
	}

	pub fn low_phrase(&self) -> String {
		self.low_phrase.clone().unwrap_or_else(|| format!("low {}", self.label))
	}

	pub fn high_phrase(&self) -> String {
		self.high_phrase.clone().unwrap_or_else(|| format!("high {}", self.label))
	}
}

pub fn default_stopwords() -> Vec<String> {
	[
		"crop", "crops", "soil", "soils", "symptom", "symptoms", "plant", "plants", "field",
		"fields", "growth", "stage", "location", "possible", "disease", "diseases", "terms",
		"visual", "cues", "test", "signals", "with", "that", "this", "from", "have", "there",
		"their", "some", "about", "into", "after", "also", "been", "were", "what", "when",
		"which", "while", "very", "more", "most", "like", "look", "looks", "appear", "appears",
		"seeing", "noticed", "started", "showing",
	]
	.into_iter()
	.map(str::to_string)
	.collect()
}

pub fn default_nutrient_bands() -> Vec<NutrientBand> {
	vec![
		NutrientBand::new(&["ph", "soilph", "phlevel"], "pH", Some(5.5), Some(7.5))
			.with_phrases("acidic soil (low pH)", "alkaline soil (high pH)"),
		NutrientBand::new(&["organicmatter", "om"], "organic matter", Some(2.0), None),
		NutrientBand::new(&["nitrogen", "n", "nitraten", "no3n"], "nitrogen", Some(15.0), Some(50.0)),
		NutrientBand::new(&["phosphorus", "p"], "phosphorus", Some(15.0), Some(50.0)),
		NutrientBand::new(&["potassium", "k"], "potassium", Some(120.0), Some(300.0)),
		NutrientBand::new(&["calcium", "ca"], "calcium", Some(1_000.0), None),
		NutrientBand::new(&["magnesium", "mg"], "magnesium", Some(100.0), None),
		NutrientBand::new(&["sulfur", "sulphur", "s"], "sulfur", Some(10.0), None),
		NutrientBand::new(&["zinc", "zn"], "zinc", Some(1.0), None),
		NutrientBand::new(&["manganese", "mn"], "manganese", Some(5.0), Some(100.0)),
		NutrientBand::new(&["iron", "fe"], "iron", Some(4.5), None),
		NutrientBand::new(&["copper", "cu"], "copper", Some(0.2), None),
		NutrientBand::new(&["boron", "b"], "boron", Some(0.5), Some(2.0)),
		NutrientBand::new(&["cec", "cationexchangecapacity"], "CEC", Some(5.0), Some(25.0)),
		NutrientBand::new(&["basesaturation"], "base saturation", Some(60.0), Some(90.0)),
	]
}
