use serde_json::{Map, Value};
use tracing::debug;

use crop_config::{Planner, normalize_key};
use crop_domain::{crop, disease, soil, visual};

use crate::models::RetrievalPlan;

const STRUCTURED_CROP_KEYS: [&str; 3] = ["crop", "croptype", "cropname"];
const STRUCTURED_SYMPTOM_KEYS: [&str; 5] =
	["symptoms", "symptom", "visiblesymptoms", "observations", "notes"];

/// How the caller captured the diagnostic input. Every kind is planned the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
	#[default]
	Text,
	Photo,
	LabReport,
	Hybrid,
}
impl InputType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Photo => "photo",
			Self::LabReport => "lab_report",
			Self::Hybrid => "hybrid",
		}
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanInput<'a> {
	pub description: Option<&'a str>,
	pub structured_data: Option<&'a Map<String, Value>>,
	pub crop: Option<&'a str>,
	pub location: Option<&'a str>,
	pub growth_stage: Option<&'a str>,
	pub input_type: InputType,
}

/// Builds the retrieval plan. Absent or blank input yields an empty plan, never an error.
pub fn build_plan(cfg: &Planner, input: &PlanInput<'_>) -> RetrievalPlan {
	let structured = input.structured_data;
	let crop_name = non_blank(input.crop)
		.map(str::to_string)
		.or_else(|| structured.and_then(|values| structured_text(values, &STRUCTURED_CROP_KEYS)));
	let location = non_blank(input.location);
	let mut sentences = Vec::new();

	push_sentence(&mut sentences, input.description.unwrap_or_default());

	if let Some(crop_name) = crop_name.as_deref() {
		push_sentence(&mut sentences, &format!("Crop: {crop_name}"));
	}
	if let Some(location) = location {
		push_sentence(&mut sentences, &format!("Location: {location}"));
	}
	if let Some(stage) = non_blank(input.growth_stage) {
		push_sentence(&mut sentences, &format!("Growth stage: {stage}"));
	}
	if let Some(symptoms) =
		structured.and_then(|values| structured_text(values, &STRUCTURED_SYMPTOM_KEYS))
	{
		push_sentence(&mut sentences, &format!("Symptoms: {symptoms}"));
	}

	let free_text = sentences.join(" ");
	let signals = structured
		.map(|values| {
			soil::soil_signals(values, &cfg.nutrient_bands, cfg.max_soil_signals as usize)
		})
		.unwrap_or_default();

	if !signals.is_empty() {
		let phrases: Vec<&str> = signals.iter().map(|signal| signal.phrase.as_str()).collect();

		push_sentence(&mut sentences, &format!("Soil test signals: {}", phrases.join(", ")));
	}

	let diseases = disease::detect_diseases(&free_text, crop_name.as_deref());

	if !diseases.terms.is_empty() {
		push_sentence(
			&mut sentences,
			&format!("Possible disease terms: {}", diseases.terms.join(", ")),
		);
	}

	let cues = visual::detect_visual_cues(&free_text, cfg.max_visual_cues as usize);

	if !cues.is_empty() {
		push_sentence(&mut sentences, &format!("Visual cues: {}", cues.join(", ")));
	}

	debug!(
		input_type = input.input_type.as_str(),
		soil_signals = signals.len(),
		disease_rules = diseases.rules.len(),
		visual_cues = cues.len(),
		"Built retrieval plan."
	);

	RetrievalPlan {
		query: sentences.join(" "),
		topics: diseases.topics,
		source_title_hints: diseases.source_title_hints,
		crop: crop_name.map(|name| crop::normalize_crop(&name)).filter(|name| !name.is_empty()),
		region: location.map(str::to_string),
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

/// Appends a trimmed fragment as a sentence terminated by a period.
fn push_sentence(sentences: &mut Vec<String>, fragment: &str) {
	let trimmed = fragment.trim();

	if trimmed.is_empty() {
		return;
	}
	if trimmed.ends_with(['.', '!', '?']) {
		sentences.push(trimmed.to_string());
	} else {
		sentences.push(format!("{trimmed}."));
	}
}

/// First non-blank text under any of `keys`. Arrays of strings are joined.
fn structured_text(values: &Map<String, Value>, keys: &[&str]) -> Option<String> {
	values
		.iter()
		.filter(|(key, _)| keys.contains(&normalize_key(key).as_str()))
		.find_map(|(_, value)| match value {
			Value::String(text) => non_blank(Some(text.as_str())).map(str::to_string),
			Value::Array(items) => {
				let parts: Vec<&str> = items
					.iter()
					.filter_map(|item| non_blank(item.as_str()))
					.collect();

				(!parts.is_empty()).then(|| parts.join(", "))
			},
			_ => None,
		})
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn sentences_get_terminal_punctuation() {
		let mut sentences = Vec::new();

		push_sentence(&mut sentences, " spots on leaves ");
		push_sentence(&mut sentences, "Is it rust?");
		push_sentence(&mut sentences, "   ");

		assert_eq!(sentences, vec!["spots on leaves.", "Is it rust?"]);
	}

	#[test]
	fn structured_text_reads_strings_and_arrays() {
		let values = json!({ "Crop_Type": " Soybean ", "symptoms": ["wilting", " ", "stunting"] });
		let values = values.as_object().expect("object");

		assert_eq!(structured_text(values, &STRUCTURED_CROP_KEYS), Some("Soybean".to_string()));
		assert_eq!(
			structured_text(values, &STRUCTURED_SYMPTOM_KEYS),
			Some("wilting, stunting".to_string())
		);
		assert_eq!(structured_text(values, &["missing"]), None);
	}
}
