use serde_json::{Map, Value, json};

use crop_config::default_nutrient_bands;
use crop_domain::{
	disease,
	soil::{self, BandLevel},
	visual,
};

fn values(json: Value) -> Map<String, Value> {
	json.as_object().cloned().expect("Fixture must be an object.")
}

#[test]
fn gray_leaf_spot_matches_for_corn() {
	let matches = disease::detect_diseases(
		"Rectangular gray lesions running parallel to the veins.",
		Some("Corn"),
	);

	assert_eq!(matches.rules, vec!["gray_leaf_spot"]);
	assert!(matches.topics.contains(&"gray-leaf-spot".to_string()));
	assert_eq!(matches.source_title_hints, vec!["Gray Leaf Spot".to_string()]);
	assert!(matches.terms.contains(&"Cercospora zeae-maydis".to_string()));
}

#[test]
fn crop_scoped_rules_skip_without_matching_crop() {
	let text = "Gray leaf spot is spreading.";

	assert!(disease::detect_diseases(text, None).is_empty());
	assert!(disease::detect_diseases(text, Some("soybean")).is_empty());
}

#[test]
fn every_matching_rule_contributes() {
	let matches = disease::detect_diseases(
		"Tar spot on upper leaves and orange pustules on the husks.",
		Some("corn"),
	);

	assert_eq!(matches.rules, vec!["tar_spot", "corn_rust"]);
	// Shared tags are unioned once.
	assert_eq!(matches.topics.iter().filter(|topic| *topic == "foliar-disease").count(), 1);
	assert!(matches.source_title_hints.contains(&"Tar Spot".to_string()));
	assert!(matches.source_title_hints.contains(&"Southern Rust".to_string()));
}

#[test]
fn generic_yellowing_matches_no_disease() {
	let matches = disease::detect_diseases("yellowing lower leaves. Crop: corn.", Some("corn"));

	assert!(matches.is_empty());
	assert!(matches.topics.is_empty());
}

#[test]
fn visual_cues_follow_table_order_and_cap() {
	let cues = visual::detect_visual_cues(
		"Wilting plants with brown lesions, yellow halos, and stunted growth.",
		10,
	);

	assert_eq!(cues, vec!["lesions", "halos", "chlorosis", "wilting", "stunting"]);

	let capped = visual::detect_visual_cues(
		"Wilting plants with brown lesions, yellow halos, and stunted growth.",
		2,
	);

	assert_eq!(capped, vec!["lesions", "halos"]);
	assert!(visual::detect_visual_cues("   ", 4).is_empty());
}

#[test]
fn soil_signals_flag_low_ph_and_nitrogen() {
	let signals =
		soil::soil_signals(&values(json!({ "ph": 5.0, "nitrogen": 10 })), &default_nutrient_bands(), 6);
	let phrases: Vec<&str> = signals.iter().map(|signal| signal.phrase.as_str()).collect();

	assert_eq!(phrases, vec!["acidic soil (low pH)", "low nitrogen"]);
	assert_eq!(signals[0].level, BandLevel::Low);
}

#[test]
fn soil_signals_accept_key_variants_and_numeric_strings() {
	let signals = soil::soil_signals(
		&values(json!({ "Organic_Matter": "1.2%", "CEC": 31, "baseSaturation": "n/a" })),
		&default_nutrient_bands(),
		6,
	);
	let phrases: Vec<&str> = signals.iter().map(|signal| signal.phrase.as_str()).collect();

	assert_eq!(phrases, vec!["low organic matter", "high CEC"]);
	assert_eq!(signals[1].level, BandLevel::High);
}

#[test]
fn soil_signals_are_capped() {
	let signals = soil::soil_signals(
		&values(json!({
			"ph": 4.8,
			"organicMatter": 1.0,
			"nitrogen": 5,
			"phosphorus": 4,
			"potassium": 60,
			"calcium": 300,
			"magnesium": 40,
			"sulfur": 3,
		})),
		&default_nutrient_bands(),
		6,
	);

	assert_eq!(signals.len(), 6);
	assert_eq!(signals[5].phrase, "low calcium");
}

#[test]
fn in_band_values_emit_nothing() {
	let signals = soil::soil_signals(
		&values(json!({ "ph": 6.5, "potassium": 180, "zinc": 2.0 })),
		&default_nutrient_bands(),
		6,
	);

	assert!(signals.is_empty());
}
