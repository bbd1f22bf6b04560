use serde_json::{Map, Value};

use crop_config::{NutrientBand, normalize_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandLevel {
	Low,
	High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoilSignal {
	pub label: String,
	pub value: f64,
	pub level: BandLevel,
	pub phrase: String,
}

/// Reads a numeric measurement from a structured value. Numeric strings count, anything
/// else is ignored.
pub fn numeric_value(value: &Value) -> Option<f64> {
	let number = match value {
		Value::Number(number) => number.as_f64(),
		Value::String(text) => text.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
		_ => None,
	}?;

	number.is_finite().then_some(number)
}

pub fn band_value(values: &Map<String, Value>, band: &NutrientBand) -> Option<f64> {
	let keys: Vec<String> = band.keys.iter().map(|key| normalize_key(key)).collect();

	values
		.iter()
		.filter(|(key, _)| keys.contains(&normalize_key(key)))
		.find_map(|(_, value)| numeric_value(value))
}

pub fn classify(band: &NutrientBand, value: f64) -> Option<BandLevel> {
	if band.low.is_some_and(|low| value < low) {
		return Some(BandLevel::Low);
	}
	if band.high.is_some_and(|high| value > high) {
		return Some(BandLevel::High);
	}

	None
}

/// Out-of-band measurements in band order, capped at `max_signals`.
pub fn soil_signals(
	values: &Map<String, Value>,
	bands: &[NutrientBand],
	max_signals: usize,
) -> Vec<SoilSignal> {
	let mut out = Vec::new();

	for band in bands {
		if out.len() >= max_signals {
			break;
		}

		let Some(value) = band_value(values, band) else { continue };
		let Some(level) = classify(band, value) else { continue };
		let phrase = match level {
			BandLevel::Low => band.low_phrase(),
			BandLevel::High => band.high_phrase(),
		};

		out.push(SoilSignal { label: band.label.clone(), value, level, phrase });
	}

	out
}
