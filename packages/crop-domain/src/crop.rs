const CROP_ALIASES: [(&str, &str); 4] =
	[("maize", "corn"), ("soya", "soybean"), ("soy bean", "soybean"), ("spring wheat", "wheat")];

pub fn normalize_crop(crop: &str) -> String {
	let lowered = crop.trim().to_lowercase();

	for (alias, canonical) in CROP_ALIASES {
		if lowered.contains(alias) {
			return lowered.replace(alias, canonical);
		}
	}

	lowered
}

/// A rule with no crops applies everywhere. A crop-scoped rule applies only when the
/// request names a crop that contains one of the rule's crop names.
pub fn crop_applies(rule_crops: &[&str], crop: Option<&str>) -> bool {
	if rule_crops.is_empty() {
		return true;
	}

	let Some(crop) = crop.map(normalize_crop).filter(|crop| !crop.is_empty()) else {
		return false;
	};

	rule_crops.iter().any(|rule_crop| crop.contains(rule_crop))
}
