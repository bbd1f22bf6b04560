use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

use crate::crop;

/// One disease signature: a pattern over the combined free text, the crops it is scoped to,
/// and what a match contributes to the retrieval plan.
#[derive(Debug)]
pub struct DiseaseRule {
	pub name: &'static str,
	pub pattern: Regex,
	pub crops: &'static [&'static str],
	pub topics: &'static [&'static str],
	pub source_hints: &'static [&'static str],
	pub terms: &'static [&'static str],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiseaseMatches {
	pub rules: Vec<&'static str>,
	pub topics: Vec<String>,
	pub source_title_hints: Vec<String>,
	pub terms: Vec<String>,
}
impl DiseaseMatches {
	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}

struct RuleSpec {
	name: &'static str,
	pattern: &'static str,
	crops: &'static [&'static str],
	topics: &'static [&'static str],
	source_hints: &'static [&'static str],
	terms: &'static [&'static str],
}

const RULE_SPECS: &[RuleSpec] = &[
	RuleSpec {
		name: "gray_leaf_spot",
		pattern: r"(?i)\b(gray|grey)\s+leaf\s+spot\b|\brectangular\s+(gray|grey|tan)\s+lesions?\b",
		crops: &["corn"],
		topics: &["gray-leaf-spot", "foliar-disease"],
		source_hints: &["Gray Leaf Spot"],
		terms: &["Cercospora zeae-maydis", "gray leaf spot"],
	},
	RuleSpec {
		name: "northern_corn_leaf_blight",
		pattern: r"(?i)\bnorthern\s+(corn\s+)?leaf\s+blight\b|\bcigar[- ]shaped\s+lesions?\b|\bnclb\b",
		crops: &["corn"],
		topics: &["northern-corn-leaf-blight", "foliar-disease"],
		source_hints: &["Northern Corn Leaf Blight"],
		terms: &["Exserohilum turcicum", "northern corn leaf blight"],
	},
	RuleSpec {
		name: "tar_spot",
		pattern: r"(?i)\btar\s+spots?\b|\bblack\s+(raised\s+)?(spots|specks|stromata)\b",
		crops: &["corn"],
		topics: &["tar-spot", "foliar-disease"],
		source_hints: &["Tar Spot"],
		terms: &["Phyllachora maydis", "tar spot"],
	},
	RuleSpec {
		name: "corn_rust",
		pattern: r"(?i)\b(southern|common)\s+rust\b|\borange\s+pustules?\b|\brust[- ]colored\s+pustules?\b",
		crops: &["corn"],
		topics: &["rust", "foliar-disease"],
		source_hints: &["Southern Rust", "Common Rust"],
		terms: &["Puccinia polysora", "Puccinia sorghi"],
	},
	RuleSpec {
		name: "gosss_wilt",
		pattern: r"(?i)\bgoss'?s?\s+wilt\b|\bbacterial\s+leaf\s+(streak|blight)\b",
		crops: &["corn"],
		topics: &["gosss-wilt", "bacterial-disease"],
		source_hints: &["Goss's Wilt"],
		terms: &["Clavibacter nebraskensis", "Goss's bacterial wilt"],
	},
	RuleSpec {
		name: "sudden_death_syndrome",
		pattern: r"(?i)\bsudden\s+death\s+syndrome\b|\bsds\b|\binterveinal\s+(chlorosis|yellowing)\b.*\b(necrosis|necrotic|scorch)",
		crops: &["soybean"],
		topics: &["sudden-death-syndrome", "root-disease"],
		source_hints: &["Sudden Death Syndrome"],
		terms: &["Fusarium virguliforme", "sudden death syndrome"],
	},
	RuleSpec {
		name: "white_mold",
		pattern: r"(?i)\bwhite\s+mou?ld\b|\bcottony\s+(growth|mycelium)\b|\bsclerotia\b",
		crops: &["soybean"],
		topics: &["white-mold", "stem-disease"],
		source_hints: &["White Mold"],
		terms: &["Sclerotinia sclerotiorum", "Sclerotinia stem rot"],
	},
	RuleSpec {
		name: "frogeye_leaf_spot",
		pattern: r"(?i)\bfrog[- ]?eye\b|\bcircular\s+lesions?\s+with\s+(reddish|purple|dark)\s+(borders?|margins?)\b",
		crops: &["soybean"],
		topics: &["frogeye-leaf-spot", "foliar-disease"],
		source_hints: &["Frogeye Leaf Spot"],
		terms: &["Cercospora sojina", "frogeye leaf spot"],
	},
	RuleSpec {
		name: "soybean_cyst_nematode",
		pattern: r"(?i)\bcyst\s+nematodes?\b|\bscn\b|\bwhite\s+cysts?\s+on\s+roots\b",
		crops: &["soybean"],
		topics: &["soybean-cyst-nematode", "nematode"],
		source_hints: &["Soybean Cyst Nematode"],
		terms: &["Heterodera glycines", "soybean cyst nematode"],
	},
	RuleSpec {
		name: "fusarium_head_blight",
		pattern: r"(?i)\bhead\s+blight\b|\bhead\s+scab\b|\bbleached\s+(spikelets?|heads?)\b|\bpink\s+(mold|kernels?)\b",
		crops: &["wheat", "barley"],
		topics: &["fusarium-head-blight", "head-disease"],
		source_hints: &["Fusarium Head Blight"],
		terms: &["Fusarium graminearum", "deoxynivalenol"],
	},
	RuleSpec {
		name: "stripe_rust",
		pattern: r"(?i)\b(stripe|yellow)\s+rust\b|\brows?\s+of\s+(yellow|orange)\s+pustules?\b",
		crops: &["wheat", "barley"],
		topics: &["stripe-rust", "rust", "foliar-disease"],
		source_hints: &["Stripe Rust"],
		terms: &["Puccinia striiformis", "stripe rust"],
	},
	RuleSpec {
		name: "early_blight",
		pattern: r"(?i)\bearly\s+blight\b|\btarget[- ]like\s+(spots|lesions)\b|\bconcentric\s+rings?\b",
		crops: &["tomato", "potato"],
		topics: &["early-blight", "foliar-disease"],
		source_hints: &["Early Blight"],
		terms: &["Alternaria solani", "early blight"],
	},
	RuleSpec {
		name: "late_blight",
		pattern: r"(?i)\blate\s+blight\b|\bwater[- ]soaked\s+(lesions?|spots?)\b|\bwhite\s+fuzzy\s+growth\b",
		crops: &["tomato", "potato"],
		topics: &["late-blight", "foliar-disease"],
		source_hints: &["Late Blight"],
		terms: &["Phytophthora infestans", "late blight"],
	},
	RuleSpec {
		name: "septoria_leaf_spot",
		pattern: r"(?i)\bseptoria\b|\bsmall\s+circular\s+spots?\s+with\s+(gray|grey|tan)\s+centers?\b",
		crops: &["tomato", "wheat"],
		topics: &["septoria", "foliar-disease"],
		source_hints: &["Septoria"],
		terms: &["Septoria lycopersici", "Zymoseptoria tritici"],
	},
];

static DISEASE_RULES: LazyLock<Vec<DiseaseRule>> = LazyLock::new(|| {
	RULE_SPECS
		.iter()
		.filter_map(|spec| {
			let pattern = Regex::new(spec.pattern).ok()?;

			Some(DiseaseRule {
				name: spec.name,
				pattern,
				crops: spec.crops,
				topics: spec.topics,
				source_hints: spec.source_hints,
				terms: spec.terms,
			})
		})
		.collect()
});

pub fn disease_rules() -> &'static [DiseaseRule] {
	DISEASE_RULES.as_slice()
}

pub fn detect_diseases(text: &str, crop: Option<&str>) -> DiseaseMatches {
	detect_with(disease_rules(), text, crop)
}

/// Evaluates every applicable rule and unions what the matches contribute. All matching
/// rules count, not only the first.
pub fn detect_with(rules: &[DiseaseRule], text: &str, crop: Option<&str>) -> DiseaseMatches {
	let mut out = DiseaseMatches::default();

	if text.trim().is_empty() {
		return out;
	}

	let mut seen_topics = HashSet::new();
	let mut seen_hints = HashSet::new();
	let mut seen_terms = HashSet::new();

	for rule in rules {
		if !crop::crop_applies(rule.crops, crop) || !rule.pattern.is_match(text) {
			continue;
		}

		out.rules.push(rule.name);

		push_unique(&mut out.topics, &mut seen_topics, rule.topics);
		push_unique(&mut out.source_title_hints, &mut seen_hints, rule.source_hints);
		push_unique(&mut out.terms, &mut seen_terms, rule.terms);
	}

	out
}

fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<&'static str>, values: &[&'static str]) {
	for value in values.iter().copied() {
		if seen.insert(value) {
			out.push(value.to_string());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_rule_pattern_compiles() {
		assert_eq!(disease_rules().len(), RULE_SPECS.len());
	}
}
