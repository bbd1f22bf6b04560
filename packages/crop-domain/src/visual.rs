use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug)]
pub struct VisualCueRule {
	pub cue: &'static str,
	pub pattern: Regex,
}

const CUE_SPECS: &[(&str, &str)] = &[
	("lesions", r"(?i)\blesions?\b"),
	("halos", r"(?i)\bhalos?\b|\byellow\s+rings?\s+around\b"),
	("pustules", r"(?i)\bpustules?\b|\bpowdery\s+(orange|brown|red)\b"),
	("chlorosis", r"(?i)\bchloro(sis|tic)\b|\byellow(ing|ed)?\b"),
	("interveinal chlorosis", r"(?i)\binterveinal\b|\bbetween\s+(the\s+)?veins\b"),
	("necrosis", r"(?i)\bnecro(sis|tic)\b|\bdead\s+tissue\b"),
	("leaf scorch", r"(?i)\bscorch(ed|ing)?\b|\bburn(ed|t)?\s+(leaf\s+)?(edges|margins|tips)\b"),
	("wilting", r"(?i)\bwilt(ed|ing)?\b|\bdroop(ing|y)?\b"),
	("stunting", r"(?i)\bstunt(ed|ing)?\b"),
	("mottling", r"(?i)\bmottl(ed|ing)\b|\bmosaic\b"),
	("leaf curl", r"(?i)\bcurl(ed|ing)?\b|\bcupp(ed|ing)\b"),
	("spots", r"(?i)\bspots?\b|\bspeck(s|led)\b|\bflecks?\b"),
	("streaks", r"(?i)\bstreak(s|ed|ing)?\b|\bstripe[sd]?\b"),
	("purpling", r"(?i)\bpurpl(e|ing|ish)\b|\breddish\b"),
	("mold growth", r"(?i)\bmou?ld(y)?\b|\bfuzzy\b|\bpowdery\s+(white|gray|grey)\b"),
	("rot", r"(?i)\brot(ting|ted|s)?\b|\bcankers?\b|\bmushy\b"),
];

static VISUAL_CUE_RULES: LazyLock<Vec<VisualCueRule>> = LazyLock::new(|| {
	CUE_SPECS
		.iter()
		.filter_map(|&(cue, pattern)| {
			Regex::new(pattern).ok().map(|pattern| VisualCueRule { cue, pattern })
		})
		.collect()
});

pub fn visual_cue_rules() -> &'static [VisualCueRule] {
	VISUAL_CUE_RULES.as_slice()
}

/// Matched cues in table order, at most `max_cues`. Cues are crop-agnostic.
pub fn detect_visual_cues(text: &str, max_cues: usize) -> Vec<&'static str> {
	if text.trim().is_empty() || max_cues == 0 {
		return Vec::new();
	}

	visual_cue_rules()
		.iter()
		.filter(|rule| rule.pattern.is_match(text))
		.map(|rule| rule.cue)
		.take(max_cues)
		.collect()
}
