use std::collections::HashSet;

use crop_config::Ranking;

/// Lowercased alphanumeric tokens in order of appearance.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split(|ch: char| !ch.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_lowercase)
}

/// Up to `max_keywords` distinct query keywords, skipping short tokens and stopwords.
pub fn extract_keywords(query: &str, cfg: &Ranking) -> Vec<String> {
	let max_keywords = cfg.max_keywords as usize;
	let min_chars = cfg.min_keyword_chars as usize;
	let stopwords: HashSet<&str> = cfg.stopwords.iter().map(String::as_str).collect();
	let mut out = Vec::new();
	let mut seen = HashSet::new();

	if max_keywords == 0 {
		return out;
	}

	for token in tokenize(query) {
		if token.chars().count() < min_chars || stopwords.contains(token.as_str()) {
			continue;
		}
		if seen.insert(token.clone()) {
			out.push(token);
		}
		if out.len() >= max_keywords {
			break;
		}
	}

	out
}

/// Share of keywords that occur in the lowercased content, in [0, 1].
pub fn keyword_score(keywords: &[String], content: &str) -> f32 {
	if keywords.is_empty() {
		return 0.0;
	}

	let haystack = content.to_lowercase();
	let matched = keywords.iter().filter(|keyword| haystack.contains(keyword.as_str())).count();

	matched as f32 / keywords.len() as f32
}
