use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
	Text,
	Image,
}
impl Modality {
	pub const ALL: [Self; 2] = [Self::Text, Self::Image];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Image => "image",
		}
	}

	pub(crate) fn table(self) -> &'static str {
		match self {
			Self::Text => "text_chunks",
			Self::Image => "image_chunks",
		}
	}

	/// Column holding the searchable text. Image chunks are embedded by caption.
	pub(crate) fn content_column(self) -> &'static str {
		match self {
			Self::Text => "content",
			Self::Image => "caption",
		}
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChunkRow {
	pub chunk_id: String,
	pub source_id: String,
	pub content: String,
	pub metadata: Value,
	pub similarity: f32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceRow {
	pub source_id: String,
	pub title: String,
	pub url: Option<String>,
	pub source_type: String,
	pub institution: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceBoostRow {
	pub source_id: String,
	pub boost: f32,
}
