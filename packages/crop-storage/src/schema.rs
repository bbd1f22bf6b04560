const INIT_SQL: &str = include_str!("../sql/init.sql");

/// The bundled schema with both embedding dimensions filled in. Text and image chunks live in
/// separate tables because their vector columns differ in width.
pub fn render_schema(text_dim: u32, image_dim: u32) -> String {
	INIT_SQL
		.replace("<TEXT_DIM>", &text_dim.to_string())
		.replace("<IMAGE_DIM>", &image_dim.to_string())
}

pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}
