use serde_json::{Map, Value};
use tracing::info;

use crop_config::{Config, Planner};
use crop_storage::db::Db;

use crate::{
	Error, PgStore, Providers, Result, Stores, assemble, hints,
	models::{AssembledContext, Modality, RetrievalPlan},
	planner::{self, InputType, PlanInput},
	search::{SearchOptions, VectorSearch},
};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RetrieveRequest {
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub structured_data: Option<Map<String, Value>>,
	#[serde(default)]
	pub crop: Option<String>,
	#[serde(default)]
	pub location: Option<String>,
	#[serde(default)]
	pub growth_stage: Option<String>,
	#[serde(default)]
	pub input_type: InputType,
	#[serde(default)]
	pub required_source_ids: Vec<String>,
}
impl RetrieveRequest {
	pub fn plan_input(&self) -> PlanInput<'_> {
		PlanInput {
			description: self.description.as_deref(),
			structured_data: self.structured_data.as_ref(),
			crop: self.crop.as_deref(),
			location: self.location.as_deref(),
			growth_stage: self.growth_stage.as_deref(),
			input_type: self.input_type,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetrieveResponse {
	pub plan: RetrievalPlan,
	pub context: AssembledContext,
}

pub struct RetrievalService {
	pub cfg: Config,
	pub providers: Providers,
	pub stores: Stores,
}
impl RetrievalService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, providers: Providers::default(), stores: Stores::postgres(PgStore::new(db)) }
	}

	pub fn with_parts(cfg: Config, providers: Providers, stores: Stores) -> Self {
		Self { cfg, providers, stores }
	}

	/// Runs one request end to end. Text and image search run concurrently. Finding no
	/// evidence is a successful, empty context.
	pub async fn retrieve(&self, req: RetrieveRequest) -> Result<RetrieveResponse> {
		validate_request(&self.cfg.planner, &req)?;

		let plan = planner::build_plan(&self.cfg.planner, &req.plan_input());
		let resolution = hints::resolve_hints(
			&self.cfg.hints,
			self.stores.chunks.as_ref(),
			self.stores.boosts.as_ref(),
			&plan.source_title_hints,
			&req.required_source_ids,
		)
		.await?;
		let required = resolution.required_source_ids.as_slice();
		let options = SearchOptions::from_config(
			&self.cfg.search,
			plan.crop.as_deref(),
			plan.region.as_deref(),
			&plan.topics,
			&resolution.source_boosts,
		);
		let text_search = self.vector_search(Modality::Text);
		let image_search = self.vector_search(Modality::Image);
		let (text, image) = tokio::try_join!(
			text_search.run(&plan.query, required, &options),
			image_search.run(&plan.query, required, &options),
		)?;
		let context = assemble::assemble(
			&self.cfg.assembly,
			self.stores.chunks.as_ref(),
			text,
			image,
			required,
		)
		.await?;

		info!(
			input_type = req.input_type.as_str(),
			chunks = context.total_chunks,
			tokens = context.total_tokens,
			relevance_threshold = context.relevance_threshold,
			required_but_excluded = context.required_but_excluded.len(),
			"Assembled retrieval context."
		);

		Ok(RetrieveResponse { plan, context })
	}

	fn vector_search(&self, modality: Modality) -> VectorSearch<'_> {
		VectorSearch {
			cfg: &self.cfg,
			providers: &self.providers,
			chunks: self.stores.chunks.as_ref(),
			modality,
		}
	}
}

pub fn validate_request(cfg: &Planner, req: &RetrieveRequest) -> Result<()> {
	if let Some(description) = req.description.as_deref()
		&& description.chars().count() > cfg.max_description_chars as usize
	{
		return Err(Error::InvalidRequest {
			message: format!(
				"description must be at most {} characters.",
				cfg.max_description_chars
			),
		});
	}

	if let Some(values) = req.structured_data.as_ref() {
		for (key, value) in values {
			if !is_supported_value(value) {
				return Err(Error::InvalidRequest {
					message: format!(
						"structured_data.{key} must be a number, a string, or a list of strings."
					),
				});
			}
		}
	}

	if req.required_source_ids.iter().any(|id| id.trim().is_empty()) {
		return Err(Error::InvalidRequest {
			message: "required_source_ids must not contain blank ids.".to_string(),
		});
	}

	Ok(())
}

fn is_supported_value(value: &Value) -> bool {
	match value {
		Value::Null | Value::String(_) => true,
		Value::Number(number) => number.as_f64().is_some_and(f64::is_finite),
		Value::Array(items) => items.iter().all(Value::is_string),
		Value::Bool(_) | Value::Object(_) => false,
	}
}
