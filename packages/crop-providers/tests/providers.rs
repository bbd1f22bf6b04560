use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Map, Value};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		crop_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
	assert_eq!(headers.get(CONTENT_TYPE).expect("Missing content type."), "application/json");
}

#[test]
fn forwards_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-org".to_string(), Value::String("cropcopilot".to_string()));

	let headers =
		crop_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");

	assert_eq!(headers.get("x-org").expect("Missing default header."), "cropcopilot");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	assert!(crop_providers::auth_headers("secret", &defaults).is_err());
}
