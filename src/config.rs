//! Widget configuration.
//!
//! Every field has a default matching the markup the server renders, so an empty JSON object (or no
//! configuration at all) is a valid configuration.

use crate::{poll::PollPolicy, Error};
use serde::Deserialize;
use tracing::{instrument, warn};
use web_sys::Element;

/// Name of the root element attribute [`Config::from_root`] reads.
pub const CONFIG_ATTRIBUTE: &str = "data-config";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// `id` of the widget root used by the JavaScript entry point.
	pub root_id: String,

	/// Prefix of every durable storage key.
	pub cache_namespace: String,
	/// Per-instance cache scope. [`None`] means "use the root element's `id`",
	/// an empty string disables scoping.
	pub cache_scope: Option<String>,

	/// Name of the security header mirrored from `csrf`-named fields.
	pub csrf_header: String,
	/// Name of the reply-context field that is cleared after each submission.
	pub reply_field: String,
	/// Path fragment identifying the form whose action handles replies (and their deletion).
	pub reply_collection_marker: String,

	pub reply_selector: String,
	pub reply_source_selector: String,
	pub delete_selector: String,
	pub delete_target_selector: String,
	pub ajax_selector: String,
	pub action_selector: String,

	pub structured_data_selector: String,
	pub main_content_selector: String,
	pub poll_selector: String,
	pub poll: PollPolicy,

	pub preview_block_id: String,
	pub preview_container_selector: String,
	pub preview_field: String,

	pub busy_class: String,
	pub error_class: String,
	pub hidden_class: String,

	pub popup_features: String,
	pub messages: Messages,
}

/// User-facing texts that don't come from the server.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Messages {
	pub required_fields: String,
	pub form_not_found: String,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			root_id: "messy-fediverse".to_owned(),
			cache_namespace: "messyFediverseFormCache".to_owned(),
			cache_scope: None,
			csrf_header: "X-CSRFToken".to_owned(),
			reply_field: "uri".to_owned(),
			reply_collection_marker: "/replies/".to_owned(),
			reply_selector: "button.reply-js".to_owned(),
			reply_source_selector: "[data-uri]".to_owned(),
			delete_selector: "button.delete-js".to_owned(),
			delete_target_selector: "[data-local-id]".to_owned(),
			ajax_selector: "[data-ajax-target]".to_owned(),
			action_selector: "[data-action]".to_owned(),
			structured_data_selector: r#"script[type="application/json"]"#.to_owned(),
			main_content_selector: "#messy-fediverse-block-main,main,body".to_owned(),
			poll_selector: ".fediverse-awaiting-post a".to_owned(),
			poll: PollPolicy::default(),
			preview_block_id: "messy-fediverse-preview".to_owned(),
			preview_container_selector: ".preview".to_owned(),
			preview_field: "content".to_owned(),
			busy_class: "loading".to_owned(),
			error_class: "error".to_owned(),
			hidden_class: "d-none".to_owned(),
			popup_features: "popup,width=640,height=640".to_owned(),
			messages: Messages::default(),
		}
	}
}

impl Default for Messages {
	fn default() -> Self {
		Self {
			required_fields: "Fill all required fields.".to_owned(),
			form_not_found: "Form not found".to_owned(),
		}
	}
}

impl Config {
	pub fn from_json(json: &str) -> Result<Self, Error> {
		Ok(serde_json::from_str(json)?)
	}

	/// Reads the configuration from the root's [`CONFIG_ATTRIBUTE`], falling back to the defaults
	/// (with a warning) if it's malformed.
	#[instrument]
	pub fn from_root(root: &Element) -> Self {
		let mut config = match root.get_attribute(CONFIG_ATTRIBUTE) {
			None => Self::default(),
			Some(json) if json.trim().is_empty() => Self::default(),
			Some(json) => Self::from_json(&json).unwrap_or_else(|error| {
				warn!("Ignoring malformed {}: {}", CONFIG_ATTRIBUTE, error);
				Self::default()
			}),
		};
		let id = root.id();
		if !id.is_empty() {
			config.root_id = id;
		}
		config
	}

	/// The effective cache scope for a root with the given `id`.
	#[must_use]
	pub fn cache_scope_for(&self, root_id: &str) -> String {
		self.cache_scope.clone().unwrap_or_else(|| root_id.to_owned())
	}
}
