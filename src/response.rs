//! Interpreting what the server sent back.

use crate::{transport::InboundResponse, Error};
use serde_json::Value;
use tracing::warn;

/// The recognized response kinds of a form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
	/// HTML to patch into the page. `location` is the final URL if the request was redirected.
	Fragment { html: String, location: Option<String> },
	/// Message to show in a blocking dialog.
	Alert(String),
	/// URL to open in a popup window.
	Popup(String),
	/// A content type the widget has no use for.
	Ignored,
}

impl Outcome {
	/// Branches on the content type of a successful response.
	///
	/// # Errors
	///
	/// [`Error::Json`] for malformed JSON, [`Error::UnrecognizedResponse`] for JSON that is neither an alert nor a popup.
	pub fn from_response(response: InboundResponse) -> Result<Self, Error> {
		let content_type = response.content_type.as_deref().unwrap_or_default().trim().to_ascii_lowercase();

		if content_type.starts_with("text/html") {
			Ok(Self::Fragment {
				html: response.body,
				location: Some(response.url).filter(|url| response.redirected && !url.is_empty()),
			})
		} else if content_type.starts_with("text/plain") {
			Ok(if response.body.is_empty() { Self::Ignored } else { Self::Alert(response.body) })
		} else if content_type.starts_with("application/") && content_type.contains("json") {
			Self::from_json(&serde_json::from_str(&response.body)?)
		} else {
			warn!("Ignoring response with content type {:?}.", content_type);
			Ok(Self::Ignored)
		}
	}

	/// A truthy `alert` takes precedence over a truthy `popup`.
	pub fn from_json(value: &Value) -> Result<Self, Error> {
		if let Some(alert) = value.get("alert").filter(|alert| is_truthy(alert)) {
			Ok(Self::Alert(display_string(alert)))
		} else if let Some(popup) = value.get("popup").filter(|popup| is_truthy(popup)) {
			Ok(Self::Popup(display_string(popup)))
		} else {
			Err(Error::UnrecognizedResponse(value.to_string()))
		}
	}
}

/// Checks the delete endpoint's `{"success": …, "error": …}` answer.
///
/// # Errors
///
/// [`Error::Rejected`] with the server's reason (or [`Error::RequestFailed`] without one) unless `success` is truthy.
pub fn check_deletion(response: InboundResponse) -> Result<(), Error> {
	let status = response.status;
	let value: Value = serde_json::from_str(&response.body)?;
	if value.get("success").map_or(false, is_truthy) {
		return Ok(());
	}
	match value.get("error").filter(|error| is_truthy(error)) {
		Some(error) => Err(Error::Rejected(display_string(error))),
		None => Err(Error::RequestFailed { status }),
	}
}

/// JavaScript truthiness, which is what the server's answers were designed against.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

fn display_string(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}
