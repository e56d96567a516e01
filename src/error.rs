use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Everything that can go wrong while enhancing the widget.
///
/// The [`Display`](`core::fmt::Display`) output of most variants is what ends up in front of the user,
/// so it's kept short and non-technical where the failure is the server's or the user's.
#[derive(Debug, Error)]
pub enum Error {
	/// A `required` field was empty. `index` is the field's position in the form's control list.
	#[error("required field {name:?} is empty")]
	Validation { index: usize, name: String },

	#[error("Request failed.")]
	RequestFailed { status: u16 },

	/// The server answered, but refused the operation.
	#[error("{0}")]
	Rejected(String),

	/// An element the operation depends on (like the reply form) isn't in the document.
	#[error("{0}")]
	MissingCollaborator(String),

	#[error("unrecognized response: {0}")]
	UnrecognizedResponse(String),

	#[error("invalid URL: {0}")]
	Url(#[from] url::ParseError),

	#[error("malformed structured data: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid action name {0:?}")]
	InvalidActionName(String),

	#[error("action {0:?} is already registered")]
	DuplicateAction(String),

	/// Raised by the browser, usually a DOM exception.
	#[error("{0}")]
	Js(String),

	/// A rejected `fetch` or an unreadable response body.
	#[error("{0}")]
	Http(#[from] gloo_net::Error),

	#[error("invalid request method {0:?}")]
	InvalidMethod(String),
}

impl From<JsValue> for Error {
	fn from(value: JsValue) -> Self {
		if let Some(error) = value.dyn_ref::<js_sys::Error>() {
			return Self::Js(String::from(error.message()));
		}
		match value.as_string() {
			Some(message) => Self::Js(message),
			None => Self::Js(format!("{:?}", value)),
		}
	}
}

impl From<Error> for JsValue {
	fn from(error: Error) -> Self {
		js_sys::Error::new(&error.to_string()).into()
	}
}
