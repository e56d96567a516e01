//! Turning a form into a request, without touching the DOM.
//!
//! [`FormSnapshot`] is a plain copy of everything a native submission would look at.
//! [`FormSnapshot::into_submission`] applies the method precedence, validation and serialization rules
//! and yields a [`FormSubmission`], which in turn becomes an [`OutboundRequest`].

use crate::{transport::OutboundRequest, Error};
use core::fmt::{self, Display, Formatter};
use url::Url;

/// Upper-cased HTTP method name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Method(String);

impl Method {
	/// Returns [`None`] for blank input.
	#[must_use]
	pub fn parse(raw: &str) -> Option<Self> {
		let trimmed = raw.trim();
		if trimmed.is_empty() {
			None
		} else {
			Some(Self(trimmed.to_ascii_uppercase()))
		}
	}

	#[must_use]
	pub fn get() -> Self {
		Self("GET".to_owned())
	}

	#[must_use]
	pub fn delete() -> Self {
		Self("DELETE".to_owned())
	}

	#[must_use]
	pub fn is_get(&self) -> bool {
		self.0 == "GET"
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for Method {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Most specific override wins: submitting control, then the form's `data-method`, then the form's own method.
#[must_use]
pub fn resolve_method(native: &str, form_override: Option<&str>, control_override: Option<&str>) -> Method {
	control_override
		.and_then(Method::parse)
		.or_else(|| form_override.and_then(Method::parse))
		.or_else(|| Method::parse(native))
		.unwrap_or_else(Method::get)
}

/// The submission-relevant state of one form control.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSnapshot {
	pub name: String,
	pub value: String,
	/// Lower-cased control type, like `text`, `hidden`, `submit` or `textarea`.
	pub kind: String,
	pub required: bool,
	/// Checkedness for checkboxes and radio buttons, [`None`] for everything else.
	pub checked: Option<bool>,
}

impl FieldSnapshot {
	#[must_use]
	pub fn is_missing(&self) -> bool {
		self.required && self.value.is_empty()
	}

	/// Whether a native submission would send this field.
	#[must_use]
	pub fn is_successful(&self) -> bool {
		!self.name.is_empty() && !self.value.is_empty() && self.kind != "submit" && self.checked != Some(false)
	}

	#[must_use]
	pub fn is_security_token(&self) -> bool {
		self.name.to_ascii_lowercase().contains("csrf")
	}

	/// Whether the field cache may fill this field in.
	#[must_use]
	pub fn is_refillable(&self) -> bool {
		!self.name.is_empty() && self.value.is_empty() && self.kind != "hidden" && self.kind != "submit"
	}
}

/// The control that triggered a submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitterSnapshot {
	pub name: String,
	pub value: String,
	pub method_override: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormSnapshot {
	/// The resolved `action` URL.
	pub action: String,
	/// The form's own `method` property.
	pub method: String,
	/// The form's `data-method` attribute.
	pub method_override: Option<String>,
	pub fields: Vec<FieldSnapshot>,
	pub submitter: Option<SubmitterSnapshot>,
}

/// One submission's request, before encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormSubmission {
	pub url: Url,
	pub method: Method,
	pub headers: Vec<(String, String)>,
	/// Query parameters for `GET`, form-encoded body otherwise.
	pub params: Vec<(String, String)>,
}

impl FormSnapshot {
	/// # Errors
	///
	/// [`Error::Validation`] for the first (in document order) required field without a value,
	/// [`Error::Url`] if the action isn't an absolute URL.
	pub fn into_submission(self, csrf_header: &str) -> Result<FormSubmission, Error> {
		let method = resolve_method(
			&self.method,
			self.method_override.as_deref(),
			self.submitter.as_ref().and_then(|submitter| submitter.method_override.as_deref()),
		);

		if let Some((index, field)) = self.fields.iter().enumerate().find(|(_, field)| field.is_missing()) {
			return Err(Error::Validation {
				index,
				name: field.name.clone(),
			});
		}

		let mut url = Url::parse(&self.action)?;
		let mut params: Vec<(String, String)> = if method.is_get() { url.query_pairs().into_owned().collect() } else { Vec::new() };
		let mut headers = Vec::new();

		for field in self.fields.into_iter().filter(FieldSnapshot::is_successful) {
			if field.is_security_token() {
				set_pair(&mut headers, csrf_header, &field.value);
			}
			set_pair(&mut params, &field.name, &field.value);
		}

		if let Some(SubmitterSnapshot { name, value, .. }) = self.submitter {
			if !name.is_empty() && !value.is_empty() {
				params.retain(|(existing, _)| *existing != name);
				params.push((name, value));
			}
		}

		if method.is_get() {
			url.set_query(None);
			if !params.is_empty() {
				url.query_pairs_mut().extend_pairs(&params);
			}
		}

		Ok(FormSubmission { url, method, headers, params })
	}
}

impl FormSubmission {
	#[must_use]
	pub fn into_request(self) -> OutboundRequest {
		let is_get = self.method.is_get();
		let mut request = OutboundRequest::new(self.method, self.url);
		for (name, value) in self.headers {
			request = request.with_header(&name, &value);
		}
		if is_get {
			request
		} else {
			request.with_form_body(&self.params)
		}
	}
}

/// `URLSearchParams.set` semantics: overwrite the first pair named `name` and drop the others, or append.
pub(crate) fn set_pair(pairs: &mut Vec<(String, String)>, name: &str, value: &str) {
	match pairs.iter().position(|(existing, _)| existing == name) {
		Some(first) => {
			pairs[first].1 = value.to_owned();
			let mut i = 0;
			pairs.retain(|(existing, _)| {
				i += 1;
				i - 1 == first || existing != name
			});
		}
		None => pairs.push((name.to_owned(), value.to_owned())),
	}
}

pub(crate) fn set_query_pair(url: &mut Url, name: &str, value: &str) {
	let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
	set_pair(&mut pairs, name, value);
	url.query_pairs_mut().clear().extend_pairs(&pairs);
}
