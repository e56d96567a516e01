//! Network access.
//!
//! Everything the widget sends goes through a [`Transport`], so the request/response handling can be
//! exercised against a scripted transport. [`FetchTransport`] is the real one.

use crate::{submission::Method, Error};
use futures_util::future::{FutureExt, LocalBoxFuture};
use gloo_net::http::RequestBuilder;
use tracing::{instrument, trace};
use url::{form_urlencoded, Url};

pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundRequest {
	pub method: Method,
	pub url: Url,
	pub headers: Vec<(String, String)>,
	pub body: Option<String>,
}

impl OutboundRequest {
	/// Every request announces itself as `XMLHttpRequest`, so the server answers with fragments.
	#[must_use]
	pub fn new(method: Method, url: Url) -> Self {
		Self {
			method,
			url,
			headers: vec![(REQUESTED_WITH_HEADER.to_owned(), REQUESTED_WITH_VALUE.to_owned())],
			body: None,
		}
	}

	/// Sets (or replaces, ignoring ASCII case) a header.
	#[must_use]
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
		self.headers.push((name.to_owned(), value.to_owned()));
		self
	}

	#[must_use]
	pub fn with_form_body(self, params: &[(String, String)]) -> Self {
		let body = form_urlencoded::Serializer::new(String::new()).extend_pairs(params).finish();
		let mut request = self.with_header("Content-Type", FORM_CONTENT_TYPE);
		request.body = Some(body);
		request
	}

	#[must_use]
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(existing, _)| existing.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
	}
}

/// What the widget needs to know about a response. The body is always read as text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundResponse {
	pub status: u16,
	pub redirected: bool,
	/// Final URL after redirects.
	pub url: String,
	pub content_type: Option<String>,
	pub body: String,
}

impl InboundResponse {
	#[must_use]
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// # Errors
	///
	/// [`Error::RequestFailed`] for any non-2xx status.
	pub fn error_for_status(self) -> Result<Self, Error> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(Error::RequestFailed { status: self.status })
		}
	}
}

pub trait Transport {
	fn send(&self, request: OutboundRequest) -> LocalBoxFuture<'_, Result<InboundResponse, Error>>;
}

/// [`Transport`] over [***fetch***](https://developer.mozilla.org/en-US/docs/Web/API/fetch), through `gloo-net`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

impl FetchTransport {
	#[must_use]
	pub fn new() -> Self {
		Self
	}

	#[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
	async fn fetch(&self, request: OutboundRequest) -> Result<InboundResponse, Error> {
		let mut builder = RequestBuilder::new(request.url.as_str()).method(http_method(&request.method)?);
		for (name, value) in &request.headers {
			builder = builder.header(name, value);
		}
		let outbound = match request.body {
			Some(body) => builder.body(body)?,
			None => builder.build()?,
		};

		let response = outbound.send().await?;
		trace!(status = response.status(), redirected = response.redirected(), "Received response.");

		Ok(InboundResponse {
			status: response.status(),
			redirected: response.redirected(),
			url: response.url(),
			content_type: response.headers().get("content-type"),
			body: response.text().await?,
		})
	}
}

fn http_method(method: &Method) -> Result<gloo_net::http::Method, Error> {
	gloo_net::http::Method::from_bytes(method.as_str().as_bytes()).map_err(|_| Error::InvalidMethod(method.to_string()))
}

impl Transport for FetchTransport {
	fn send(&self, request: OutboundRequest) -> LocalBoxFuture<'_, Result<InboundResponse, Error>> {
		self.fetch(request).boxed_local()
	}
}
