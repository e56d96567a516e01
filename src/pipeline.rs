//! Form submissions replayed as background requests.

use crate::{
	field::{form_fields, named_field, Field},
	response::Outcome,
	submission::FormSnapshot,
	transport::OutboundRequest,
	Error, Widget,
};
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::rc::Rc;
use tracing::{instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{AddEventListenerOptions, Element, Event, HtmlElement, HtmlFormElement, SubmitEvent};

impl Widget {
	/// Handles a `submit` event from inside the root.
	///
	/// The default action is prevented before this returns. The request itself is sent by the returned future.
	pub fn submit(self: &Rc<Self>, event: &Event) -> LocalBoxFuture<'static, ()> {
		event.prevent_default();
		event.stop_propagation();

		let form = match event.target().and_then(|target| target.dyn_into::<HtmlFormElement>().ok()) {
			Some(form) => form,
			None => {
				warn!("Submit event without a form target.");
				return async {}.boxed_local();
			}
		};
		let submitter = event.dyn_ref::<SubmitEvent>().and_then(SubmitEvent::submitter);
		self.submit_form(&form, submitter.as_ref())
	}

	/// Validates and serializes `form` as if `submitter` had submitted it, then sends it.
	///
	/// Validation failures are shown on the offending field and nothing is sent.
	#[instrument(skip(self, form, submitter), fields(action = %form.action()))]
	pub fn submit_form(self: &Rc<Self>, form: &HtmlFormElement, submitter: Option<&HtmlElement>) -> LocalBoxFuture<'static, ()> {
		let fields = form_fields(form);
		let snapshot = FormSnapshot {
			action: form.action(),
			method: form.method(),
			method_override: form.get_attribute(crate::field::METHOD_OVERRIDE_ATTRIBUTE),
			fields: fields.iter().map(Field::snapshot).collect(),
			submitter: submitter.and_then(|submitter| Field::from_element(submitter)).map(|submitter| submitter.submitter_snapshot()),
		};

		let submission = match snapshot.into_submission(&self.config.csrf_header) {
			Ok(submission) => submission,
			Err(Error::Validation { index, name }) => {
				trace!("Required field {:?} is empty.", name);
				if let Some(field) = fields.get(index) {
					self.flag_invalid(field.element());
				}
				self.host.alert(&self.config.messages.required_fields);
				return async {}.boxed_local();
			}
			Err(error) => {
				self.report(&error);
				return async {}.boxed_local();
			}
		};
		trace!(method = %submission.method, url = %submission.url, "Built submission.");

		if let Some(reply_field) = named_field(form, &self.config.reply_field) {
			reply_field.set_value("");
		}

		self.send_and_apply(submission.into_request())
	}

	/// Marks `element` until it's focused next, and scrolls it into view.
	fn flag_invalid(&self, element: &HtmlElement) {
		let class = self.config.error_class.clone();
		if let Err(error) = element.class_list().add_1(&class) {
			warn!("Failed to mark invalid field: {:?}", error);
		}

		let target = element.clone();
		let clear = Closure::once_into_js(move || {
			if let Err(error) = target.class_list().remove_1(&class) {
				warn!("Failed to unmark field: {:?}", error);
			}
		});
		let options = AddEventListenerOptions::new();
		options.set_once(true);
		if let Err(error) = element.add_event_listener_with_callback_and_add_event_listener_options("focus", clear.unchecked_ref(), &options) {
			warn!("Failed to listen for focus: {:?}", error);
		}

		element.scroll_into_view_with_bool(false);
	}

	/// Sends `request` while busy and applies the response.
	pub(crate) fn send_and_apply(self: &Rc<Self>, request: OutboundRequest) -> LocalBoxFuture<'static, ()> {
		let widget = Rc::clone(self);
		let token = self.busy.acquire();
		async move {
			let result = widget.exchange(request).await;
			drop(token);
			if let Err(error) = result {
				widget.report(&error);
			}
		}
		.boxed_local()
	}

	async fn exchange(&self, request: OutboundRequest) -> Result<(), Error> {
		let response = self.transport.send(request).await?.error_for_status()?;
		let outcome = Outcome::from_response(response)?;

		let span = trace_span!("Applying outcome");
		let _enter = span.enter();
		match outcome {
			Outcome::Fragment { html, location } => {
				if let Some(location) = location {
					self.host.replace_location(&location);
				}
				self.patch(Some(&html))
			}
			Outcome::Alert(message) => {
				self.host.alert(&message);
				Ok(())
			}
			Outcome::Popup(url) => {
				self.host.open_popup(&url);
				Ok(())
			}
			Outcome::Ignored => Ok(()),
		}
	}
}

/// The nearest inclusive ancestor of the event's target that matches `selector`.
pub(crate) fn closest_to_target(event: &Event, selector: &str) -> Option<Element> {
	event.target().and_then(|target| target.dyn_into::<Element>().ok()).and_then(|element| element.closest(selector).ok().flatten())
}
