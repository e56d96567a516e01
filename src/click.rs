//! Click routing: reply, delete, fragment loading and named actions.

use crate::{
	field::{form_fields, named_field},
	patch::parse_detached,
	pipeline::closest_to_target,
	response::check_deletion,
	submission::{set_query_pair, Method},
	transport::OutboundRequest,
	Error, Widget,
};
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::rc::Rc;
use tracing::{instrument, trace, warn};
use url::Url;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventInit, HtmlAnchorElement, HtmlElement, HtmlFormElement};

const URI_ATTRIBUTE: &str = "data-uri";
const LOCAL_ID_ATTRIBUTE: &str = "data-local-id";
const AJAX_TARGET_ATTRIBUTE: &str = "data-ajax-target";
const ACTION_ATTRIBUTE: &str = "data-action";

fn done() -> LocalBoxFuture<'static, ()> {
	async {}.boxed_local()
}

impl Widget {
	/// Dispatches a click inside the root to the first matching flow.
	///
	/// Reply buttons take precedence over delete buttons, which take precedence over fragment links and then named actions.
	/// Clicks that match nothing are left alone.
	pub fn route_click(self: &Rc<Self>, event: &Event) -> LocalBoxFuture<'static, ()> {
		if let Some(button) = closest_to_target(event, &self.config.reply_selector) {
			self.reply(&button, event);
			done()
		} else if let Some(button) = closest_to_target(event, &self.config.delete_selector) {
			self.delete(&button, event)
		} else if let Some(trigger) = closest_to_target(event, &self.config.ajax_selector) {
			self.load_fragment(&trigger, event)
		} else if let Some(trigger) = closest_to_target(event, &self.config.action_selector) {
			self.invoke_action(&trigger, event);
			done()
		} else {
			done()
		}
	}

	/// Points the root's first form at the replied-to item and submits it.
	#[instrument(skip(self, button, event))]
	fn reply(self: &Rc<Self>, button: &Element, event: &Event) {
		let source = match button.closest(&self.config.reply_source_selector).ok().flatten() {
			Some(source) => source,
			None => return trace!("Reply button outside of a replyable item."),
		};
		event.prevent_default();
		let uri = source.get_attribute(URI_ATTRIBUTE).unwrap_or_default();

		let form = match self.first_form(|_| true) {
			Some(form) => form,
			None => return self.report(&Error::MissingCollaborator(self.config.messages.form_not_found.clone())),
		};
		match named_field(&form, &self.config.reply_field) {
			Some(field) => field.set_value(&uri),
			None => warn!("Reply form has no {:?} field.", self.config.reply_field),
		}

		let init = EventInit::new();
		init.set_bubbles(true);
		init.set_cancelable(true);
		let result = Event::new_with_event_init_dict("submit", &init).and_then(|submit| form.dispatch_event(&submit));
		if let Err(error) = result {
			self.report(&error.into());
		}
	}

	/// Asks the server to delete an item and hides it once it agreed.
	#[instrument(skip(self, button, event))]
	fn delete(self: &Rc<Self>, button: &Element, event: &Event) -> LocalBoxFuture<'static, ()> {
		let item = match button.closest(&self.config.delete_target_selector).ok().flatten() {
			Some(item) => item,
			None => {
				trace!("Delete button outside of a deletable item.");
				return done();
			}
		};
		event.prevent_default();

		let marker = &self.config.reply_collection_marker;
		let form = match self.first_form(|form| form.action().contains(marker.as_str())) {
			Some(form) => form,
			None => {
				self.report(&Error::MissingCollaborator(self.config.messages.form_not_found.clone()));
				return done();
			}
		};

		let request = match self.deletion_request(&form, &item) {
			Ok(request) => request,
			Err(error) => {
				self.report(&error);
				return done();
			}
		};
		trace!(url = %request.url, "Requesting deletion.");

		let widget = Rc::clone(self);
		let token = self.busy.acquire();
		async move {
			let result = async { check_deletion(widget.transport.send(request).await?.error_for_status()?) }.await;
			drop(token);
			match result {
				Ok(()) => hide(&item),
				Err(error) => widget.report(&error),
			}
		}
		.boxed_local()
	}

	fn deletion_request(&self, form: &HtmlFormElement, item: &Element) -> Result<OutboundRequest, Error> {
		let mut url = Url::parse(&form.action())?;
		set_query_pair(&mut url, "id", &item.get_attribute(LOCAL_ID_ATTRIBUTE).unwrap_or_default());
		set_query_pair(&mut url, "uri", &item.get_attribute(URI_ATTRIBUTE).unwrap_or_default());

		let csrf_token = form_fields(form)
			.into_iter()
			.map(|field| field.snapshot())
			.find(|field| field.kind == "hidden" && field.is_security_token())
			.map(|field| field.value)
			.unwrap_or_default();

		Ok(OutboundRequest::new(Method::delete(), url).with_header(&self.config.csrf_header, &csrf_token))
	}

	/// Fetches the page behind `trigger` and puts its main content into the element named by `data-ajax-target`.
	#[instrument(skip(self, trigger, event))]
	fn load_fragment(self: &Rc<Self>, trigger: &Element, event: &Event) -> LocalBoxFuture<'static, ()> {
		let target = match trigger.get_attribute(AJAX_TARGET_ATTRIBUTE).and_then(|id| self.document.get_element_by_id(&id)) {
			Some(target) => target,
			None => {
				trace!("Fragment target is missing.");
				return done();
			}
		};
		let url = match self.fragment_url(trigger) {
			Ok(Some(url)) => url,
			Ok(None) => {
				warn!("Fragment link without href.");
				return done();
			}
			Err(error) => {
				self.report(&error);
				return done();
			}
		};
		event.prevent_default();
		event.stop_propagation();
		trace!(%url, "Loading fragment.");

		let widget = Rc::clone(self);
		let token = self.busy.acquire();
		async move {
			let result = widget.inject_page(OutboundRequest::new(Method::get(), url), &target).await;
			drop(token);
			match result {
				Ok(()) => widget.host.announce_load(),
				Err(error) => widget.report(&error),
			}
		}
		.boxed_local()
	}

	fn fragment_url(&self, trigger: &Element) -> Result<Option<Url>, Error> {
		if let Some(anchor) = trigger.dyn_ref::<HtmlAnchorElement>() {
			let href = anchor.href();
			return if href.is_empty() { Ok(None) } else { Ok(Some(Url::parse(&href)?)) };
		}
		match trigger.get_attribute("href") {
			Some(href) => Ok(Some(Url::parse(&self.document.url()?)?.join(&href)?)),
			None => Ok(None),
		}
	}

	async fn inject_page(&self, request: OutboundRequest, target: &Element) -> Result<(), Error> {
		let response = self.transport.send(request).await?.error_for_status()?;
		let page = parse_detached(&response.body)?;

		let mut content = None;
		for selector in self.config.main_content_selector.split(',').map(str::trim).filter(|selector| !selector.is_empty()) {
			content = page.query_selector(selector)?;
			if content.is_some() {
				break;
			}
		}
		let content = content
			.or_else(|| page.document_element())
			.ok_or_else(|| Error::MissingCollaborator("fetched page has no content".to_owned()))?;

		target.set_inner_html(&content.inner_html());
		Ok(())
	}

	/// Runs the registered handler named by the trigger's `data-action`, if any.
	fn invoke_action(self: &Rc<Self>, trigger: &Element, event: &Event) {
		let name = trigger.get_attribute(ACTION_ATTRIBUTE).unwrap_or_default();
		let handler = self.actions.borrow().get(&name);
		match handler {
			Some(handler) => {
				trace!("Invoking action {:?}.", name);
				handler(self, event);
			}
			None => trace!("No action named {:?}.", name),
		}
	}

	fn first_form(&self, predicate: impl Fn(&HtmlFormElement) -> bool) -> Option<HtmlFormElement> {
		let forms = self.root.query_selector_all("form").ok()?;
		(0..forms.length())
			.filter_map(|i| forms.get(i))
			.filter_map(|node| node.dyn_into::<HtmlFormElement>().ok())
			.find(|form| predicate(form))
	}
}

fn hide(item: &Element) {
	match item.dyn_ref::<HtmlElement>() {
		Some(item) => {
			if let Err(error) = item.style().set_property("display", "none") {
				warn!("Failed to hide deleted item: {:?}", error);
			}
		}
		None => warn!("Deleted item isn't an HTML element; leaving it visible."),
	}
}
