//! Mirrors server-rendered fragments into the live document.

use crate::{
	field::{form_fields, Field},
	Error, Widget,
};
use serde_json::{Map, Value};
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, Level};
use wasm_bindgen::JsCast;
use web_sys::{Document, DomParser, Element, Event, EventInit, HtmlFormElement, SupportedType};

/// Dispatched (bubbling, cancelable) on each live element after its content was replaced.
pub const UPDATED_EVENT: &str = "updated";

/// Parses `html` into a detached document. Scripts in it don't run and its resources aren't fetched.
pub(crate) fn parse_detached(html: &str) -> Result<Document, Error> {
	Ok(DomParser::new()?.parse_from_string(html, SupportedType::TextHtml)?)
}

impl Widget {
	/// Applies a server fragment (if any) and refreshes everything derived from the widget's content:
	/// activity data, cached field values and the poll loop.
	///
	/// Every element of `content` with an `id` replaces the inner HTML of the live element with the same `id`
	/// and adds or overwrites its attributes. Attributes missing from the fragment are kept.
	#[instrument(skip(self, content), fields(content_len = content.map_or(0, str::len)))]
	pub fn patch(&self, content: Option<&str>) -> Result<(), Error> {
		if let Some(content) = content.filter(|content| !content.is_empty()) {
			self.replace_sections(content)?;
		}

		self.reload_activity_data()?;
		self.refill_cached_fields()?;
		self.arm_poll()
	}

	fn replace_sections(&self, content: &str) -> Result<(), Error> {
		let fragment = parse_detached(content)?;
		let sections = fragment.query_selector_all("[id]")?;
		let mut patched = 0_usize;

		for i in 0..sections.length() {
			let section = match sections.get(i).and_then(|node| node.dyn_into::<Element>().ok()) {
				Some(section) => section,
				None => continue,
			};
			let id = section.id();
			if id.is_empty() {
				continue;
			}

			let span = trace_span!("Patching section", id = id.as_str());
			let _enter = span.enter();
			let live = match self.document.get_element_by_id(&id) {
				Some(live) => live,
				None => {
					trace!("No live counterpart.");
					continue;
				}
			};

			live.set_inner_html(&section.inner_html());
			merge_attributes(&section, &live)?;

			let init = EventInit::new();
			init.set_bubbles(true);
			init.set_cancelable(true);
			live.dispatch_event(&Event::new_with_event_init_dict(UPDATED_EVENT, &init)?)?;
			patched += 1;
		}

		trace!("Patched {} of {} identified element(s).", patched, sections.length());
		Ok(())
	}

	fn reload_activity_data(&self) -> Result<(), Error> {
		let script = match self.root.query_selector(&self.config.structured_data_selector)? {
			Some(script) => script,
			None => return Ok(()),
		};
		let raw = script.text_content().unwrap_or_default();
		let raw = raw.trim();
		if raw.is_empty() {
			return Ok(());
		}

		let parsed = serde_json::from_str(raw).unwrap_or_else(|parse_error| {
			error!("JSON PARSE ERROR: {}", parse_error);
			Value::Object(Map::new())
		});
		*self.activity.borrow_mut() = parsed;
		Ok(())
	}

	/// Fills empty fields from the field cache. Fields with content are never touched.
	fn refill_cached_fields(&self) -> Result<(), Error> {
		let forms = self.root.query_selector_all("form")?;
		for i in 0..forms.length() {
			let form = match forms.get(i).and_then(|node| node.dyn_into::<HtmlFormElement>().ok()) {
				Some(form) => form,
				None => continue,
			};
			for field in form_fields(&form) {
				self.refill(&field);
			}
		}
		Ok(())
	}

	fn refill(&self, field: &Field) {
		if !field.snapshot().is_refillable() {
			return;
		}
		let name = field.name();
		if let Some(value) = self.cache.recall(&name) {
			if STATIC_MAX_LEVEL >= Level::TRACE && cfg!(feature = "dangerous-logging") {
				trace!("Refilling {:?} with {:?}.", name, value);
			}
			field.set_value(&value);
		}
	}
}

/// Adds or overwrites every attribute of `source` on `target`.
fn merge_attributes(source: &Element, target: &Element) -> Result<(), Error> {
	let attributes = source.attributes();
	for i in 0..attributes.length() {
		if let Some(attribute) = attributes.item(i) {
			let name = attribute.name();
			if !name.is_empty() {
				target.set_attribute(&name, &attribute.value())?;
			}
		}
	}
	Ok(())
}
