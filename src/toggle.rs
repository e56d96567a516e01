//! Show/hide behaviour: checkbox-driven toggles and the preview switch.

use crate::{
	field::{named_field, Field},
	Widget,
};
use std::rc::Rc;
use tracing::{instrument, trace, warn};
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlFormElement};

/// Name under which [`Widget::toggle_preview`] is registered as an action.
pub const TOGGLE_PREVIEW_ACTION: &str = "togglePreview";

/// On a checkbox, selects the elements that are shown while it's checked and hidden otherwise.
pub const TOGGLE_ATTRIBUTE: &str = "data-toggle";

impl Widget {
	/// Applies a checkbox's `data-toggle` to the document. Anything else is ignored.
	pub(crate) fn toggle_display_for(&self, field: &Field) {
		let checked = match (field, field.checked()) {
			(Field::Input(_), Some(checked)) if field.kind() == "checkbox" => checked,
			_ => return,
		};
		let selector = match field.element().get_attribute(TOGGLE_ATTRIBUTE) {
			Some(selector) if !selector.trim().is_empty() => selector,
			_ => return,
		};

		let targets = match self.document.query_selector_all(&selector) {
			Ok(targets) => targets,
			Err(error) => return warn!("Invalid {} selector {:?}: {:?}", TOGGLE_ATTRIBUTE, selector, error),
		};
		for i in 0..targets.length() {
			if let Some(target) = targets.get(i).and_then(|node| node.dyn_into::<Element>().ok()) {
				self.set_hidden(&target, !checked);
			}
		}
	}

	/// Switches between a form and its rendered preview.
	///
	/// Triggered from inside a form, fills the preview from the form's content field and shows it in place of the form.
	/// Triggered from anywhere else (the preview's own controls), hides the preview and shows the form again.
	#[instrument(skip(self, event))]
	pub fn toggle_preview(self: &Rc<Self>, event: &Event) {
		let block = match self.document.get_element_by_id(&self.config.preview_block_id) {
			Some(block) => block,
			None => return warn!("No #{} block to preview in.", self.config.preview_block_id),
		};

		let form = event
			.target()
			.and_then(|target| target.dyn_into::<Element>().ok())
			.and_then(|element| element.closest("form").ok().flatten())
			.and_then(|form| form.dyn_into::<HtmlFormElement>().ok());

		match form {
			Some(form) => {
				event.prevent_default();
				let content = named_field(&form, &self.config.preview_field).map(|field| field.value()).unwrap_or_default();
				match block.query_selector(&self.config.preview_container_selector) {
					Ok(Some(container)) => container.set_inner_html(&content),
					Ok(None) => warn!("Preview block has no {:?} container.", self.config.preview_container_selector),
					Err(error) => warn!("Invalid preview container selector: {:?}", error),
				}
				self.set_hidden(&form, true);
				self.set_hidden(&block, false);
				*self.preview_form.borrow_mut() = Some(form);
				trace!("Showing preview.");
			}
			None => {
				self.set_hidden(&block, true);
				if let Some(form) = self.preview_form.borrow().as_ref() {
					self.set_hidden(form, false);
				}
				trace!("Showing form.");
			}
		}
	}

	fn set_hidden(&self, element: &Element, hidden: bool) {
		let class_list = element.class_list();
		let result = if hidden {
			class_list.add_1(&self.config.hidden_class)
		} else {
			class_list.remove_1(&self.config.hidden_class)
		};
		if let Err(error) = result {
			warn!("Failed to toggle {:?}: {:?}", self.config.hidden_class, error);
		}
	}
}
