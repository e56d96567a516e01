use crate::submission::{FieldSnapshot, SubmitterSnapshot};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlButtonElement, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

/// Attribute through which forms and their controls override the request method.
pub const METHOD_OVERRIDE_ATTRIBUTE: &str = "data-method";

/// A form control with a name and a value.
#[derive(Clone, Debug)]
pub enum Field {
	Input(HtmlInputElement),
	TextArea(HtmlTextAreaElement),
	Select(HtmlSelectElement),
	Button(HtmlButtonElement),
}

impl Field {
	/// [`None`] for elements that aren't value-carrying controls (`<fieldset>`, `<output>`, …).
	#[must_use]
	pub fn from_element(element: &Element) -> Option<Self> {
		if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
			Some(Self::Input(input.clone()))
		} else if let Some(text_area) = element.dyn_ref::<HtmlTextAreaElement>() {
			Some(Self::TextArea(text_area.clone()))
		} else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
			Some(Self::Select(select.clone()))
		} else {
			element.dyn_ref::<HtmlButtonElement>().cloned().map(Self::Button)
		}
	}

	#[must_use]
	pub fn element(&self) -> &HtmlElement {
		match self {
			Self::Input(input) => &**input,
			Self::TextArea(text_area) => &**text_area,
			Self::Select(select) => &**select,
			Self::Button(button) => &**button,
		}
	}

	#[must_use]
	pub fn name(&self) -> String {
		match self {
			Self::Input(input) => input.name(),
			Self::TextArea(text_area) => text_area.name(),
			Self::Select(select) => select.name(),
			Self::Button(button) => button.name(),
		}
	}

	#[must_use]
	pub fn value(&self) -> String {
		match self {
			Self::Input(input) => input.value(),
			Self::TextArea(text_area) => text_area.value(),
			Self::Select(select) => select.value(),
			Self::Button(button) => button.value(),
		}
	}

	pub fn set_value(&self, value: &str) {
		match self {
			Self::Input(input) => input.set_value(value),
			Self::TextArea(text_area) => text_area.set_value(value),
			Self::Select(select) => select.set_value(value),
			Self::Button(button) => button.set_value(value),
		}
	}

	/// Lower-cased `type`.
	#[must_use]
	pub fn kind(&self) -> String {
		match self {
			Self::Input(input) => input.type_(),
			Self::TextArea(text_area) => text_area.type_(),
			Self::Select(select) => select.type_(),
			Self::Button(button) => button.type_(),
		}
		.to_ascii_lowercase()
	}

	#[must_use]
	pub fn required(&self) -> bool {
		match self {
			Self::Input(input) => input.required(),
			Self::TextArea(text_area) => text_area.required(),
			Self::Select(select) => select.required(),
			Self::Button(_) => false,
		}
	}

	#[must_use]
	pub fn checked(&self) -> Option<bool> {
		match self {
			Self::Input(input) if matches!(input.type_().to_ascii_lowercase().as_str(), "checkbox" | "radio") => Some(input.checked()),
			_ => None,
		}
	}

	#[must_use]
	pub fn method_override(&self) -> Option<String> {
		self.element().get_attribute(METHOD_OVERRIDE_ATTRIBUTE)
	}

	#[must_use]
	pub fn snapshot(&self) -> FieldSnapshot {
		FieldSnapshot {
			name: self.name(),
			value: self.value(),
			kind: self.kind(),
			required: self.required(),
			checked: self.checked(),
		}
	}

	#[must_use]
	pub fn submitter_snapshot(&self) -> SubmitterSnapshot {
		SubmitterSnapshot {
			name: self.name(),
			value: self.value(),
			method_override: self.method_override(),
		}
	}
}

/// The form's controls in document order.
#[must_use]
pub fn form_fields(form: &HtmlFormElement) -> Vec<Field> {
	let elements = form.elements();
	(0..elements.length()).filter_map(|i| elements.item(i)).filter_map(|element| Field::from_element(&element)).collect()
}

/// The control named `name`, if it's a single one.
#[must_use]
pub fn named_field(form: &HtmlFormElement, name: &str) -> Option<Field> {
	form.elements().named_item(name).and_then(|element| Field::from_element(&element))
}
