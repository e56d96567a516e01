//! Browser services outside the widget's own subtree.

use tracing::{error, instrument, trace};
use wasm_bindgen::JsValue;
use web_sys::{Event, Window};

pub trait Host {
	/// Shows a blocking message.
	fn alert(&self, message: &str);
	fn open_popup(&self, url: &str);
	/// Replaces the address bar entry without navigating.
	fn replace_location(&self, url: &str);
	/// Tells page scripts that new content arrived, as if the page had just loaded.
	fn announce_load(&self);
}

#[derive(Clone, Debug)]
pub struct BrowserHost {
	window: Window,
	popup_features: String,
}

impl BrowserHost {
	#[must_use]
	pub fn new(window: Window, popup_features: &str) -> Self {
		Self {
			window,
			popup_features: popup_features.to_owned(),
		}
	}
}

impl Host for BrowserHost {
	fn alert(&self, message: &str) {
		if let Err(error) = self.window.alert_with_message(message) {
			error!("Failed to show alert: {:?}", error);
		}
	}

	#[instrument(skip(self))]
	fn open_popup(&self, url: &str) {
		match self.window.open_with_url_and_target_and_features(url, "_blank", &self.popup_features) {
			Ok(Some(_)) => trace!("Opened popup."),
			Ok(None) => error!("Popup was blocked."),
			Err(error) => error!("Failed to open popup: {:?}", error),
		}
	}

	#[instrument(skip(self))]
	fn replace_location(&self, url: &str) {
		let result = self.window.history().and_then(|history| {
			let state = history.state()?;
			let state = if state.is_null() || state.is_undefined() { JsValue::from(js_sys::Object::new()) } else { state };
			history.replace_state_with_url(&state, "", Some(url))
		});
		if let Err(error) = result {
			error!("Failed to replace history entry: {:?}", error);
		}
	}

	fn announce_load(&self) {
		let result = Event::new("load").and_then(|event| self.window.dispatch_event(&event));
		if let Err(error) = result {
			error!("Failed to dispatch load event: {:?}", error);
		}
	}
}
