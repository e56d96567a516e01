#![doc(html_root_url = "https://docs.rs/messy-fediverse-dom/0.1.0")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod actions;
pub mod busy;
pub mod cache;
mod click;
pub mod config;
mod error;
pub mod field;
pub mod host;
pub mod patch;
mod pipeline;
pub mod poll;
pub mod response;
pub mod submission;
pub mod toggle;
pub mod transport;
mod widget;

pub use config::Config;
pub use error::Error;
pub use field::Field;
pub use widget::{Dependencies, Widget};

use core::cell::RefCell;
use tracing::{error, instrument, trace};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::Window;

thread_local! {
	static LOAD_LISTENER: RefCell<Option<Closure<dyn Fn()>>> = RefCell::new(None);
}

/// Enhances the page's widget (`#messy-fediverse` unless its `data-config` says otherwise), now and after every window `load`.
///
/// Calling this more than once is harmless.
///
/// # Errors
///
/// Iff there is no `window` or attaching fails.
#[wasm_bindgen(js_name = initMessyFediverse)]
pub fn init() -> Result<(), JsValue> {
	install_subscriber();
	let window = web_sys::window().ok_or_else(|| Error::MissingCollaborator("window".to_owned()))?;
	attach_to_page(&window, None)?;
	reattach_on_load(&window, None)?;
	Ok(())
}

/// Like [`init`], with configuration given as JSON instead of being read from the root element.
///
/// # Errors
///
/// Iff `config` is malformed, there is no `window` or attaching fails.
#[wasm_bindgen(js_name = initMessyFediverseWithConfig)]
pub fn init_with_config(config: &str) -> Result<(), JsValue> {
	install_subscriber();
	let config = Config::from_json(config)?;
	let window = web_sys::window().ok_or_else(|| Error::MissingCollaborator("window".to_owned()))?;
	attach_to_page(&window, Some(&config))?;
	reattach_on_load(&window, Some(config))?;
	Ok(())
}

/// Attaches to the configured root if it's in the document and not enhanced yet.
#[instrument(skip(window, config))]
fn attach_to_page(window: &Window, config: Option<&Config>) -> Result<(), Error> {
	let document = window.document().ok_or_else(|| Error::MissingCollaborator("document".to_owned()))?;
	let root_id = config.map_or_else(|| Config::default().root_id, |config| config.root_id.clone());
	let root = match document.get_element_by_id(&root_id) {
		Some(root) => root,
		None => {
			trace!("No #{} in the document.", root_id);
			return Ok(());
		}
	};
	if Widget::attached_to(&root).is_some() {
		return Ok(());
	}

	let config = config.cloned().unwrap_or_else(|| Config::from_root(&root));
	let dependencies = Dependencies::browser(window, &config)?;
	Widget::attach(root, config, dependencies).map(drop)
}

fn reattach_on_load(window: &Window, config: Option<Config>) -> Result<(), Error> {
	LOAD_LISTENER.with(|listener| {
		let mut listener = listener.borrow_mut();
		if listener.is_some() {
			return Ok(());
		}

		let on_load = {
			let window = window.clone();
			Closure::wrap(Box::new(move || {
				if let Err(error) = attach_to_page(&window, config.as_ref()) {
					error!("Re-attaching after load failed: {}", error);
				}
			}) as Box<dyn Fn()>)
		};
		window.add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())?;
		*listener = Some(on_load);
		Ok(())
	})
}

#[cfg(feature = "console-log")]
fn install_subscriber() {
	if tracing_wasm::try_set_as_global_default().is_err() {
		trace!("Keeping the existing global subscriber.");
	}
}

#[cfg(not(feature = "console-log"))]
fn install_subscriber() {}
