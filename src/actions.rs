//! Named actions, invoked by clicks on `[data-action="…"]` elements.

use crate::{Error, Widget};
use hashbrown::HashMap;
use std::rc::Rc;
use web_sys::Event;

pub type ActionHandler = Rc<dyn Fn(&Rc<Widget>, &Event)>;

#[derive(Default, Clone)]
pub struct ActionRegistry {
	handlers: HashMap<String, ActionHandler>,
}

impl ActionRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// # Errors
	///
	/// [`Error::InvalidActionName`] unless `name` is a non-empty run of ASCII alphanumerics, `_` and `-`,
	/// [`Error::DuplicateAction`] if `name` is taken.
	pub fn register(&mut self, name: &str, handler: ActionHandler) -> Result<(), Error> {
		if !is_valid_name(name) {
			return Err(Error::InvalidActionName(name.to_owned()));
		}
		match self.handlers.entry(name.to_owned()) {
			hashbrown::hash_map::Entry::Occupied(_) => Err(Error::DuplicateAction(name.to_owned())),
			hashbrown::hash_map::Entry::Vacant(vacant) => {
				vacant.insert(handler);
				Ok(())
			}
		}
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<ActionHandler> {
		self.handlers.get(name).cloned()
	}
}

impl core::fmt::Debug for ActionRegistry {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_set().entries(self.handlers.keys()).finish()
	}
}

fn is_valid_name(name: &str) -> bool {
	!name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
	use super::*;

	fn noop() -> ActionHandler {
		Rc::new(|_: &Rc<Widget>, _: &Event| ())
	}

	#[test]
	fn register_and_look_up() {
		let mut registry = ActionRegistry::new();
		registry.register("togglePreview", noop()).unwrap();
		assert!(registry.get("togglePreview").is_some());
		assert!(registry.get("toggle_preview").is_none());
		assert_eq!(format!("{:?}", registry), r#"{"togglePreview"}"#);
	}

	#[test]
	fn duplicates_are_rejected() {
		let mut registry = ActionRegistry::new();
		registry.register("share", noop()).unwrap();
		assert!(matches!(registry.register("share", noop()), Err(Error::DuplicateAction(name)) if name == "share"));
	}

	#[test]
	fn names_are_validated() {
		let mut registry = ActionRegistry::new();
		for invalid in ["", "two words", "__proto__.x", "alert()"] {
			assert!(matches!(registry.register(invalid, noop()), Err(Error::InvalidActionName(_))), "{:?}", invalid);
		}
		assert!(registry.register("on-click_2", noop()).is_ok());
	}
}
