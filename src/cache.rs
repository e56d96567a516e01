//! Write-through cache of form field values, so a half-written reply survives reloads and re-renders.

use crate::Error;
use core::cell::RefCell;
use hashbrown::HashMap;
use tracing::{error, instrument, trace};
use web_sys::Storage;

/// Durable string key/value storage.
pub trait FieldStore {
	fn get(&self, key: &str) -> Result<Option<String>, Error>;
	fn set(&self, key: &str, value: &str) -> Result<(), Error>;
}

impl FieldStore for Storage {
	fn get(&self, key: &str) -> Result<Option<String>, Error> {
		Ok(self.get_item(key)?)
	}

	fn set(&self, key: &str, value: &str) -> Result<(), Error> {
		Ok(self.set_item(key, value)?)
	}
}

/// Volatile [`FieldStore`], for when `localStorage` is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore(RefCell<HashMap<String, String>>);

impl MemoryStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}
}

impl FieldStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, Error> {
		Ok(self.0.borrow().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), Error> {
		self.0.borrow_mut().insert(key.to_owned(), value.to_owned());
		Ok(())
	}
}

/// Field values keyed by field name, namespaced and scoped to one widget instance.
///
/// Storage failures are logged and otherwise swallowed: losing a cached draft is not worth interrupting the user for.
pub struct FieldCache {
	store: Box<dyn FieldStore>,
	prefix: String,
}

impl FieldCache {
	/// Keys are `{namespace}_{scope}_{field}`, or `{namespace}_{field}` for an empty `scope`.
	#[must_use]
	pub fn new(store: Box<dyn FieldStore>, namespace: &str, scope: &str) -> Self {
		let prefix = if scope.is_empty() { format!("{}_", namespace) } else { format!("{}_{}_", namespace, scope) };
		Self { store, prefix }
	}

	#[must_use]
	pub fn key(&self, field_name: &str) -> String {
		format!("{}{}", self.prefix, field_name)
	}

	#[instrument(skip(self, value))]
	pub fn remember(&self, field_name: &str, value: &str) {
		if cfg!(feature = "dangerous-logging") {
			trace!("Caching {:?}.", value);
		}
		if let Err(error) = self.store.set(&self.key(field_name), value) {
			error!("Could not cache field {:?}: {}", field_name, error);
		}
	}

	#[instrument(skip(self))]
	pub fn recall(&self, field_name: &str) -> Option<String> {
		match self.store.get(&self.key(field_name)) {
			Ok(value) => value,
			Err(error) => {
				error!("Could not read cached field {:?}: {}", field_name, error);
				None
			}
		}
	}
}

impl core::fmt::Debug for FieldCache {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("FieldCache").field("prefix", &self.prefix).finish_non_exhaustive()
	}
}
