//! Page-wide busy state while requests are outstanding.

use core::cell::Cell;
use std::rc::Rc;
use tracing::{error, trace};
use web_sys::HtmlElement;

pub trait BusyIndicator {
	fn set_busy(&self, on: bool);
}

/// Marks `<body>` with a class and disables pointer interaction while busy.
#[derive(Clone, Debug)]
pub struct BodyIndicator {
	body: HtmlElement,
	class: String,
}

impl BodyIndicator {
	#[must_use]
	pub fn new(body: HtmlElement, class: &str) -> Self {
		Self { body, class: class.to_owned() }
	}
}

impl BusyIndicator for BodyIndicator {
	fn set_busy(&self, on: bool) {
		let style = self.body.style();
		let result = if on {
			self.body.class_list().add_1(&self.class).and_then(|()| style.set_property("pointer-events", "none"))
		} else {
			self.body.class_list().remove_1(&self.class).and_then(|()| style.remove_property("pointer-events").map(drop))
		};
		if let Err(error) = result {
			error!("Failed to toggle busy state: {:?}", error);
		}
	}
}

/// Reference-counted busy state.
///
/// The indicator switches on with the first outstanding [`BusyToken`] and off once the last one is dropped,
/// so overlapping requests don't clear each other's busy state.
#[derive(Clone)]
pub struct BusyGuard {
	outstanding: Rc<Cell<usize>>,
	indicator: Rc<dyn BusyIndicator>,
}

impl BusyGuard {
	#[must_use]
	pub fn new(indicator: Rc<dyn BusyIndicator>) -> Self {
		Self {
			outstanding: Rc::new(Cell::new(0)),
			indicator,
		}
	}

	pub fn acquire(&self) -> BusyToken {
		let outstanding = self.outstanding.get();
		self.outstanding.set(outstanding.saturating_add(1));
		trace!("Busy tokens outstanding: {}", outstanding + 1);
		if outstanding == 0 {
			self.indicator.set_busy(true);
		}
		BusyToken { guard: self.clone() }
	}

	#[must_use]
	pub fn is_busy(&self) -> bool {
		self.outstanding.get() > 0
	}

	#[must_use]
	pub fn outstanding(&self) -> usize {
		self.outstanding.get()
	}

	fn release(&self) {
		let outstanding = self.outstanding.get().saturating_sub(1);
		self.outstanding.set(outstanding);
		trace!("Busy tokens outstanding: {}", outstanding);
		if outstanding == 0 {
			self.indicator.set_busy(false);
		}
	}
}

impl core::fmt::Debug for BusyGuard {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("BusyGuard").field("outstanding", &self.outstanding.get()).finish_non_exhaustive()
	}
}

/// Keeps the page busy until dropped.
#[must_use = "the busy state ends when the token is dropped"]
#[derive(Debug)]
pub struct BusyToken {
	guard: BusyGuard,
}

impl Drop for BusyToken {
	fn drop(&mut self) {
		self.guard.release();
	}
}
