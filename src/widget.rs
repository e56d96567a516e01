use crate::{
	actions::{ActionHandler, ActionRegistry},
	busy::{BodyIndicator, BusyGuard, BusyIndicator},
	cache::{FieldCache, FieldStore, MemoryStore},
	field::Field,
	host::{BrowserHost, Host},
	poll::PollTask,
	toggle::TOGGLE_PREVIEW_ACTION,
	transport::{FetchTransport, Transport},
	Config, Error,
};
use core::cell::{Cell, RefCell};
use serde_json::{Map, Value};
use std::rc::{Rc, Weak};
use tracing::{error, info, instrument, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlFormElement, Window};

thread_local! {
	static INSTANCES: RefCell<Vec<Rc<Widget>>> = RefCell::new(Vec::new());
}

/// Events after which the edited field's value is cached.
const EDIT_EVENTS: [&str; 3] = ["input", "change", "paste"];

/// Collaborators a [`Widget`] is constructed with.
pub struct Dependencies {
	pub transport: Rc<dyn Transport>,
	pub host: Rc<dyn Host>,
	pub store: Box<dyn FieldStore>,
	pub busy: Rc<dyn BusyIndicator>,
}

impl Dependencies {
	/// `fetch`, `localStorage` (or a [`MemoryStore`] if that's unavailable), `window` dialogs and `<body>`.
	pub fn browser(window: &Window, config: &Config) -> Result<Self, Error> {
		let body = window
			.document()
			.and_then(|document| document.body())
			.ok_or_else(|| Error::MissingCollaborator("document body".to_owned()))?;

		let store: Box<dyn FieldStore> = match window.local_storage() {
			Ok(Some(storage)) => Box::new(storage),
			Ok(None) => {
				warn!("localStorage is unavailable; field values won't survive reloads.");
				Box::new(MemoryStore::new())
			}
			Err(error) => {
				warn!("localStorage is inaccessible ({:?}); field values won't survive reloads.", error);
				Box::new(MemoryStore::new())
			}
		};

		Ok(Self {
			transport: Rc::new(FetchTransport::new()),
			host: Rc::new(BrowserHost::new(window.clone(), &config.popup_features)),
			store,
			busy: Rc::new(BodyIndicator::new(body, &config.busy_class)),
		})
	}
}

/// The enhanced widget, bound to one root element.
///
/// All handler state lives here rather than on the element. Event listeners only hold weak references,
/// so the instance stays alive through the thread-local registry until [`Widget::detach`] is called.
pub struct Widget {
	pub(crate) root: Element,
	pub(crate) document: Document,
	pub(crate) config: Config,
	pub(crate) transport: Rc<dyn Transport>,
	pub(crate) host: Rc<dyn Host>,
	pub(crate) cache: FieldCache,
	pub(crate) busy: BusyGuard,
	pub(crate) actions: RefCell<ActionRegistry>,
	pub(crate) activity: RefCell<Value>,
	pub(crate) poll: RefCell<Option<PollTask>>,
	pub(crate) poll_attempts: Cell<u32>,
	pub(crate) preview_form: RefCell<Option<HtmlFormElement>>,
	listeners: Listeners,
}

impl core::fmt::Debug for Widget {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Widget").field("root", &self.root).field("cache", &self.cache).field("busy", &self.busy).finish_non_exhaustive()
	}
}

impl Widget {
	/// Binds the widget to `root` and primes it from the current DOM.
	///
	/// Attaching to a root that already has a widget returns that widget and drops `dependencies`.
	#[instrument(skip(config, dependencies))]
	pub fn attach(root: Element, config: Config, dependencies: Dependencies) -> Result<Rc<Self>, Error> {
		if let Some(existing) = Self::attached_to(&root) {
			trace!("Already attached.");
			return Ok(existing);
		}

		let document = root
			.owner_document()
			.ok_or_else(|| Error::MissingCollaborator("owner document of the widget root".to_owned()))?;
		let cache = FieldCache::new(dependencies.store, &config.cache_namespace, &config.cache_scope_for(&root.id()));

		let mut actions = ActionRegistry::new();
		let toggle_preview: ActionHandler = Rc::new(|widget: &Rc<Widget>, event: &Event| widget.toggle_preview(event));
		actions.register(TOGGLE_PREVIEW_ACTION, toggle_preview)?;

		let widget = Rc::new_cyclic(|weak| Self {
			root,
			document,
			config,
			transport: dependencies.transport,
			host: dependencies.host,
			cache,
			busy: BusyGuard::new(dependencies.busy),
			actions: RefCell::new(actions),
			activity: RefCell::new(Value::Object(Map::new())),
			poll: RefCell::new(None),
			poll_attempts: Cell::new(0),
			preview_form: RefCell::new(None),
			listeners: Listeners::new(weak),
		});

		if let Err(error) = widget.listeners.bind(&widget.root) {
			widget.listeners.unbind(&widget.root);
			return Err(error);
		}
		INSTANCES.with(|instances| instances.borrow_mut().push(Rc::clone(&widget)));
		info!("Attached to #{}.", widget.root.id());

		if let Err(error) = widget.patch(None) {
			error!("Initial refresh failed: {}", error);
		}
		Ok(widget)
	}

	/// The widget bound to `root`, if any.
	#[must_use]
	pub fn attached_to(root: &Element) -> Option<Rc<Self>> {
		INSTANCES.with(|instances| instances.borrow().iter().find(|widget| widget.root == *root).cloned())
	}

	/// Removes the event listeners, cancels polling and forgets the instance.
	#[instrument(skip(self))]
	pub fn detach(&self) {
		self.listeners.unbind(&self.root);
		self.cancel_poll();
		let removed = INSTANCES.with(|instances| {
			let mut instances = instances.borrow_mut();
			let before = instances.len();
			instances.retain(|widget| !core::ptr::eq(Rc::as_ptr(widget), self));
			before - instances.len()
		});
		trace!("Detached {} instance(s).", removed);
	}

	#[must_use]
	pub fn root(&self) -> &Element {
		&self.root
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// The parsed structured-data block as of the last refresh.
	#[must_use]
	pub fn activity_data(&self) -> Value {
		self.activity.borrow().clone()
	}

	#[must_use]
	pub fn busy(&self) -> &BusyGuard {
		&self.busy
	}

	/// Makes `handler` available to `[data-action="{name}"]` clicks.
	pub fn register_action(&self, name: &str, handler: ActionHandler) -> Result<(), Error> {
		self.actions.borrow_mut().register(name, handler)
	}

	/// Logs `error` and shows it to the user.
	pub(crate) fn report(&self, error: &Error) {
		error!("ERROR: {}", error);
		self.host.alert(&error.to_string());
	}

	/// Caches the edited field, and applies checkbox display toggles on `change`.
	#[instrument(skip(self, event))]
	fn on_edit(&self, event: &Event) {
		let field = match event.target().and_then(|target| target.dyn_into::<Element>().ok()).and_then(|element| Field::from_element(&element)) {
			Some(field) => field,
			None => return,
		};

		let name = field.name();
		if !name.is_empty() {
			self.cache.remember(&name, &field.value());
		}

		if event.type_() == "change" {
			self.toggle_display_for(&field);
		}
	}
}

struct Listeners {
	submit: Closure<dyn Fn(Event)>,
	click: Closure<dyn Fn(Event)>,
	edit: Closure<dyn Fn(Event)>,
}

impl Listeners {
	fn new(widget: &Weak<Widget>) -> Self {
		let submit = {
			let widget = Weak::clone(widget);
			Closure::wrap(Box::new(move |event: Event| {
				if let Some(widget) = widget.upgrade() {
					spawn_local(widget.submit(&event));
				}
			}) as Box<dyn Fn(Event)>)
		};
		let click = {
			let widget = Weak::clone(widget);
			Closure::wrap(Box::new(move |event: Event| {
				if let Some(widget) = widget.upgrade() {
					spawn_local(widget.route_click(&event));
				}
			}) as Box<dyn Fn(Event)>)
		};
		let edit = {
			let widget = Weak::clone(widget);
			Closure::wrap(Box::new(move |event: Event| {
				if let Some(widget) = widget.upgrade() {
					widget.on_edit(&event);
				}
			}) as Box<dyn Fn(Event)>)
		};
		Self { submit, click, edit }
	}

	fn bind(&self, root: &Element) -> Result<(), Error> {
		root.add_event_listener_with_callback("submit", self.submit.as_ref().unchecked_ref())?;
		root.add_event_listener_with_callback("click", self.click.as_ref().unchecked_ref())?;
		for name in EDIT_EVENTS {
			root.add_event_listener_with_callback(name, self.edit.as_ref().unchecked_ref())?;
		}
		Ok(())
	}

	fn unbind(&self, root: &Element) {
		let bindings = [("submit", &self.submit), ("click", &self.click)]
			.into_iter()
			.chain(EDIT_EVENTS.into_iter().map(|name| (name, &self.edit)));
		for (name, closure) in bindings {
			if let Err(error) = root.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
				error!("Failed to remove {:?} listener: {:?}", name, error);
			}
		}
	}
}
