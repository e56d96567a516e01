//! Shared scaffolding for the browser tests.
#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use gloo_timers::future::TimeoutFuture;
use messy_fediverse_dom::{
	busy::BusyIndicator,
	cache::{FieldStore, MemoryStore},
	host::Host,
	transport::{InboundResponse, OutboundRequest, Transport},
	Config, Dependencies, Error, Widget,
};
use std::{collections::VecDeque, rc::Rc};
use wasm_bindgen::JsCast;
use web_sys::{window, Document, Element, HtmlElement, HtmlFormElement, HtmlInputElement};

thread_local! {
	static NEXT_ID: Cell<usize> = Cell::new(0);
}

pub fn init_log() {
	// Another test in the same binary may have installed it already.
	drop(tracing_wasm::try_set_as_global_default());
}

pub fn document() -> Document {
	window().unwrap().document().unwrap()
}

/// Lets spawned flows run to completion. Scripted responses are ready immediately.
pub async fn settle() {
	TimeoutFuture::new(0).await;
	TimeoutFuture::new(0).await;
}

#[derive(Default)]
pub struct ScriptedTransport {
	responses: RefCell<VecDeque<Result<InboundResponse, Error>>>,
	pub requests: RefCell<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
	pub fn respond(&self, status: u16, content_type: &str, body: &str) {
		self.responses.borrow_mut().push_back(Ok(InboundResponse {
			status,
			redirected: false,
			url: String::new(),
			content_type: Some(content_type.to_owned()),
			body: body.to_owned(),
		}));
	}

	pub fn respond_with(&self, response: InboundResponse) {
		self.responses.borrow_mut().push_back(Ok(response));
	}

	pub fn fail(&self, message: &str) {
		self.responses.borrow_mut().push_back(Err(Error::Js(message.to_owned())));
	}

	pub fn request_count(&self) -> usize {
		self.requests.borrow().len()
	}

	pub fn last_request(&self) -> OutboundRequest {
		self.requests.borrow().last().cloned().expect("no request was sent")
	}
}

impl Transport for ScriptedTransport {
	fn send(&self, request: OutboundRequest) -> LocalBoxFuture<'_, Result<InboundResponse, Error>> {
		self.requests.borrow_mut().push(request);
		let response = self.responses.borrow_mut().pop_front().unwrap_or_else(|| Err(Error::Js("no scripted response".to_owned())));
		future::ready(response).boxed_local()
	}
}

#[derive(Default)]
pub struct RecordingHost {
	pub alerts: RefCell<Vec<String>>,
	pub popups: RefCell<Vec<String>>,
	pub locations: RefCell<Vec<String>>,
	pub loads: Cell<usize>,
}

impl Host for RecordingHost {
	fn alert(&self, message: &str) {
		self.alerts.borrow_mut().push(message.to_owned());
	}

	fn open_popup(&self, url: &str) {
		self.popups.borrow_mut().push(url.to_owned());
	}

	fn replace_location(&self, url: &str) {
		self.locations.borrow_mut().push(url.to_owned());
	}

	fn announce_load(&self) {
		self.loads.set(self.loads.get() + 1);
	}
}

#[derive(Default)]
pub struct RecordingIndicator(pub RefCell<Vec<bool>>);

impl BusyIndicator for RecordingIndicator {
	fn set_busy(&self, on: bool) {
		self.0.borrow_mut().push(on);
	}
}

/// Lets the test inspect the store the widget writes to.
pub struct SharedStore(pub Rc<MemoryStore>);

impl FieldStore for SharedStore {
	fn get(&self, key: &str) -> Result<Option<String>, Error> {
		self.0.get(key)
	}

	fn set(&self, key: &str, value: &str) -> Result<(), Error> {
		self.0.set(key, value)
	}
}

/// A widget root with the given content, attached with recording collaborators.
///
/// Dropping the fixture detaches the widget and removes the root from the document.
pub struct Fixture {
	pub root: Element,
	pub widget: Rc<Widget>,
	pub transport: Rc<ScriptedTransport>,
	pub host: Rc<RecordingHost>,
	pub indicator: Rc<RecordingIndicator>,
	pub store: Rc<MemoryStore>,
}

impl Fixture {
	pub fn new(html: &str) -> Self {
		Self::build(html, Config::default(), &[])
	}

	/// `cached` is written to the store (under this fixture's keys) before attaching.
	pub fn build(html: &str, config: Config, cached: &[(&str, &str)]) -> Self {
		init_log();
		let id = NEXT_ID.with(|next| {
			let id = next.get();
			next.set(id + 1);
			format!("fixture-{}", id)
		});

		let document = document();
		let root = document.create_element("div").unwrap();
		root.set_id(&id);
		root.set_inner_html(html);
		document.body().unwrap().append_child(&root).unwrap();

		let store = Rc::new(MemoryStore::new());
		for (name, value) in cached {
			store.set(&format!("{}_{}_{}", config.cache_namespace, config.cache_scope_for(&id), name), value).unwrap();
		}

		let transport = Rc::new(ScriptedTransport::default());
		let host = Rc::new(RecordingHost::default());
		let indicator = Rc::new(RecordingIndicator::default());
		let widget = Widget::attach(
			root.clone(),
			config,
			Dependencies {
				transport: transport.clone(),
				host: host.clone(),
				store: Box::new(SharedStore(Rc::clone(&store))),
				busy: indicator.clone(),
			},
		)
		.unwrap();

		Self {
			root,
			widget,
			transport,
			host,
			indicator,
			store,
		}
	}

	pub fn id(&self) -> String {
		self.root.id()
	}

	pub fn element(&self, selector: &str) -> Element {
		self.root.query_selector(selector).unwrap().unwrap_or_else(|| panic!("no {:?} in fixture", selector))
	}

	pub fn html_element(&self, selector: &str) -> HtmlElement {
		self.element(selector).dyn_into().unwrap()
	}

	pub fn form(&self, selector: &str) -> HtmlFormElement {
		self.element(selector).dyn_into().unwrap()
	}

	pub fn input(&self, selector: &str) -> HtmlInputElement {
		self.element(selector).dyn_into().unwrap()
	}

	pub fn alerts(&self) -> Vec<String> {
		self.host.alerts.borrow().clone()
	}
}

impl Drop for Fixture {
	fn drop(&mut self) {
		self.widget.detach();
		self.root.remove();
	}
}
