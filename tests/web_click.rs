#![cfg(target_arch = "wasm32")]

mod fixture;

use core::cell::RefCell;
use fixture::{document, settle, Fixture, RecordingHost, RecordingIndicator, ScriptedTransport};
use messy_fediverse_dom::{actions::ActionHandler, cache::MemoryStore, Config, Dependencies, Error, Widget};
use std::rc::Rc;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::Event;

wasm_bindgen_test_configure!(run_in_browser);

const DELETABLE: &str = r#"
	<form action="/fediverse/replies/" method="post">
		<input type="hidden" name="csrfmiddlewaretoken" value="tok">
		<textarea name="content"></textarea>
	</form>
	<article data-local-id="42" data-uri="https://example.com/notes/42">
		<button type="button" class="delete-js">Delete</button>
	</article>
"#;

fn display(fixture: &Fixture, selector: &str) -> String {
	fixture.html_element(selector).style().get_property_value("display").unwrap()
}

#[wasm_bindgen_test]
async fn delete_hides_item_on_success() {
	let fixture = Fixture::new(DELETABLE);
	fixture.transport.respond(200, "application/json", r#"{"success": true}"#);

	fixture.html_element("button.delete-js").click();
	settle().await;

	let request = fixture.transport.last_request();
	assert_eq!(request.method.as_str(), "DELETE");
	assert_eq!(request.url.path(), "/fediverse/replies/");
	assert_eq!(request.url.query(), Some("id=42&uri=https%3A%2F%2Fexample.com%2Fnotes%2F42"));
	assert_eq!(request.header("X-CSRFToken"), Some("tok"));
	assert_eq!(request.header("X-Requested-With"), Some("XMLHttpRequest"));
	assert_eq!(request.body, None);
	assert_eq!(display(&fixture, "article"), "none");
	assert!(fixture.alerts().is_empty());
	assert_eq!(*fixture.indicator.0.borrow(), [true, false]);
}

#[wasm_bindgen_test]
async fn delete_reports_server_reason() {
	let fixture = Fixture::new(DELETABLE);
	fixture.transport.respond(200, "application/json", r#"{"success": false, "error": "nope"}"#);
	fixture.transport.respond(200, "application/json", r#"{"success": false}"#);

	fixture.html_element("button.delete-js").click();
	settle().await;
	fixture.html_element("button.delete-js").click();
	settle().await;

	assert_eq!(fixture.alerts(), ["nope", "Request failed."]);
	assert_eq!(display(&fixture, "article"), "");
	assert!(!fixture.widget.busy().is_busy());
}

#[wasm_bindgen_test]
async fn delete_without_reply_form() {
	let fixture = Fixture::new(
		r#"
		<form action="/search/" method="get"></form>
		<article data-local-id="42"><button type="button" class="delete-js">Delete</button></article>
		"#,
	);

	fixture.html_element("button.delete-js").click();
	settle().await;

	assert_eq!(fixture.transport.request_count(), 0);
	assert_eq!(fixture.alerts(), ["Form not found"]);
	assert!(fixture.indicator.0.borrow().is_empty());
}

#[wasm_bindgen_test]
async fn reply_without_form() {
	let fixture = Fixture::new(r#"<article data-uri="https://example.com/notes/1"><button type="button" class="reply-js">Reply</button></article>"#);

	fixture.html_element("button.reply-js").click();
	settle().await;

	assert_eq!(fixture.transport.request_count(), 0);
	assert_eq!(fixture.alerts(), ["Form not found"]);
}

#[wasm_bindgen_test]
async fn reply_takes_precedence() {
	let fixture = Fixture::new(
		r#"
		<div id="click-precedence" data-ajax-target="click-precedence" href="/elsewhere/">
			<article data-uri="https://example.com/notes/1"><button type="button" class="reply-js">Reply</button></article>
		</div>
		<form action="/fediverse/replies/" method="post"><input type="hidden" name="uri"></form>
		"#,
	);
	fixture.transport.respond(200, "text/plain", "");

	fixture.html_element("button.reply-js").click();
	settle().await;

	assert_eq!(fixture.transport.request_count(), 1);
	assert_eq!(fixture.transport.last_request().method.as_str(), "POST");
	assert_eq!(fixture.host.loads.get(), 0);
}

#[wasm_bindgen_test]
async fn fragment_loader_injects_main_content() {
	let fixture = Fixture::new(r#"<a href="/fediverse/thread/3/" data-ajax-target="click-thread">More</a><div id="click-thread">placeholder</div>"#);
	fixture.transport.respond(
		200,
		"text/html",
		r#"<html><body><main>outer</main><div id="messy-fediverse-block-main"><p>thread</p></div></body></html>"#,
	);

	fixture.html_element("a").click();
	settle().await;

	let request = fixture.transport.last_request();
	assert_eq!(request.method.as_str(), "GET");
	assert_eq!(request.url.path(), "/fediverse/thread/3/");
	assert_eq!(request.header("X-Requested-With"), Some("XMLHttpRequest"));
	assert_eq!(document().get_element_by_id("click-thread").unwrap().inner_html(), "<p>thread</p>");
	assert_eq!(fixture.host.loads.get(), 1);
}

#[wasm_bindgen_test]
async fn fragment_loader_falls_back_to_main() {
	let fixture = Fixture::new(r#"<button type="button" href="/fediverse/thread/4/" data-ajax-target="click-fallback">More</button><div id="click-fallback"></div>"#);
	fixture.transport.respond(200, "text/html", "<main>just main</main>");

	fixture.html_element("button").click();
	settle().await;

	assert_eq!(fixture.transport.last_request().url.path(), "/fediverse/thread/4/");
	assert_eq!(document().get_element_by_id("click-fallback").unwrap().inner_html(), "just main");
}

#[wasm_bindgen_test]
async fn fragment_loader_failure() {
	let fixture = Fixture::new(r#"<a href="/fediverse/thread/5/" data-ajax-target="click-failing">More</a><div id="click-failing">placeholder</div>"#);
	fixture.transport.respond(404, "text/html", "<main>Not found</main>");

	fixture.html_element("a").click();
	settle().await;

	assert_eq!(fixture.alerts(), ["Request failed."]);
	assert_eq!(document().get_element_by_id("click-failing").unwrap().inner_html(), "placeholder");
	assert_eq!(fixture.host.loads.get(), 0);
	assert!(!fixture.widget.busy().is_busy());
}

#[wasm_bindgen_test]
async fn fragment_loader_ignores_missing_target() {
	let fixture = Fixture::new(r##"<a href="#click-missing" data-ajax-target="click-missing">More</a>"##);

	fixture.html_element("a").click();
	settle().await;

	assert_eq!(fixture.transport.request_count(), 0);
	assert!(fixture.alerts().is_empty());
}

#[wasm_bindgen_test]
async fn named_actions() {
	let fixture = Fixture::new(r#"<button type="button" data-action="like">Like</button><button type="button" data-action="unknown">?</button>"#);
	let calls = Rc::new(RefCell::new(Vec::new()));
	let handler: ActionHandler = {
		let calls = Rc::clone(&calls);
		Rc::new(move |widget: &Rc<Widget>, event: &Event| calls.borrow_mut().push((widget.root().id(), event.type_())))
	};
	fixture.widget.register_action("like", handler).unwrap();

	fixture.html_element("[data-action=like]").click();
	fixture.html_element("[data-action=unknown]").click();
	settle().await;

	assert_eq!(*calls.borrow(), [(fixture.id(), "click".to_owned())]);
	assert!(fixture.alerts().is_empty());
}

#[wasm_bindgen_test]
fn action_names_are_checked() {
	let fixture = Fixture::new("");
	let noop: ActionHandler = Rc::new(|_: &Rc<Widget>, _: &Event| ());
	assert!(matches!(fixture.widget.register_action("togglePreview", Rc::clone(&noop)), Err(Error::DuplicateAction(_))));
	assert!(matches!(fixture.widget.register_action("x y", noop), Err(Error::InvalidActionName(_))));
}

#[wasm_bindgen_test]
fn attaching_is_idempotent() {
	let fixture = Fixture::new(DELETABLE);
	let again = Widget::attach(
		fixture.root.clone(),
		Config::default(),
		Dependencies {
			transport: Rc::new(ScriptedTransport::default()),
			host: Rc::new(RecordingHost::default()),
			store: Box::new(MemoryStore::new()),
			busy: Rc::new(RecordingIndicator::default()),
		},
	)
	.unwrap();

	assert!(Rc::ptr_eq(&again, &fixture.widget));
	assert!(Rc::ptr_eq(&Widget::attached_to(&fixture.root).unwrap(), &fixture.widget));
}

#[wasm_bindgen_test]
async fn detached_widget_ignores_events() {
	let fixture = Fixture::new(DELETABLE);
	fixture.widget.detach();
	assert!(Widget::attached_to(&fixture.root).is_none());

	fixture.html_element("button.delete-js").click();
	settle().await;

	assert_eq!(fixture.transport.request_count(), 0);
	assert_eq!(display(&fixture, "article"), "");
}
