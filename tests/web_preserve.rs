use live_hooks_dom::preserve::preserve_stateful_attributes;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::Element;

wasm_bindgen_test_configure!(run_in_browser);

mod web_logging_;

fn element(tag: &str, attributes: &[(&str, &str)]) -> Element {
	let element = web_logging_::document().create_element(tag).unwrap();
	for (name, value) in attributes {
		element.set_attribute(name, value).unwrap();
	}
	element
}

fn attributes(element: &Element) -> Vec<(String, String)> {
	let map = element.attributes();
	let mut attributes: Vec<_> = (0..map.length()).map(|i| map.item(i).unwrap()).map(|a| (a.name(), a.value())).collect();
	attributes.sort();
	attributes
}

#[wasm_bindgen_test]
fn open_dialog_stays_open() {
	web_logging_::init();

	let from = element("dialog", &[("open", ""), ("class", "modal"), ("id", "confirm")]);
	let to = element("dialog", &[("class", "modal updated"), ("id", "confirm"), ("data-step", "2")]);
	to.set_inner_html("<p>new body</p>");

	assert!(preserve_stateful_attributes(&from, &to));
	assert_eq!(attributes(&to), attributes(&from));
	assert_eq!(to.inner_html(), "<p>new body</p>");
}

#[wasm_bindgen_test]
fn closed_details_stay_closed() {
	web_logging_::init();

	let from = element("details", &[("class", "faq")]);
	let to = element("details", &[("class", "faq"), ("open", "")]);

	assert!(preserve_stateful_attributes(&from, &to));
	assert!(!to.has_attribute("open"));
	assert_eq!(attributes(&to), [("class".to_owned(), "faq".to_owned())]);
}

#[wasm_bindgen_test]
fn other_elements_adopt_the_patch() {
	web_logging_::init();

	let from = element("div", &[("class", "old"), ("hidden", "")]);
	let to = element("div", &[("class", "new")]);

	assert!(!preserve_stateful_attributes(&from, &to));
	assert_eq!(attributes(&to), [("class".to_owned(), "new".to_owned())]);
}
