#![allow(dead_code)]

use std::sync::Once;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, HtmlElement};

static LOG_INITIALIZED: Once = Once::new();

pub fn init() {
	LOG_INITIALIZED.call_once(tracing_wasm::set_as_global_default);
}

pub fn document() -> Document {
	window().unwrap().document().unwrap()
}

/// Appends a `<div>` with `inner_html` to `<body>`.
pub fn fixture(inner_html: &str) -> HtmlElement {
	let document = document();
	let element: HtmlElement = document.create_element("div").unwrap().dyn_into().unwrap();
	element.set_inner_html(inner_html);
	document.body().unwrap().append_child(&element).unwrap();
	element
}
