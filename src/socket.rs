//! Connection and progress-bar wiring for the page.
//!
//! The connection itself is [Phoenix LiveView](https://hexdocs.pm/phoenix_live_view/js-interop.html)'s `LiveSocket`
//! (global `LiveView`, with `Phoenix.Socket` as transport), and the progress bar is the vendored `topbar` global.
//! Both are only configured from here.

use crate::{
	bridge::HookBridge,
	config::{Config, ProgressConfig},
	error::{Error, Result},
	preserve::preserve_stateful_attributes,
};
use core::fmt;
use js_sys::{Object, Reflect};
use tracing::{info, instrument, trace, warn};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue, UnwrapThrowExt};
use web_sys::{Document, Element, Event, Window};

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_namespace = LiveView)]
	#[derive(Debug)]
	pub type LiveSocket;

	#[wasm_bindgen(catch, constructor, js_namespace = LiveView)]
	fn new(path: &str, socket: &JsValue, options: &Object) -> Result<LiveSocket, JsValue>;

	#[wasm_bindgen(method)]
	pub fn connect(this: &LiveSocket);

	#[wasm_bindgen(method)]
	pub fn disconnect(this: &LiveSocket);
}

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_namespace = topbar, js_name = config)]
	fn topbar_config(options: &Object);

	#[wasm_bindgen(js_namespace = topbar, js_name = show)]
	fn topbar_show(delay_ms: u32);

	#[wasm_bindgen(js_namespace = topbar, js_name = hide)]
	fn topbar_hide();
}

pub const CSRF_META_SELECTOR: &str = "meta[name='csrf-token']";
pub const LOADING_START_EVENT: &str = "phx:page-loading-start";
pub const LOADING_STOP_EVENT: &str = "phx:page-loading-stop";

/// Reads the per-navigation anti-forgery token.
///
/// # Errors
///
/// [`Error::MissingCsrfToken`] if the meta tag or its `content` is missing.
pub fn csrf_token(document: &Document) -> Result<String> {
	document
		.query_selector(CSRF_META_SELECTOR)
		.map_err(|error| Error::js(&error))?
		.and_then(|meta| meta.get_attribute("content"))
		.ok_or(Error::MissingCsrfToken)
}

fn global(name: &'static str) -> Result<JsValue> {
	let value = Reflect::get(&js_sys::global(), &JsValue::from_str(name)).map_err(|error| Error::js(&error))?;
	if value.is_undefined() {
		Err(Error::MissingGlobal(name))
	} else {
		Ok(value)
	}
}

fn set(object: &Object, key: &str, value: &JsValue) {
	Reflect::set(object, &JsValue::from_str(key), value).unwrap_throw();
}

/// A connected `LiveSocket` together with the callbacks it was configured with.
pub struct Connection {
	live_socket: LiveSocket,
	_on_before_el_updated: Closure<dyn FnMut(Element, Element)>,
}

impl fmt::Debug for Connection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Connection").field("live_socket", &self.live_socket).finish_non_exhaustive()
	}
}

impl Connection {
	/// Creates the `LiveSocket` with `bridge`'s hooks and the attribute preservation filter, connects it
	/// and exposes it as `window.liveSocket` for console debugging.
	///
	/// # Errors
	///
	/// If the CSRF token is missing, the `LiveView`/`Phoenix` globals aren't loaded or the constructor throws.
	#[instrument(skip(window, bridge, config))]
	pub fn open(window: &Window, bridge: &HookBridge, config: &Config) -> Result<Self> {
		let document = window.document().ok_or(Error::MissingGlobal("document"))?;
		let csrf_token = csrf_token(&document)?;
		let socket = Reflect::get(&global("Phoenix")?, &JsValue::from_str("Socket")).map_err(|error| Error::js(&error))?;
		global("LiveView")?;

		let on_before_el_updated = Closure::wrap(Box::new(|from: Element, to: Element| {
			if preserve_stateful_attributes(&from, &to) {
				trace!("Preserved attributes of <{}>.", from.tag_name());
			}
		}) as Box<dyn FnMut(Element, Element)>);

		let params = Object::new();
		set(&params, "_csrf_token", &csrf_token.into());
		let dom = Object::new();
		set(&dom, "onBeforeElUpdated", on_before_el_updated.as_ref());
		let options = Object::new();
		set(&options, "longPollFallbackMs", &config.long_poll_fallback_ms.into());
		set(&options, "params", &params);
		set(&options, "hooks", bridge.hooks());
		set(&options, "dom", &dom);

		let live_socket = LiveSocket::new(&config.live_path, &socket, &options).map_err(|error| Error::js(&error))?;
		live_socket.connect();
		if let Err(error) = Reflect::set(window, &JsValue::from_str("liveSocket"), &live_socket) {
			warn!("Could not expose `window.liveSocket`: {:?}", error)
		}
		info!("Connected to {:?}.", config.live_path);

		Ok(Self {
			live_socket,
			_on_before_el_updated: on_before_el_updated,
		})
	}

	#[must_use]
	pub fn live_socket(&self) -> &LiveSocket {
		&self.live_socket
	}
}

/// Shows `topbar` during live navigation and form submits.
pub struct ProgressBar {
	window: Window,
	on_start: Closure<dyn FnMut(Event)>,
	on_stop: Closure<dyn FnMut(Event)>,
}

impl fmt::Debug for ProgressBar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProgressBar").finish_non_exhaustive()
	}
}

impl ProgressBar {
	/// # Errors
	///
	/// [`Error::MissingGlobal`] if `topbar` isn't loaded, or if a listener can't be added.
	#[instrument(skip(window))]
	pub fn install(window: &Window, config: &ProgressConfig) -> Result<Self> {
		global("topbar")?;

		let bar_colors = Object::new();
		set(&bar_colors, "0", &config.bar_color.as_str().into());
		let options = Object::new();
		set(&options, "barColors", &bar_colors);
		set(&options, "shadowColor", &config.shadow_color.as_str().into());
		topbar_config(&options);

		let show_delay_ms = config.show_delay_ms;
		let on_start = Closure::wrap(Box::new(move |_: Event| topbar_show(show_delay_ms)) as Box<dyn FnMut(Event)>);
		let on_stop = Closure::wrap(Box::new(|_: Event| topbar_hide()) as Box<dyn FnMut(Event)>);
		window
			.add_event_listener_with_callback(LOADING_START_EVENT, on_start.as_ref().unchecked_ref())
			.map_err(|error| Error::js(&error))?;
		window
			.add_event_listener_with_callback(LOADING_STOP_EVENT, on_stop.as_ref().unchecked_ref())
			.map_err(|error| Error::js(&error))?;

		Ok(Self {
			window: window.clone(),
			on_start,
			on_stop,
		})
	}
}

impl Drop for ProgressBar {
	fn drop(&mut self) {
		for (event, listener) in [(LOADING_START_EVENT, &self.on_start), (LOADING_STOP_EVENT, &self.on_stop)] {
			if let Err(error) = self.window.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref()) {
				warn!("Failed to remove {:?} listener: {:?}", event, error)
			}
		}
	}
}
