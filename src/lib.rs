//! Client-side behavior for server-patched pages.
//!
//! The server re-renders fragments and pushes them over a persistent connection; this crate keeps client-only state
//! alive across those patches:
//!
//! - [`preserve`] keeps the open/closed state of `<dialog>` and `<details>` elements.
//! - [`registry`] maps hook names to behavior and enforces the `mounted` → `updated`* → `destroyed` lifecycle per element,
//!   [`bridge`] exports it to JavaScript.
//! - The hooks: [`choreography`] (`ParentMount`, `FadeIn`), [`form_errors`] (`FormHelpers`), [`map`] (`Leaflet`) and [`theme`] (`ThemeToggle`).
//!
//! Call [`boot`] (or [`boot_with_config`]) once the page's scripts are loaded.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::{cell::RefCell, rc::Rc, sync::Once};
use tracing::{error, info};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use web_sys::HtmlElement;

pub mod bridge;
pub mod choreography;
pub mod config;
pub mod error;
pub mod form_errors;
pub mod map;
pub mod preference;
pub mod preserve;
pub mod registry;
pub mod socket;
pub mod theme;

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

use bridge::{HookBridge, SharedRegistry};
use choreography::{FadeIn, InitialPaintFlag, ParentMount};
use config::Config;
use error::Error;
use form_errors::FormHelpers;
use map::{leaflet::Leaflet, MapHook};
use preference::PreferenceStore;
use registry::HookRegistry;
use socket::{Connection, ProgressBar};
use theme::ThemeToggle;

/// All hooks, under the names the markup uses.
#[must_use]
pub fn default_registry(config: &Config, initial_paint: &InitialPaintFlag) -> HookRegistry<HtmlElement> {
	HookRegistry::new()
		.with("ParentMount", ParentMount::new(initial_paint.clone()))
		.with("FadeIn", FadeIn::new(initial_paint.reader()))
		.with("FormHelpers", FormHelpers)
		.with(
			config.map.hook_name.clone(),
			MapHook::new(Leaflet::new(config.map.basemap.clone()), config.map.initial_view, config.map.fit_policy),
		)
		.with("ThemeToggle", ThemeToggle::new(PreferenceStore::local(config.storage_key.clone())))
}

/// Everything that has to outlive [`boot`].
struct Page {
	_registry: SharedRegistry,
	_bridge: HookBridge,
	_connection: Connection,
	_progress: Option<ProgressBar>,
}

static LOGGING: Once = Once::new();

thread_local! {
	static PAGE: RefCell<Option<Page>> = RefCell::new(None);
}

/// Boots with the default [`Config`].
///
/// # Errors
///
/// See [`boot_with_config`].
#[wasm_bindgen]
pub fn boot() -> Result<(), JsValue> {
	start(Config::default())
}

/// Boots with a JSON [`Config`] (kebab-case keys, all optional).
///
/// # Errors
///
/// For a malformed configuration, a missing CSRF token or missing `Phoenix`/`LiveView` globals.
/// A missing `topbar` only disables the progress bar.
#[wasm_bindgen]
pub fn boot_with_config(json: &str) -> Result<(), JsValue> {
	start(Config::from_json(json)?)
}

fn start(config: Config) -> Result<(), JsValue> {
	if PAGE.with(|page| page.borrow().is_some()) {
		error!("Already booted; Ignoring.");
		return Ok(());
	}

	console_error_panic_hook::set_once();
	// A failed boot may be retried, but the subscriber can only be set once.
	LOGGING.call_once(|| tracing_wasm::set_as_global_default_with_config(tracing_wasm::WASMLayerConfigBuilder::new().set_max_level(config.max_level()).build()));

	let window = web_sys::window().ok_or(Error::MissingGlobal("window"))?;
	let initial_paint = InitialPaintFlag::new();
	let registry: SharedRegistry = Rc::new(RefCell::new(default_registry(&config, &initial_paint)));
	let bridge = HookBridge::new(&registry);

	let progress = match ProgressBar::install(&window, &config.progress) {
		Ok(progress) => Some(progress),
		Err(error) => {
			error!("Progress bar disabled: {}", error);
			None
		}
	};
	let connection = Connection::open(&window, &bridge, &config)?;

	PAGE.with(|page| {
		*page.borrow_mut() = Some(Page {
			_registry: registry,
			_bridge: bridge,
			_connection: connection,
			_progress: progress,
		})
	});
	info!("Booted.");
	Ok(())
}
