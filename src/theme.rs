//! Light/dark theme switching with a persisted preference.
//!
//! The hook element contains a menu (`#theme-menu`) whose entries carry `phx-value-theme="light|dark|system"`,
//! optionally a button marked with `data-theme-toggle` that opens and closes it,
//! and three icons (`.light-icon`, `.dark-icon`, `.system-icon`) of which the one matching the *stored preference* is shown.
//! The *effective* mode is reflected by the `dark` class on the document element.

use crate::{
	error::{Error, Result},
	preference::{PreferenceStore, ThemePreference},
	registry::{BindingId, Hook},
};
use core::fmt;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{error, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{CssStyleDeclaration, Document, Element, Event, HtmlElement, Node, SvgElement};

pub const DARK_CLASS: &str = "dark";
pub const MENU_SELECTOR: &str = "#theme-menu";
pub const CHOICE_ATTRIBUTE: &str = "phx-value-theme";
pub const MENU_TOGGLE_ATTRIBUTE: &str = "data-theme-toggle";
pub const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

const ICONS: [(ThemePreference, &str); 3] = [
	(ThemePreference::Light, ".light-icon"),
	(ThemePreference::Dark, ".dark-icon"),
	(ThemePreference::System, ".system-icon"),
];

/// The rendered light/dark state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
	Light,
	Dark,
}

/// `Dark` iff the preference is `Dark`, or it is `System` and the OS prefers dark.
#[must_use]
pub fn compute_effective(preference: ThemePreference, os_prefers_dark: bool) -> Mode {
	match preference {
		ThemePreference::Dark => Mode::Dark,
		ThemePreference::System if os_prefers_dark => Mode::Dark,
		ThemePreference::Light | ThemePreference::System => Mode::Light,
	}
}

/// Queries [`DARK_SCHEME_QUERY`]. Reads as light if the signal is unavailable.
#[must_use]
pub fn media_prefers_dark() -> bool {
	let window = match web_sys::window() {
		Some(window) => window,
		None => return false,
	};
	match window.match_media(DARK_SCHEME_QUERY) {
		Ok(Some(query_list)) => query_list.matches(),
		Ok(None) => false,
		Err(error) => {
			trace!("`matchMedia` failed, assuming light: {:?}", error);
			false
		}
	}
}

/// Per-binding state shared with the binding's event listeners.
pub struct ThemeControl {
	element: HtmlElement,
	store: PreferenceStore,
	os_prefers_dark: Rc<dyn Fn() -> bool>,
}

impl fmt::Debug for ThemeControl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ThemeControl").field("element", &self.element).field("store", &self.store).finish_non_exhaustive()
	}
}

impl ThemeControl {
	#[must_use]
	pub fn new(element: HtmlElement, store: PreferenceStore, os_prefers_dark: Rc<dyn Fn() -> bool>) -> Self {
		Self { element, store, os_prefers_dark }
	}

	/// Re-reads the stored preference and applies it.
	pub fn refresh(&self) -> Mode {
		self.apply_effective(self.store.load())
	}

	/// Sets the document marker class to the effective mode and shows the icon of `preference`. Idempotent.
	#[instrument(skip(self))]
	pub fn apply_effective(&self, preference: ThemePreference) -> Mode {
		let mode = compute_effective(preference, (self.os_prefers_dark)());

		match self.element.owner_document().and_then(|document| document.document_element()) {
			Some(root) => {
				if let Err(error) = root.class_list().toggle_with_force(DARK_CLASS, mode == Mode::Dark) {
					error!("Could not toggle {:?} on the document element: {:?}", DARK_CLASS, error)
				}
			}
			None => warn!("No document element to mark."),
		}

		for (icon_preference, selector) in ICONS {
			let display = if icon_preference == preference { "block" } else { "none" };
			if let Some(style) = self.find_style(selector) {
				if let Err(error) = style.set_property("display", display) {
					error!("Could not set display of {:?}: {:?}", selector, error)
				}
			}
		}

		mode
	}

	/// Persists `choice`, applies it and closes the menu.
	#[instrument(skip(self))]
	pub fn select_theme(&self, choice: ThemePreference) -> Mode {
		self.store.save(choice);
		let mode = self.apply_effective(choice);
		self.hide_menu();
		mode
	}

	pub fn hide_menu(&self) {
		if let Some(menu) = self.find_style(MENU_SELECTOR) {
			if let Err(error) = menu.set_property("display", "none") {
				error!("Could not hide the theme menu: {:?}", error)
			}
		}
	}

	pub fn toggle_menu(&self) {
		if let Some(menu) = self.find_style(MENU_SELECTOR) {
			let display = if self.menu_open() { "none" } else { "block" };
			if let Err(error) = menu.set_property("display", display) {
				error!("Could not toggle the theme menu: {:?}", error)
			}
		}
	}

	/// The menu counts as closed when it is missing or its inline `display` is `none`.
	#[must_use]
	pub fn menu_open(&self) -> bool {
		match self.find_style(MENU_SELECTOR) {
			Some(menu) => menu.get_property_value("display").map_or(false, |display| display != "none"),
			None => false,
		}
	}

	fn find_style(&self, selector: &str) -> Option<CssStyleDeclaration> {
		match self.element.query_selector(selector) {
			Ok(Some(found)) => inline_style(&found),
			Ok(None) => None,
			Err(error) => {
				error!("Invalid selector {:?}: {:?}", selector, error);
				None
			}
		}
	}

	fn on_click_inside(&self, event: &Event) {
		let target = match event.target().and_then(|target| target.dyn_into::<Element>().ok()) {
			Some(target) => target,
			None => return,
		};

		if let Some(entry) = self.closest_inside(&target, &format!("[{}]", CHOICE_ATTRIBUTE)) {
			let value = entry.get_attribute(CHOICE_ATTRIBUTE).unwrap_or_default();
			match value.parse::<ThemePreference>() {
				Ok(choice) => {
					event.prevent_default();
					self.select_theme(choice);
				}
				Err(_) => warn!("Ignoring theme menu entry with unrecognised value {:?}.", value),
			}
		} else if self.closest_inside(&target, &format!("[{}]", MENU_TOGGLE_ATTRIBUTE)).is_some() {
			self.toggle_menu();
		}
	}

	fn on_click_anywhere(&self, event: &Event) {
		let target = event.target().and_then(|target| target.dyn_into::<Node>().ok());
		if !self.element.contains(target.as_ref()) {
			self.hide_menu();
		}
	}

	fn closest_inside(&self, target: &Element, selector: &str) -> Option<Element> {
		match target.closest(selector) {
			Ok(Some(found)) if self.element.contains(Some(found.as_ref())) => Some(found),
			Ok(_) => None,
			Err(error) => {
				error!("Invalid selector {:?}: {:?}", selector, error);
				None
			}
		}
	}
}

fn inline_style(element: &Element) -> Option<CssStyleDeclaration> {
	if let Some(html) = element.dyn_ref::<HtmlElement>() {
		Some(html.style())
	} else if let Some(svg) = element.dyn_ref::<SvgElement>() {
		Some(svg.style())
	} else {
		warn!("{:?} has no inline style; Skipping.", element.tag_name());
		None
	}
}

struct ThemeBinding {
	control: Rc<ThemeControl>,
	document: Document,
	outside_click: Closure<dyn FnMut(Event)>,
	inside_click: Closure<dyn FnMut(Event)>,
}

/// The `ThemeToggle` hook.
pub struct ThemeToggle {
	store: PreferenceStore,
	os_prefers_dark: Rc<dyn Fn() -> bool>,
	bindings: HashMap<BindingId, ThemeBinding>,
}

impl ThemeToggle {
	/// Uses [`media_prefers_dark`] as OS signal.
	#[must_use]
	pub fn new(store: PreferenceStore) -> Self {
		Self::with_os_signal(store, media_prefers_dark)
	}

	#[must_use]
	pub fn with_os_signal(store: PreferenceStore, os_prefers_dark: impl Fn() -> bool + 'static) -> Self {
		Self {
			store,
			os_prefers_dark: Rc::new(os_prefers_dark),
			bindings: HashMap::new(),
		}
	}

	#[must_use]
	pub fn control(&self, binding: BindingId) -> Option<&Rc<ThemeControl>> {
		self.bindings.get(&binding).map(|bound| &bound.control)
	}
}

impl Hook<HtmlElement> for ThemeToggle {
	#[instrument(skip(self, element))]
	fn mounted(&mut self, binding: BindingId, element: &HtmlElement) -> Result<()> {
		let control = Rc::new(ThemeControl::new(element.clone(), self.store.clone(), self.os_prefers_dark.clone()));
		control.refresh();

		let document = element.owner_document().ok_or(Error::MissingGlobal("document"))?;

		let outside_click = Closure::wrap(Box::new({
			let control = Rc::clone(&control);
			move |event: Event| {
				let span = trace_span!("outside_click", %binding);
				let _enter = span.enter();
				control.on_click_anywhere(&event)
			}
		}) as Box<dyn FnMut(Event)>);
		let inside_click = Closure::wrap(Box::new({
			let control = Rc::clone(&control);
			move |event: Event| {
				let span = trace_span!("inside_click", %binding);
				let _enter = span.enter();
				control.on_click_inside(&event)
			}
		}) as Box<dyn FnMut(Event)>);

		document
			.add_event_listener_with_callback("click", outside_click.as_ref().unchecked_ref())
			.map_err(|error| Error::js(&error))?;
		if let Err(error) = element.add_event_listener_with_callback("click", inside_click.as_ref().unchecked_ref()) {
			let _ = document.remove_event_listener_with_callback("click", outside_click.as_ref().unchecked_ref());
			return Err(Error::js(&error));
		}

		self.bindings.insert(
			binding,
			ThemeBinding {
				control,
				document,
				outside_click,
				inside_click,
			},
		);
		Ok(())
	}

	fn updated(&mut self, binding: BindingId, _element: &HtmlElement) -> Result<()> {
		match self.bindings.get(&binding) {
			Some(bound) => {
				bound.control.refresh();
			}
			None => warn!("No theme state for binding {}; Skipping update.", binding),
		}
		Ok(())
	}

	#[instrument(skip(self, element))]
	fn destroyed(&mut self, binding: BindingId, element: &HtmlElement) {
		let ThemeBinding {
			control,
			document,
			outside_click,
			inside_click,
		} = match self.bindings.remove(&binding) {
			Some(bound) => bound,
			None => {
				warn!("No theme state for binding {}; Nothing to remove.", binding);
				return;
			}
		};

		if let Err(error) = document.remove_event_listener_with_callback("click", outside_click.as_ref().unchecked_ref()) {
			error!("Failed to remove the outside-click listener: {:?}", error)
		}
		// The bound element may already have been swapped out by the patch.
		for target in [&control.element, element] {
			if let Err(error) = target.remove_event_listener_with_callback("click", inside_click.as_ref().unchecked_ref()) {
				error!("Failed to remove the theme menu listener: {:?}", error)
			}
		}
		trace!("Theme listeners removed.");
	}
}
