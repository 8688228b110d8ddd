//! First-paint detection and entrance animations.
//!
//! A page-root `ParentMount` binding flips the [`InitialPaintFlag`] once, [`SETTLE_DELAY_MS`] after it mounts.
//! `FadeIn` bindings only animate on mount once that has happened, so the initial render doesn't fade in piecemeal.

use crate::{
	error::{Error, Result},
	registry::{BindingId, Hook},
};
use hashbrown::HashMap;
use std::{cell::Cell, rc::Rc};
use tracing::{error, instrument, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::HtmlElement;

/// Fixed delay between the page-root mount and the end of the initial paint.
pub const SETTLE_DELAY_MS: i32 = 100;

/// Added to `<body>` once the initial paint is complete, for stylesheets that key off it.
pub const INITIAL_MOUNT_COMPLETE_CLASS: &str = "initial-mount-complete";

pub const FADE_IN_CLASS: &str = "fade-in";

/// Write-once (`false` → `true`) marker for "the initial paint is complete". Shared between hooks, confined to the UI thread.
#[derive(Debug, Clone, Default)]
pub struct InitialPaintFlag(Rc<Cell<bool>>);

impl InitialPaintFlag {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` if this call performed the transition.
	pub fn complete(&self) -> bool {
		!self.0.replace(true)
	}

	#[must_use]
	pub fn is_complete(&self) -> bool {
		self.0.get()
	}

	/// A view that can only query the flag.
	#[must_use]
	pub fn reader(&self) -> InitialPaint {
		InitialPaint(self.0.clone())
	}
}

/// Read-only view of an [`InitialPaintFlag`].
#[derive(Debug, Clone)]
pub struct InitialPaint(Rc<Cell<bool>>);

impl InitialPaint {
	#[must_use]
	pub fn is_complete(&self) -> bool {
		self.0.get()
	}
}

struct PendingSettle {
	handle: i32,
	_callback: Closure<dyn FnMut()>,
}

/// Marks the initial paint as complete shortly after mounting.
pub struct ParentMount {
	flag: InitialPaintFlag,
	pending: HashMap<BindingId, PendingSettle>,
}

impl ParentMount {
	#[must_use]
	pub fn new(flag: InitialPaintFlag) -> Self {
		Self { flag, pending: HashMap::new() }
	}
}

impl Hook<HtmlElement> for ParentMount {
	#[instrument(skip(self, _element))]
	fn mounted(&mut self, binding: BindingId, _element: &HtmlElement) -> Result<()> {
		if self.flag.is_complete() {
			trace!("Initial paint already complete; Nothing to schedule.");
			return Ok(());
		}

		let window = web_sys::window().ok_or(Error::MissingGlobal("window"))?;
		let flag = self.flag.clone();
		let callback = Closure::wrap(Box::new(move || {
			if flag.complete() {
				trace!("Initial paint complete.");
			}
			let body = web_sys::window().and_then(|window| window.document()).and_then(|document| document.body());
			match body {
				Some(body) => {
					if let Err(error) = body.class_list().add_1(INITIAL_MOUNT_COMPLETE_CLASS) {
						error!("Could not mark `<body>`: {:?}", error)
					}
				}
				None => warn!("No `<body>` to mark as {:?}.", INITIAL_MOUNT_COMPLETE_CLASS),
			}
		}) as Box<dyn FnMut()>);

		let handle = window
			.set_timeout_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref(), SETTLE_DELAY_MS)
			.map_err(|error| Error::js(&error))?;
		self.pending.insert(binding, PendingSettle { handle, _callback: callback });
		Ok(())
	}

	#[instrument(skip(self, _element))]
	fn destroyed(&mut self, binding: BindingId, _element: &HtmlElement) {
		if let Some(PendingSettle { handle, .. }) = self.pending.remove(&binding) {
			match web_sys::window() {
				// Harmless if the timeout already fired.
				Some(window) => window.clear_timeout_with_handle(handle),
				None => warn!("No `window` to clear settle timeout {} on.", handle),
			}
		}
	}
}

/// Entrance animation for content that appears (or changes) after the initial paint.
pub struct FadeIn {
	initial_paint: InitialPaint,
}

impl FadeIn {
	#[must_use]
	pub fn new(initial_paint: InitialPaint) -> Self {
		Self { initial_paint }
	}
}

impl Hook<HtmlElement> for FadeIn {
	fn mounted(&mut self, _binding: BindingId, element: &HtmlElement) -> Result<()> {
		if self.initial_paint.is_complete() {
			add_fade_in(element, false)
		} else {
			trace!("Suppressing entrance animation during the initial paint.");
			Ok(())
		}
	}

	fn updated(&mut self, _binding: BindingId, element: &HtmlElement) -> Result<()> {
		add_fade_in(element, true)
	}
}

fn add_fade_in(element: &HtmlElement, restart: bool) -> Result<()> {
	let class_list = element.class_list();
	if restart && class_list.contains(FADE_IN_CLASS) {
		class_list.remove_1(FADE_IN_CLASS).map_err(|error| Error::js(&error))?;
		// Forces a style flush so that re-adding the class starts the animation over.
		let _ = element.offset_width();
	}
	class_list.add_1(FADE_IN_CLASS).map_err(|error| Error::js(&error))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flag_transitions_once() {
		let flag = InitialPaintFlag::new();
		let reader = flag.reader();
		assert!(!reader.is_complete());

		assert!(flag.complete());
		assert!(reader.is_complete());

		assert!(!flag.complete());
		assert!(flag.is_complete());
	}

	#[test]
	fn clones_share_state() {
		let flag = InitialPaintFlag::new();
		let other = flag.clone();
		other.complete();
		assert!(flag.reader().is_complete());
	}
}
