//! Name → behavior mapping and the lifecycle bookkeeping of live bindings.
//!
//! The registry is generic over the element type so that the lifecycle rules can be exercised without a browser.
//! In the page, `E` is [`web_sys::HtmlElement`].

use crate::error::{Error, Result};
use core::{fmt, num::NonZeroU32};
use hashbrown::HashMap;
use tracing::{instrument, trace_span, warn};

/// Identifies one [Hook Binding](`HookRegistry`): one element bound to one hook name, from `mounted` to `destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(NonZeroU32);
impl BindingId {
	#[must_use]
	pub fn get(self) -> u32 {
		self.0.get()
	}

	#[must_use]
	pub fn from_raw(raw: u32) -> Option<Self> {
		NonZeroU32::new(raw).map(Self)
	}
}
impl fmt::Display for BindingId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Imperative behavior attached to elements that carry a hook annotation.
///
/// One implementation serves every binding of its name; per-binding state is keyed by [`BindingId`].
/// All three callbacks are optional.
pub trait Hook<E> {
	fn mounted(&mut self, binding: BindingId, element: &E) -> Result<()> {
		let _ = (binding, element);
		Ok(())
	}

	fn updated(&mut self, binding: BindingId, element: &E) -> Result<()> {
		let _ = (binding, element);
		Ok(())
	}

	/// Must release everything the binding installed. Runs exactly once per successful `mounted`.
	fn destroyed(&mut self, binding: BindingId, element: &E) {
		let _ = (binding, element);
	}
}

pub struct HookRegistry<E> {
	hooks: HashMap<String, Box<dyn Hook<E>>>,
	live: HashMap<BindingId, String>,
	next_id: u32,
}

impl<E> Default for HookRegistry<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E> fmt::Debug for HookRegistry<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HookRegistry")
			.field("hooks", &self.hooks.keys().collect::<Vec<_>>())
			.field("live", &self.live)
			.finish()
	}
}

impl<E> HookRegistry<E> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			hooks: HashMap::new(),
			live: HashMap::new(),
			next_id: 0,
		}
	}

	/// Registers `hook` under `name`, replacing (and returning) any previous registration.
	pub fn register(&mut self, name: impl Into<String>, hook: impl Hook<E> + 'static) -> Option<Box<dyn Hook<E>>> {
		self.hooks.insert(name.into(), Box::new(hook))
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<String>, hook: impl Hook<E> + 'static) -> Self {
		self.register(name, hook);
		self
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.hooks.keys().map(String::as_str)
	}

	/// The number of bindings that were mounted and not yet destroyed.
	#[must_use]
	pub fn live_count(&self) -> usize {
		self.live.len()
	}

	#[must_use]
	pub fn hook_name(&self, binding: BindingId) -> Option<&str> {
		self.live.get(&binding).map(String::as_str)
	}

	/// Creates a new binding and runs the hook's `mounted` callback.
	///
	/// # Errors
	///
	/// [`Error::UnknownHook`] if nothing is registered under `name`, or whatever `mounted` fails with.
	/// The binding is not kept in either case, so no `updated` or `destroyed` will follow for it.
	#[instrument(skip(self, element))]
	pub fn mount(&mut self, name: &str, element: &E) -> Result<BindingId> {
		let hook = self.hooks.get_mut(name).ok_or_else(|| Error::UnknownHook(name.to_owned()))?;

		// Ids wrap around after `u32::MAX` mounts, skipping any that are still live.
		let binding = loop {
			self.next_id = self.next_id.checked_add(1).unwrap_or(1);
			let candidate = BindingId(NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN));
			if !self.live.contains_key(&candidate) {
				break candidate;
			}
		};

		let span = trace_span!("mounted", hook = name, %binding);
		let _enter = span.enter();
		hook.mounted(binding, element)?;

		self.live.insert(binding, name.to_owned());
		Ok(binding)
	}

	/// Runs `updated` for a live binding. Unknown bindings (never mounted, mount failed, already destroyed) are skipped.
	///
	/// # Errors
	///
	/// Whatever the hook's `updated` fails with. The binding stays live.
	#[instrument(skip(self, element))]
	pub fn update(&mut self, binding: BindingId, element: &E) -> Result<()> {
		let name = match self.live.get(&binding) {
			Some(name) => name,
			None => {
				warn!("`updated` for binding {} that isn't live; Skipping.", binding);
				return Ok(());
			}
		};
		let hook = match self.hooks.get_mut(name) {
			Some(hook) => hook,
			None => {
				warn!("Hook {:?} of binding {} was unregistered; Skipping `updated`.", name, binding);
				return Ok(());
			}
		};

		let span = trace_span!("updated", hook = name.as_str(), %binding);
		let _enter = span.enter();
		hook.updated(binding, element)
	}

	/// Ends a binding and runs its `destroyed` callback. Returns whether the binding was live.
	#[instrument(skip(self, element))]
	pub fn destroy(&mut self, binding: BindingId, element: &E) -> bool {
		let name = match self.live.remove(&binding) {
			Some(name) => name,
			None => {
				warn!("`destroyed` for binding {} that isn't live; Skipping.", binding);
				return false;
			}
		};

		let span = trace_span!("destroyed", hook = name.as_str(), %binding);
		let _enter = span.enter();
		match self.hooks.get_mut(&name) {
			Some(hook) => hook.destroyed(binding, element),
			None => warn!("Hook {:?} of binding {} was unregistered; Skipping `destroyed`.", name, binding),
		}
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{cell::RefCell, rc::Rc};

	#[derive(Clone, Default)]
	struct Recorder {
		calls: Rc<RefCell<Vec<String>>>,
		fail_mount: bool,
	}
	impl Hook<&'static str> for Recorder {
		fn mounted(&mut self, binding: BindingId, element: &&'static str) -> Result<()> {
			self.calls.borrow_mut().push(format!("mounted {} {}", binding, element));
			if self.fail_mount {
				Err(Error::MissingAttribute { name: "data-positions" })
			} else {
				Ok(())
			}
		}

		fn updated(&mut self, binding: BindingId, element: &&'static str) -> Result<()> {
			self.calls.borrow_mut().push(format!("updated {} {}", binding, element));
			Ok(())
		}

		fn destroyed(&mut self, binding: BindingId, element: &&'static str) {
			self.calls.borrow_mut().push(format!("destroyed {} {}", binding, element));
		}
	}

	#[test]
	fn lifecycle_is_ordered_per_binding() {
		let recorder = Recorder::default();
		let mut registry = HookRegistry::new().with("Probe", recorder.clone());

		let a = registry.mount("Probe", &"a").unwrap();
		let b = registry.mount("Probe", &"b").unwrap();
		assert_ne!(a, b);
		assert_eq!(registry.live_count(), 2);

		registry.update(a, &"a").unwrap();
		assert!(registry.destroy(a, &"a"));
		registry.update(a, &"a").unwrap();
		assert!(!registry.destroy(a, &"a"));

		assert_eq!(registry.hook_name(b), Some("Probe"));
		assert_eq!(
			*recorder.calls.borrow(),
			[format!("mounted {} a", a), format!("mounted {} b", b), format!("updated {} a", a), format!("destroyed {} a", a)]
		);
	}

	#[test]
	fn failed_mount_leaves_no_binding() {
		let recorder = Recorder { fail_mount: true, ..Recorder::default() };
		let mut registry = HookRegistry::new().with("Broken", recorder.clone());

		assert!(matches!(registry.mount("Broken", &"map"), Err(Error::MissingAttribute { .. })));
		assert_eq!(registry.live_count(), 0);
	}

	#[test]
	fn unknown_hook_is_an_error() {
		let mut registry = HookRegistry::<&'static str>::new();
		assert!(matches!(registry.mount("Nope", &"x"), Err(Error::UnknownHook(name)) if name == "Nope"));
	}

	#[test]
	fn raw_zero_is_not_a_binding() {
		assert_eq!(BindingId::from_raw(0), None);
		assert_eq!(BindingId::from_raw(7).map(BindingId::get), Some(7));
	}
}
