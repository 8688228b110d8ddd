//! Exposes a [`HookRegistry`] as the plain `{ mounted, updated, destroyed }` hook objects the connection library expects.
//!
//! Each JS hook instance remembers its [`BindingId`] so that later callbacks for the same element reach the same binding.
//! Mounting an instance that is still bound destroys its previous binding first.

use crate::registry::{BindingId, HookRegistry};
use core::fmt;
use js_sys::{Function, Object, Reflect};
use std::{cell::RefCell, rc::Rc};
use tracing::{error, trace_span, warn};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::HtmlElement;

#[wasm_bindgen(inline_js = "
export function bind_hook(name, mounted, updated, destroyed) {
	return {
		mounted() {
			if (this.__bindingId !== undefined) {
				destroyed(this.__bindingId, this.el);
				this.__bindingId = undefined;
			}
			this.__bindingId = mounted(name, this.el);
		},
		updated() { updated(this.__bindingId, this.el); },
		destroyed() { destroyed(this.__bindingId, this.el); },
	};
}
")]
extern "C" {
	fn bind_hook(name: &str, mounted: &Function, updated: &Function, destroyed: &Function) -> Object;
}

pub type SharedRegistry = Rc<RefCell<HookRegistry<HtmlElement>>>;

/// Owns the callbacks behind the exported hook objects. They stop working once this is dropped.
pub struct HookBridge {
	hooks: Object,
	_mounted: Closure<dyn FnMut(String, HtmlElement) -> Result<u32, JsValue>>,
	_updated: Closure<dyn FnMut(Option<u32>, HtmlElement) -> Result<(), JsValue>>,
	_destroyed: Closure<dyn FnMut(Option<u32>, HtmlElement)>,
}

impl fmt::Debug for HookBridge {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HookBridge").field("hooks", &self.hooks).finish_non_exhaustive()
	}
}

impl HookBridge {
	#[must_use]
	pub fn new(registry: &SharedRegistry) -> Self {
		let mounted = Closure::wrap(Box::new({
			let registry = Rc::clone(registry);
			move |name: String, element: HtmlElement| -> Result<u32, JsValue> {
				let span = trace_span!("mounted", hook = name.as_str());
				let _enter = span.enter();
				match registry.borrow_mut().mount(&name, &element) {
					Ok(binding) => Ok(binding.get()),
					Err(error) => {
						error!("Could not mount {:?}: {}", name, error);
						Err(error.into())
					}
				}
			}
		}) as Box<dyn FnMut(String, HtmlElement) -> Result<u32, JsValue>>);

		let updated = Closure::wrap(Box::new({
			let registry = Rc::clone(registry);
			move |binding: Option<u32>, element: HtmlElement| -> Result<(), JsValue> {
				let binding = match binding.and_then(BindingId::from_raw) {
					Some(binding) => binding,
					None => {
						warn!("`updated` on an element whose mount failed; Skipping.");
						return Ok(());
					}
				};
				registry.borrow_mut().update(binding, &element).map_err(|error| {
					error!("Update of binding {} failed: {}", binding, error);
					error.into()
				})
			}
		}) as Box<dyn FnMut(Option<u32>, HtmlElement) -> Result<(), JsValue>>);

		let destroyed = Closure::wrap(Box::new({
			let registry = Rc::clone(registry);
			move |binding: Option<u32>, element: HtmlElement| match binding.and_then(BindingId::from_raw) {
				Some(binding) => {
					registry.borrow_mut().destroy(binding, &element);
				}
				None => warn!("`destroyed` on an element whose mount failed; Skipping."),
			}
		}) as Box<dyn FnMut(Option<u32>, HtmlElement)>);

		let hooks = Object::new();
		for name in registry.borrow().names() {
			let hook = bind_hook(name, mounted.as_ref().unchecked_ref(), updated.as_ref().unchecked_ref(), destroyed.as_ref().unchecked_ref());
			if let Err(error) = Reflect::set(&hooks, &JsValue::from_str(name), &hook) {
				error!("Could not export hook {:?}: {:?}", name, error)
			}
		}

		Self {
			hooks,
			_mounted: mounted,
			_updated: updated,
			_destroyed: destroyed,
		}
	}

	/// The `{ [name]: { mounted, updated, destroyed } }` object to hand to the connection library.
	#[must_use]
	pub fn hooks(&self) -> &Object {
		&self.hooks
	}
}
