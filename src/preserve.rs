//! Keeps client-owned open/closed state across server patches.
//!
//! `<dialog open>` and `<details open>` carry their state as an attribute, so adopting the server's attribute set
//! would close them on every unrelated re-render. For those element kinds the attributes of the element already in
//! the document win.

use tracing::{error, instrument, trace, warn};
use web_sys::{Element, NamedNodeMap};

/// Tag names (as reported by [***Element.tagName***](https://developer.mozilla.org/en-US/docs/Web/API/Element/tagName) for HTML elements) whose attributes are preserved.
pub const STATEFUL_TAGS: [&str; 2] = ["DIALOG", "DETAILS"];

#[must_use]
pub fn is_stateful(tag_name: &str) -> bool {
	STATEFUL_TAGS.iter().any(|stateful| stateful.eq_ignore_ascii_case(tag_name))
}

/// Called with the element currently in the document (`from`) and its proposed replacement (`to`) before the replacement is committed.
///
/// For [stateful](`STATEFUL_TAGS`) element kinds, `to`'s attribute set is made equal to `from`'s and `true` is returned.
/// Other elements are left untouched.
///
/// Only attributes are written. Children, identity and event listeners of either element are not affected.
#[instrument(skip(from, to), fields(tag = %from.tag_name()))]
pub fn preserve_stateful_attributes(from: &Element, to: &Element) -> bool {
	if !is_stateful(&from.tag_name()) {
		return false;
	}

	let kept = from.attributes();
	let proposed = to.attributes();

	// Walk backwards since removal shifts later indices.
	for i in (0..proposed.length()).rev() {
		let attribute = match proposed.item(i) {
			Some(attribute) => attribute,
			None => {
				warn!("Proposed attribute {} vanished during the walk; Skipping.", i);
				continue;
			}
		};
		if kept.get_named_item_ns(attribute.namespace_uri().as_deref(), &attribute.local_name()).is_none() {
			trace!("Dropping proposed attribute {:?}.", attribute.name());
			remove_attribute(&proposed, &attribute);
		}
	}

	for i in 0..kept.length() {
		let attribute = match kept.item(i) {
			Some(attribute) => attribute,
			None => {
				warn!("Kept attribute {} vanished during the walk; Skipping.", i);
				continue;
			}
		};
		if let Err(error) = to.set_attribute_ns(attribute.namespace_uri().as_deref(), &attribute.name(), &attribute.value()) {
			error!("Could not preserve attribute {:?}: {:?}", attribute.name(), error)
		}
	}

	true
}

fn remove_attribute(attributes: &NamedNodeMap, attribute: &web_sys::Attr) {
	if let Err(error) = attributes.remove_named_item_ns(attribute.namespace_uri().as_deref(), &attribute.local_name()) {
		warn!("Could not remove attribute {:?}: {:?}", attribute.name(), error)
	}
}
