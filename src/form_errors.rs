use crate::{
	error::{Error, Result},
	registry::{BindingId, Hook},
};
use tracing::{instrument, trace};
use web_sys::{Element, HtmlElement, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};

/// Marks a field (or its wrapper) that failed validation.
pub const ERROR_MARKER_SELECTOR: &str = ".has-errors";

/// Scrolls the first validation error of a form container into view after each patch.
#[derive(Debug, Default)]
pub struct FormHelpers;

impl Hook<HtmlElement> for FormHelpers {
	fn updated(&mut self, _binding: BindingId, element: &HtmlElement) -> Result<()> {
		scroll_first_error(element).map(drop)
	}
}

/// Smooth-scrolls the first [error marker](`ERROR_MARKER_SELECTOR`) below `container` (in document order) to the trailing edge of the viewport.
///
/// Returns the element that was scrolled to, if any.
#[instrument(skip(container))]
pub fn scroll_first_error(container: &Element) -> Result<Option<Element>> {
	let first_error = match container.query_selector(ERROR_MARKER_SELECTOR).map_err(|error| Error::js(&error))? {
		Some(first_error) => first_error,
		None => {
			trace!("No validation errors.");
			return Ok(None);
		}
	};

	let options = ScrollIntoViewOptions::new();
	options.set_behavior(ScrollBehavior::Smooth);
	options.set_block(ScrollLogicalPosition::End);
	options.set_inline(ScrollLogicalPosition::Nearest);
	first_error.scroll_into_view_with_scroll_into_view_options(&options);
	Ok(Some(first_error))
}
