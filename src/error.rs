use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures that are surfaced to the host page.
///
/// Everything else (a missing icon, an absent error marker, no `matchMedia`) is "nothing to do" and at most logged.
#[derive(Debug, Error)]
pub enum Error {
	#[error("malformed `data-positions` payload: {0}")]
	MalformedPositions(#[from] serde_json::Error),

	#[error("missing required attribute `{name}`")]
	MissingAttribute { name: &'static str },

	#[error("no hook registered under {0:?}")]
	UnknownHook(String),

	#[error("no `<meta name=\"csrf-token\">` content found")]
	MissingCsrfToken,

	#[error("JavaScript global `{0}` is not available")]
	MissingGlobal(&'static str),

	#[error("malformed configuration: {0}")]
	Config(serde_json::Error),

	#[error("JavaScript error: {0}")]
	Js(String),
}

impl Error {
	/// Wraps a thrown JavaScript value, keeping only its printable form.
	pub fn js(value: &JsValue) -> Self {
		Self::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
	}
}

impl From<Error> for JsValue {
	fn from(error: Error) -> Self {
		js_sys::Error::new(&error.to_string()).into()
	}
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
