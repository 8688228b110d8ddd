//! Page-level settings. Every field has a default, so `{}` is a complete configuration.

use crate::{
	error::{Error, Result},
	map::{leaflet::Basemap, FitPolicy, InitialView},
};
use serde::Deserialize;
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// Maximum level forwarded to the browser console: `trace`, `debug`, `info`, `warn` or `error`.
	pub log_level: String,
	/// `localStorage` key of the theme preference.
	pub storage_key: String,
	pub live_path: String,
	pub long_poll_fallback_ms: u32,
	pub map: MapConfig,
	pub progress: ProgressConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_level: "info".to_owned(),
			storage_key: "theme".to_owned(),
			live_path: "/live".to_owned(),
			long_poll_fallback_ms: 2500,
			map: MapConfig::default(),
			progress: ProgressConfig::default(),
		}
	}
}

impl Config {
	/// # Errors
	///
	/// [`Error::Config`] for invalid JSON, unknown keys or mistyped values.
	pub fn from_json(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(Error::Config)
	}

	/// Falls back to `info` for unrecognised level names.
	#[must_use]
	pub fn max_level(&self) -> Level {
		self.log_level.parse().unwrap_or(Level::INFO)
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MapConfig {
	/// The hook name the markup refers to the map by.
	pub hook_name: String,
	pub basemap: Basemap,
	pub initial_view: InitialView,
	pub fit_policy: FitPolicy,
}

impl Default for MapConfig {
	fn default() -> Self {
		Self {
			hook_name: "Leaflet".to_owned(),
			basemap: Basemap::default(),
			initial_view: InitialView::default(),
			fit_policy: FitPolicy::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProgressConfig {
	pub bar_color: String,
	pub shadow_color: String,
	/// Navigations faster than this don't show the bar at all.
	pub show_delay_ms: u32,
}

impl Default for ProgressConfig {
	fn default() -> Self {
		Self {
			bar_color: "#29d".to_owned(),
			shadow_color: "rgba(0, 0, 0, .3)".to_owned(),
			show_delay_ms: 300,
		}
	}
}
