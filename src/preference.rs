//! Durable browser-local storage of the theme preference.

use core::{fmt, str::FromStr};
use tracing::{instrument, trace, warn};
use web_sys::Storage;

/// The user's explicit theme choice, or its absence (`System`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemePreference {
	Light,
	Dark,
	#[default]
	System,
}

impl ThemePreference {
	pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Light => "light",
			Self::Dark => "dark",
			Self::System => "system",
		}
	}
}

impl fmt::Display for ThemePreference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownThemePreference(pub String);

impl FromStr for ThemePreference {
	type Err = UnknownThemePreference;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"light" => Ok(Self::Light),
			"dark" => Ok(Self::Dark),
			"system" => Ok(Self::System),
			other => Err(UnknownThemePreference(other.to_owned())),
		}
	}
}

/// One string key in `localStorage`.
///
/// If storage is unavailable (privacy mode, sandboxed frame), reads yield [`ThemePreference::System`] and writes are dropped with a warning.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
	key: String,
	storage: Option<Storage>,
}

impl PreferenceStore {
	#[must_use]
	pub fn new(key: impl Into<String>, storage: Option<Storage>) -> Self {
		Self { key: key.into(), storage }
	}

	/// Opens the window's `localStorage`.
	#[must_use]
	pub fn local(key: impl Into<String>) -> Self {
		let storage = web_sys::window().and_then(|window| match window.local_storage() {
			Ok(storage) => storage,
			Err(error) => {
				warn!("`localStorage` is not accessible: {:?}", error);
				None
			}
		});
		Self::new(key, storage)
	}

	#[must_use]
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Reads the stored preference. Absent or unrecognised values mean [`ThemePreference::System`].
	#[must_use]
	#[instrument(skip(self), fields(key = %self.key))]
	pub fn load(&self) -> ThemePreference {
		let storage = match &self.storage {
			Some(storage) => storage,
			None => return ThemePreference::System,
		};
		match storage.get_item(&self.key) {
			Ok(None) => ThemePreference::System,
			Ok(Some(stored)) => match stored.parse() {
				Ok(preference) => {
					if cfg!(feature = "dangerous-logging") {
						trace!("Loaded theme preference {}.", preference);
					}
					preference
				}
				Err(UnknownThemePreference(other)) => {
					warn!("Ignoring unrecognised stored theme preference {:?}.", other);
					ThemePreference::System
				}
			},
			Err(error) => {
				warn!("Could not read theme preference: {:?}", error);
				ThemePreference::System
			}
		}
	}

	#[instrument(skip(self), fields(key = %self.key))]
	pub fn save(&self, preference: ThemePreference) {
		match &self.storage {
			Some(storage) => {
				if let Err(error) = storage.set_item(&self.key, preference.as_str()) {
					warn!("Could not persist theme preference: {:?}", error)
				}
			}
			None => warn!("No `localStorage`; Theme preference {} is not persisted.", preference),
		}
	}

	/// Removes the stored preference, reverting to [`ThemePreference::System`].
	pub fn clear(&self) {
		if let Some(storage) = &self.storage {
			if let Err(error) = storage.remove_item(&self.key) {
				warn!("Could not clear theme preference: {:?}", error)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn literal_values_round_trip() {
		for preference in ThemePreference::ALL {
			assert_eq!(preference.as_str().parse(), Ok(preference));
		}
		assert_eq!("Dark".parse::<ThemePreference>(), Err(UnknownThemePreference("Dark".to_owned())));
	}

	#[test]
	fn missing_storage_means_system() {
		let store = PreferenceStore::new("theme", None);
		assert_eq!(store.load(), ThemePreference::System);
		store.save(ThemePreference::Dark);
		assert_eq!(store.load(), ThemePreference::System);
	}
}
