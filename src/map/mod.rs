//! Incident maps: one widget per bound element, repopulated in place on every patch.
//!
//! The element carries the positions to show as JSON in `data-positions`
//! (`[{"lat": 36.0, "lon": 16.0, "timestamp": "…"}, …]`) and, for token-gated basemaps, an access token in `data-token`.
//!
//! Malformed position data is an error for the binding rather than an empty map,
//! since an empty map would be indistinguishable from one without incidents.

use crate::{
	error::{Error, Result},
	registry::{BindingId, Hook},
};
use hashbrown::HashMap;
use serde::Deserialize;
use tracing::{error, info, instrument, trace, warn};
use web_sys::{Element, HtmlElement};

pub mod leaflet;

pub const POSITIONS_ATTRIBUTE: &str = "data-positions";
pub const TOKEN_ATTRIBUTE: &str = "data-token";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
	pub lat: f64,
	pub lon: f64,
}

/// One reported position. List order is display order only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Position {
	pub lat: f64,
	pub lon: f64,
	pub timestamp: String,
}

impl Position {
	#[must_use]
	pub fn at(&self) -> LatLng {
		LatLng { lat: self.lat, lon: self.lon }
	}

	#[must_use]
	pub fn popup(&self) -> String {
		format!("Timestamp: {}", self.timestamp)
	}
}

/// # Errors
///
/// [`Error::MalformedPositions`] for anything that isn't a JSON array of complete position records.
pub fn parse_positions(json: &str) -> Result<Vec<Position>> {
	Ok(serde_json::from_str(json)?)
}

/// Reads and parses [`POSITIONS_ATTRIBUTE`].
///
/// # Errors
///
/// [`Error::MissingAttribute`] if the attribute is absent, otherwise as [`parse_positions`].
pub fn read_positions(element: &Element) -> Result<Vec<Position>> {
	parse_positions(&positions_attribute(element)?)
}

fn positions_attribute(element: &Element) -> Result<String> {
	element.get_attribute(POSITIONS_ATTRIBUTE).ok_or(Error::MissingAttribute { name: POSITIONS_ATTRIBUTE })
}

/// The minimal latitude/longitude rectangle covering a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
	pub south: f64,
	pub west: f64,
	pub north: f64,
	pub east: f64,
}

impl Bounds {
	#[must_use]
	pub fn from_point(point: LatLng) -> Self {
		Self {
			south: point.lat,
			west: point.lon,
			north: point.lat,
			east: point.lon,
		}
	}

	/// `None` for no points.
	pub fn covering(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
		let mut points = points.into_iter();
		let mut bounds = Self::from_point(points.next()?);
		for point in points {
			bounds.extend(point);
		}
		Some(bounds)
	}

	pub fn extend(&mut self, point: LatLng) {
		self.south = self.south.min(point.lat);
		self.west = self.west.min(point.lon);
		self.north = self.north.max(point.lat);
		self.east = self.east.max(point.lon);
	}

	#[must_use]
	pub fn contains(&self, point: LatLng) -> bool {
		(self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lon)
	}

	#[must_use]
	pub fn is_point(&self) -> bool {
		#[allow(clippy::float_cmp)]
		let is_point = self.south == self.north && self.west == self.east;
		is_point
	}
}

/// How the viewport is fitted to the positions.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
	/// Caps the zoom level so that a single point or a tight cluster isn't shown at street level.
	pub max_zoom: u8,
	/// Pixels kept free around the fitted region (horizontal, vertical).
	pub padding: Option<(u32, u32)>,
	/// `None` leaves the choice to the widget.
	pub animate: Option<bool>,
}

impl Default for FitOptions {
	fn default() -> Self {
		Self {
			max_zoom: 7,
			padding: None,
			animate: None,
		}
	}
}

/// When fitting applies at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FitPolicy {
	/// The viewport is fitted if at least this many positions are shown.
	/// `1` fits whenever there is anything to show, `2` keeps the default view for a lone point.
	pub min_positions: usize,
}

impl Default for FitPolicy {
	fn default() -> Self {
		Self { min_positions: 1 }
	}
}

impl FitPolicy {
	#[must_use]
	pub fn applies_to(self, position_count: usize) -> bool {
		position_count > 0 && position_count >= self.min_positions
	}
}

/// The view a new widget starts with.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InitialView {
	pub center: (f64, f64),
	pub zoom: u8,
}

impl Default for InitialView {
	fn default() -> Self {
		Self { center: (36.0, 16.0), zoom: 2 }
	}
}

/// A live third-party map widget anchored to one element.
pub trait MapWidget {
	/// Removes every marker added through [`MapWidget::add_marker`].
	fn clear_markers(&mut self);
	fn add_marker(&mut self, at: LatLng, popup: &str);
	fn fit_bounds(&mut self, bounds: &Bounds, options: &FitOptions);
	/// Tears the widget down. No other method is called afterwards.
	fn remove(&mut self);
}

/// Creates [`MapWidget`]s.
pub trait MapProvider {
	/// Whether widgets need the [`TOKEN_ATTRIBUTE`] value.
	fn requires_token(&self) -> bool;

	fn fit_options(&self) -> FitOptions;

	/// # Errors
	///
	/// If the underlying library is unavailable or refuses the element.
	fn create(&self, element: &HtmlElement, view: InitialView, token: Option<&str>) -> Result<Box<dyn MapWidget>>;
}

/// Replaces all markers on `widget` with `positions` and fits the viewport if `policy` says so.
///
/// Returns the region the viewport was fitted to.
pub fn populate(widget: &mut dyn MapWidget, positions: &[Position], options: &FitOptions, policy: FitPolicy) -> Option<Bounds> {
	widget.clear_markers();
	for position in positions {
		widget.add_marker(position.at(), &position.popup());
	}

	let bounds = Bounds::covering(positions.iter().map(Position::at))?;
	if policy.applies_to(positions.len()) {
		widget.fit_bounds(&bounds, options);
		Some(bounds)
	} else {
		trace!("Keeping the initial view for {} position(s).", positions.len());
		None
	}
}

struct MapBinding {
	widget: Box<dyn MapWidget>,
	/// The [`POSITIONS_ATTRIBUTE`] value the markers were last populated from.
	shown: String,
}

/// The map hook. Owns every widget it creates, keyed by binding.
///
/// Patches that leave [`POSITIONS_ATTRIBUTE`] unchanged don't touch the widget, so the user's pan and zoom survive them.
pub struct MapHook<P: MapProvider> {
	provider: P,
	view: InitialView,
	policy: FitPolicy,
	widgets: HashMap<BindingId, MapBinding>,
}

impl<P: MapProvider> MapHook<P> {
	#[must_use]
	pub fn new(provider: P, view: InitialView, policy: FitPolicy) -> Self {
		Self {
			provider,
			view,
			policy,
			widgets: HashMap::new(),
		}
	}

	#[must_use]
	pub fn widget_count(&self) -> usize {
		self.widgets.len()
	}

	fn populate(&mut self, binding: BindingId, positions: &[Position]) -> Option<Bounds> {
		if cfg!(feature = "dangerous-logging") {
			trace!("Positions for binding {}: {:?}", binding, positions);
		}
		let options = self.provider.fit_options();
		let bound = self.widgets.get_mut(&binding)?;
		populate(bound.widget.as_mut(), positions, &options, self.policy)
	}
}

impl<P: MapProvider> Hook<HtmlElement> for MapHook<P> {
	#[instrument(skip(self, element))]
	fn mounted(&mut self, binding: BindingId, element: &HtmlElement) -> Result<()> {
		let token = if self.provider.requires_token() {
			Some(element.get_attribute(TOKEN_ATTRIBUTE).ok_or(Error::MissingAttribute { name: TOKEN_ATTRIBUTE })?)
		} else {
			None
		};
		// Parse before creating anything so that malformed data leaves no widget behind.
		let shown = positions_attribute(element)?;
		let positions = parse_positions(&shown)?;

		if let Some(mut stale) = self.widgets.remove(&binding) {
			error!("Binding {} already owned a map widget; Removing it.", binding);
			stale.widget.remove();
		}
		let widget = self.provider.create(element, self.view, token.as_deref())?;
		self.widgets.insert(binding, MapBinding { widget, shown });

		let fitted = self.populate(binding, &positions);
		info!("Map mounted with {} position(s), fitted: {}.", positions.len(), fitted.is_some());
		Ok(())
	}

	#[instrument(skip(self, element))]
	fn updated(&mut self, binding: BindingId, element: &HtmlElement) -> Result<()> {
		let shown = match self.widgets.get(&binding) {
			Some(bound) => &bound.shown,
			None => {
				warn!("No map widget for binding {}; Skipping update.", binding);
				return Ok(());
			}
		};

		let json = positions_attribute(element)?;
		if json == *shown {
			trace!("Positions unchanged; Keeping the current view.");
			return Ok(());
		}
		let positions = parse_positions(&json)?;
		self.populate(binding, &positions);
		if let Some(bound) = self.widgets.get_mut(&binding) {
			bound.shown = json;
		}
		Ok(())
	}

	#[instrument(skip(self, _element))]
	fn destroyed(&mut self, binding: BindingId, _element: &HtmlElement) {
		match self.widgets.remove(&binding) {
			Some(mut bound) => bound.widget.remove(),
			None => warn!("No map widget for binding {}; Nothing to remove.", binding),
		}
	}
}
