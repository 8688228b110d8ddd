//! [Leaflet](https://leafletjs.com/) as map widget, loaded as the global `L`.

use super::{Bounds, FitOptions, InitialView, LatLng, MapProvider, MapWidget};
use crate::error::{Error, Result};
use js_sys::{Array, Object, Reflect};
use serde::Deserialize;
use tracing::{instrument, trace};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue, UnwrapThrowExt};
use web_sys::HtmlElement;

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_namespace = L, js_name = Map)]
	type LeafletMap;

	#[wasm_bindgen(catch, js_namespace = L, js_name = map)]
	fn new_map(element: &HtmlElement) -> Result<LeafletMap, JsValue>;

	#[wasm_bindgen(method, js_name = setView)]
	fn set_view(this: &LeafletMap, center: &Array, zoom: f64) -> LeafletMap;

	#[wasm_bindgen(method, js_name = fitBounds)]
	fn fit_bounds(this: &LeafletMap, bounds: &Array, options: &Object) -> LeafletMap;

	#[wasm_bindgen(method)]
	fn remove(this: &LeafletMap) -> LeafletMap;
}

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_namespace = L, js_name = TileLayer)]
	type TileLayer;

	#[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
	fn tile_layer(url_template: &str, options: &Object) -> TileLayer;

	#[wasm_bindgen(method, js_name = addTo)]
	fn add_to(this: &TileLayer, map: &LeafletMap) -> TileLayer;
}

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_namespace = L, js_name = LayerGroup)]
	type LayerGroup;

	#[wasm_bindgen(js_namespace = L, js_name = layerGroup)]
	fn layer_group() -> LayerGroup;

	#[wasm_bindgen(method, js_name = addTo)]
	fn add_to(this: &LayerGroup, map: &LeafletMap) -> LayerGroup;

	#[wasm_bindgen(method, js_name = clearLayers)]
	fn clear_layers(this: &LayerGroup) -> LayerGroup;
}

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_namespace = L, js_name = Marker)]
	type Marker;

	#[wasm_bindgen(js_namespace = L, js_name = marker)]
	fn marker(at: &Array) -> Marker;

	#[wasm_bindgen(method, js_name = bindPopup)]
	fn bind_popup(this: &Marker, content: &str) -> Marker;

	#[wasm_bindgen(method, js_name = addTo)]
	fn add_to(this: &Marker, group: &LayerGroup) -> Marker;
}

pub const OPEN_STREET_MAP_TILES: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OPEN_STREET_MAP_ATTRIBUTION: &str = "© OpenStreetMap contributors";
pub const DEFAULT_TOKEN_TILES: &str = "https://api.mapbox.com/styles/v1/mapbox/streets-v12/tiles/{z}/{x}/{y}?access_token={accessToken}";
pub const DEFAULT_TOKEN_ATTRIBUTION: &str = "© Mapbox © OpenStreetMap contributors";

/// The tile source underneath the markers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Basemap {
	/// Public OpenStreetMap tiles. No token needed.
	OpenStreetMap,
	/// A tile service gated by the `data-token` access token, substituted for `{accessToken}` in `url-template`.
	#[serde(rename_all = "kebab-case")]
	TokenTiles {
		#[serde(default = "default_token_tiles")]
		url_template: String,
		#[serde(default = "default_token_attribution")]
		attribution: String,
	},
}

fn default_token_tiles() -> String {
	DEFAULT_TOKEN_TILES.to_owned()
}

fn default_token_attribution() -> String {
	DEFAULT_TOKEN_ATTRIBUTION.to_owned()
}

impl Default for Basemap {
	fn default() -> Self {
		Self::OpenStreetMap
	}
}

impl Basemap {
	#[must_use]
	pub fn token_tiles() -> Self {
		Self::TokenTiles {
			url_template: default_token_tiles(),
			attribution: default_token_attribution(),
		}
	}

	/// Token-gated tile maps jump to the fitted region with a fixed margin instead of flying there.
	#[must_use]
	pub fn fit_options(&self) -> FitOptions {
		match self {
			Self::OpenStreetMap => FitOptions::default(),
			Self::TokenTiles { .. } => FitOptions {
				padding: Some((50, 50)),
				animate: Some(false),
				..FitOptions::default()
			},
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct Leaflet {
	basemap: Basemap,
}

impl Leaflet {
	#[must_use]
	pub fn new(basemap: Basemap) -> Self {
		Self { basemap }
	}

	#[must_use]
	pub fn basemap(&self) -> &Basemap {
		&self.basemap
	}
}

impl MapProvider for Leaflet {
	fn requires_token(&self) -> bool {
		matches!(self.basemap, Basemap::TokenTiles { .. })
	}

	fn fit_options(&self) -> FitOptions {
		self.basemap.fit_options()
	}

	#[instrument(skip(self, element, token))]
	fn create(&self, element: &HtmlElement, view: InitialView, token: Option<&str>) -> Result<Box<dyn MapWidget>> {
		let leaflet = Reflect::get(&js_sys::global(), &JsValue::from_str("L")).map_err(|error| Error::js(&error))?;
		if leaflet.is_undefined() {
			return Err(Error::MissingGlobal("L"));
		}

		let map = new_map(element).map_err(|error| Error::js(&error))?;
		map.set_view(&lat_lng(view.center.0, view.center.1), f64::from(view.zoom));

		let tiles = match &self.basemap {
			Basemap::OpenStreetMap => tile_layer(OPEN_STREET_MAP_TILES, &options(&[("attribution", OPEN_STREET_MAP_ATTRIBUTION.into()), ("maxZoom", 16.into())])),
			Basemap::TokenTiles { url_template, attribution } => tile_layer(
				url_template,
				&options(&[
					("attribution", attribution.as_str().into()),
					("maxZoom", 18.into()),
					("tileSize", 512.into()),
					("zoomOffset", (-1).into()),
					("accessToken", token.unwrap_or_default().into()),
				]),
			),
		};
		tiles.add_to(&map);

		let markers = layer_group();
		markers.add_to(&map);
		trace!("Created Leaflet map.");

		Ok(Box::new(LeafletWidget { map, markers, removed: false }))
	}
}

struct LeafletWidget {
	map: LeafletMap,
	markers: LayerGroup,
	removed: bool,
}

impl MapWidget for LeafletWidget {
	fn clear_markers(&mut self) {
		self.markers.clear_layers();
	}

	fn add_marker(&mut self, at: LatLng, popup: &str) {
		marker(&lat_lng(at.lat, at.lon)).bind_popup(popup).add_to(&self.markers);
	}

	fn fit_bounds(&mut self, bounds: &Bounds, fit: &FitOptions) {
		let corners = Array::of2(&lat_lng(bounds.south, bounds.west), &lat_lng(bounds.north, bounds.east));
		let mut entries = vec![("maxZoom", JsValue::from(fit.max_zoom))];
		if let Some(animate) = fit.animate {
			entries.push(("animate", animate.into()));
		}
		if let Some((x, y)) = fit.padding {
			entries.push(("padding", Array::of2(&x.into(), &y.into()).into()));
		}
		self.map.fit_bounds(&corners, &options(&entries));
	}

	fn remove(&mut self) {
		if !self.removed {
			self.removed = true;
			self.map.remove();
			trace!("Removed Leaflet map.");
		}
	}
}

fn lat_lng(lat: f64, lon: f64) -> Array {
	Array::of2(&lat.into(), &lon.into())
}

fn options(entries: &[(&str, JsValue)]) -> Object {
	let object = Object::new();
	for (key, value) in entries {
		Reflect::set(&object, &JsValue::from_str(key), value).unwrap_throw();
	}
	object
}
