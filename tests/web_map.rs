use live_hooks_dom::{
	error::{Error, Result},
	map::{Bounds, FitOptions, FitPolicy, InitialView, LatLng, MapHook, MapProvider, MapWidget, POSITIONS_ATTRIBUTE, TOKEN_ATTRIBUTE},
	registry::{BindingId, Hook},
};
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

mod web_logging_;
use web_logging_::fixture;

#[derive(Debug, Default)]
struct Log {
	created: Vec<(InitialView, Option<String>)>,
	markers: Vec<(LatLng, String)>,
	fitted: Vec<(Bounds, FitOptions)>,
	clears: usize,
	removed: usize,
}

#[derive(Clone, Default)]
struct Fake {
	log: Rc<RefCell<Log>>,
	token: bool,
}

struct FakeWidget(Rc<RefCell<Log>>);

impl MapProvider for Fake {
	fn requires_token(&self) -> bool {
		self.token
	}

	fn fit_options(&self) -> FitOptions {
		FitOptions {
			padding: self.token.then(|| (50, 50)),
			animate: self.token.then(|| false),
			..FitOptions::default()
		}
	}

	fn create(&self, _element: &HtmlElement, view: InitialView, token: Option<&str>) -> Result<Box<dyn MapWidget>> {
		self.log.borrow_mut().created.push((view, token.map(str::to_owned)));
		Ok(Box::new(FakeWidget(self.log.clone())))
	}
}

impl MapWidget for FakeWidget {
	fn clear_markers(&mut self) {
		let mut log = self.0.borrow_mut();
		log.clears += 1;
		log.markers.clear();
	}

	fn add_marker(&mut self, at: LatLng, popup: &str) {
		self.0.borrow_mut().markers.push((at, popup.to_owned()));
	}

	fn fit_bounds(&mut self, bounds: &Bounds, options: &FitOptions) {
		self.0.borrow_mut().fitted.push((*bounds, options.clone()));
	}

	fn remove(&mut self) {
		self.0.borrow_mut().removed += 1;
	}
}

fn map_element(positions: &str) -> HtmlElement {
	let element = fixture("");
	element.set_attribute(POSITIONS_ATTRIBUTE, positions).unwrap();
	element
}

fn binding() -> BindingId {
	BindingId::from_raw(1).unwrap()
}

#[wasm_bindgen_test]
fn one_widget_across_updates() {
	web_logging_::init();
	let fake = Fake::default();
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy::default());
	let element = map_element(r#"[{"lat": 10, "lon": 10, "timestamp": "a"}, {"lat": 50, "lon": 50, "timestamp": "b"}]"#);

	hook.mounted(binding(), &element).unwrap();
	{
		let log = fake.log.borrow();
		assert_eq!(log.created, [(InitialView { center: (36.0, 16.0), zoom: 2 }, None)]);
		assert_eq!(log.markers.len(), 2);
		assert_eq!(log.markers[1].1, "Timestamp: b");
		let (bounds, _) = &log.fitted[0];
		assert!(bounds.contains(LatLng { lat: 10.0, lon: 10.0 }));
		assert!(bounds.contains(LatLng { lat: 50.0, lon: 50.0 }));
	}

	element.set_attribute(POSITIONS_ATTRIBUTE, r#"[{"lat": -5, "lon": 120, "timestamp": "c"}]"#).unwrap();
	hook.updated(binding(), &element).unwrap();
	{
		let log = fake.log.borrow();
		assert_eq!(log.created.len(), 1, "updates reuse the widget");
		assert_eq!(log.markers, [(LatLng { lat: -5.0, lon: 120.0 }, "Timestamp: c".to_owned())]);
		assert_eq!(log.fitted.len(), 2);
	}
	assert_eq!(hook.widget_count(), 1);

	hook.destroyed(binding(), &element);
	assert_eq!(fake.log.borrow().removed, 1);
	assert_eq!(hook.widget_count(), 0);

	element.remove();
}

#[wasm_bindgen_test]
fn malformed_positions_fail_the_mount() {
	web_logging_::init();
	let fake = Fake::default();
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy::default());

	for malformed in ["not json", r#"[{"lat": 1, "timestamp": "t"}]"#] {
		let element = map_element(malformed);
		assert!(matches!(hook.mounted(binding(), &element), Err(Error::MalformedPositions(_))));
		element.remove();
	}
	assert!(fake.log.borrow().created.is_empty());
	assert_eq!(hook.widget_count(), 0);
}

#[wasm_bindgen_test]
fn malformed_update_keeps_the_widget() {
	web_logging_::init();
	let fake = Fake::default();
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy::default());
	let element = map_element(r#"[{"lat": 1, "lon": 2, "timestamp": "t"}]"#);

	hook.mounted(binding(), &element).unwrap();
	element.set_attribute(POSITIONS_ATTRIBUTE, "[{").unwrap();
	assert!(matches!(hook.updated(binding(), &element), Err(Error::MalformedPositions(_))));
	assert_eq!(hook.widget_count(), 1);
	assert_eq!(fake.log.borrow().markers.len(), 1);

	hook.destroyed(binding(), &element);
	element.remove();
}

#[wasm_bindgen_test]
fn empty_positions_keep_the_initial_view() {
	web_logging_::init();
	let fake = Fake::default();
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy::default());
	let element = map_element("[]");

	hook.mounted(binding(), &element).unwrap();
	assert_eq!(fake.log.borrow().created.len(), 1);
	assert!(fake.log.borrow().fitted.is_empty());

	hook.destroyed(binding(), &element);
	element.remove();
}

#[wasm_bindgen_test]
fn lone_point_with_two_point_policy() {
	web_logging_::init();
	let fake = Fake::default();
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy { min_positions: 2 });
	let element = map_element(r#"[{"lat": 36, "lon": 16, "timestamp": "t1"}]"#);

	hook.mounted(binding(), &element).unwrap();
	assert_eq!(fake.log.borrow().markers.len(), 1);
	assert!(fake.log.borrow().fitted.is_empty());

	hook.destroyed(binding(), &element);
	element.remove();
}

#[wasm_bindgen_test]
fn token_gated_basemaps_need_a_token() {
	web_logging_::init();
	let fake = Fake { token: true, ..Fake::default() };
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy::default());
	let element = map_element(r#"[{"lat": 36, "lon": 16, "timestamp": "t1"}]"#);

	assert!(matches!(hook.mounted(binding(), &element), Err(Error::MissingAttribute { name: TOKEN_ATTRIBUTE })));
	assert!(fake.log.borrow().created.is_empty());

	element.set_attribute(TOKEN_ATTRIBUTE, "pk.test").unwrap();
	hook.mounted(binding(), &element).unwrap();
	{
		let log = fake.log.borrow();
		assert_eq!(log.created[0].1.as_deref(), Some("pk.test"));
		let (_, options) = &log.fitted[0];
		assert_eq!(options.padding, Some((50, 50)));
		assert_eq!(options.animate, Some(false));
	}

	hook.destroyed(binding(), &element);
	element.remove();
}

#[wasm_bindgen_test]
fn unchanged_positions_keep_the_view() {
	web_logging_::init();
	let fake = Fake::default();
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy::default());
	let positions = r#"[{"lat": 10, "lon": 10, "timestamp": "a"}, {"lat": 50, "lon": 50, "timestamp": "b"}]"#;
	let element = map_element(positions);

	hook.mounted(binding(), &element).unwrap();
	element.set_attribute(POSITIONS_ATTRIBUTE, positions).unwrap();
	hook.updated(binding(), &element).unwrap();
	hook.updated(binding(), &element).unwrap();
	{
		let log = fake.log.borrow();
		assert_eq!(log.fitted.len(), 1, "no refit without new data");
		assert_eq!(log.clears, 1, "markers stay in place");
		assert_eq!(log.markers.len(), 2);
	}

	element.set_attribute(POSITIONS_ATTRIBUTE, r#"[{"lat": 1, "lon": 2, "timestamp": "c"}]"#).unwrap();
	hook.updated(binding(), &element).unwrap();
	{
		let log = fake.log.borrow();
		assert_eq!(log.fitted.len(), 2);
		assert_eq!(log.clears, 2);
		assert_eq!(log.markers.len(), 1);
	}

	hook.destroyed(binding(), &element);
	element.remove();
}

#[wasm_bindgen_test]
fn rejected_update_is_retried_with_the_same_data() {
	web_logging_::init();
	let fake = Fake::default();
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy::default());
	let element = map_element(r#"[{"lat": 1, "lon": 2, "timestamp": "t"}]"#);

	hook.mounted(binding(), &element).unwrap();
	element.set_attribute(POSITIONS_ATTRIBUTE, "[{").unwrap();
	assert!(hook.updated(binding(), &element).is_err());
	assert!(hook.updated(binding(), &element).is_err(), "malformed data is not remembered as shown");
	assert_eq!(fake.log.borrow().fitted.len(), 1);

	hook.destroyed(binding(), &element);
	element.remove();
}

#[wasm_bindgen_test]
fn missing_positions_fail_the_mount() {
	web_logging_::init();
	let fake = Fake::default();
	let mut hook = MapHook::new(fake.clone(), InitialView::default(), FitPolicy::default());
	let element = fixture("");

	assert!(matches!(hook.mounted(binding(), &element), Err(Error::MissingAttribute { name: POSITIONS_ATTRIBUTE })));
	assert!(fake.log.borrow().created.is_empty());
	assert_eq!(hook.widget_count(), 0);

	element.remove();
}
