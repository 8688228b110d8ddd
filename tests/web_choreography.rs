use js_sys::Promise;
use live_hooks_dom::{
	choreography::{FadeIn, InitialPaintFlag, ParentMount, FADE_IN_CLASS, INITIAL_MOUNT_COMPLETE_CLASS, SETTLE_DELAY_MS},
	registry::{BindingId, Hook},
};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;

wasm_bindgen_test_configure!(run_in_browser);

mod web_logging_;
use web_logging_::{document, fixture};

async fn sleep(ms: i32) {
	let promise = Promise::new(&mut |resolve, _| {
		window().unwrap().set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms).unwrap();
	});
	JsFuture::from(promise).await.unwrap();
}

fn binding(raw: u32) -> BindingId {
	BindingId::from_raw(raw).unwrap()
}

#[wasm_bindgen_test]
fn fade_in_is_suppressed_during_initial_paint() {
	web_logging_::init();
	let flag = InitialPaintFlag::new();
	let mut fade_in = FadeIn::new(flag.reader());
	let element = fixture("first paint");

	fade_in.mounted(binding(1), &element).unwrap();
	assert!(!element.class_list().contains(FADE_IN_CLASS));

	fade_in.updated(binding(1), &element).unwrap();
	assert!(element.class_list().contains(FADE_IN_CLASS));

	fade_in.updated(binding(1), &element).unwrap();
	assert!(element.class_list().contains(FADE_IN_CLASS));

	fade_in.destroyed(binding(1), &element);
	element.remove();
}

#[wasm_bindgen_test]
fn fade_in_animates_after_initial_paint() {
	web_logging_::init();
	let flag = InitialPaintFlag::new();
	flag.complete();
	let mut fade_in = FadeIn::new(flag.reader());
	let element = fixture("late content");

	fade_in.mounted(binding(2), &element).unwrap();
	assert!(element.class_list().contains(FADE_IN_CLASS));

	element.remove();
}

#[wasm_bindgen_test]
async fn parent_mount_completes_the_initial_paint() {
	web_logging_::init();
	let flag = InitialPaintFlag::new();
	let mut parent_mount = ParentMount::new(flag.clone());
	let mut fade_in = FadeIn::new(flag.reader());
	let root = fixture("");

	parent_mount.mounted(binding(3), &root).unwrap();
	assert!(!flag.is_complete());

	sleep(SETTLE_DELAY_MS + 50).await;
	assert!(flag.is_complete());
	assert!(document().body().unwrap().class_list().contains(INITIAL_MOUNT_COMPLETE_CLASS));

	let element = fixture("after settle");
	fade_in.mounted(binding(4), &element).unwrap();
	assert!(element.class_list().contains(FADE_IN_CLASS));

	parent_mount.destroyed(binding(3), &root);
	element.remove();
	root.remove();
}

#[wasm_bindgen_test]
async fn destroying_parent_mount_cancels_the_timer() {
	web_logging_::init();
	let flag = InitialPaintFlag::new();
	let mut parent_mount = ParentMount::new(flag.clone());
	let root = fixture("");

	parent_mount.mounted(binding(5), &root).unwrap();
	parent_mount.destroyed(binding(5), &root);

	sleep(SETTLE_DELAY_MS + 50).await;
	assert!(!flag.is_complete());

	root.remove();
}
