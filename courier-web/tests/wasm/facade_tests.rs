#![cfg(target_arch = "wasm32")]

use courier_engine::{ProgressStorage, ProtocolConfig};
use courier_web::{CourierApp, LocalStorageProgress, dom};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

const KEY: &str = "rcp_state";

fn fresh_app() -> CourierApp {
    dom::local_storage()
        .expect("localStorage")
        .remove_item(KEY)
        .expect("clear progress");
    // Browser time is real, so keep the deadline out of reach.
    let config = ProtocolConfig {
        deadline: chrono::DateTime::parse_from_rfc3339("2099-12-31T23:59:00-07:00")
            .expect("valid deadline"),
        ..ProtocolConfig::default()
    };
    let json = serde_json::to_string(&config).expect("config serializes");
    CourierApp::new(Some(json)).expect("config opens")
}

fn field(value: &JsValue, name: &str) -> JsValue {
    js_sys::Reflect::get(value, &JsValue::from_str(name)).expect("field present")
}

#[wasm_bindgen_test]
fn login_and_first_phase_persist_to_local_storage() {
    let mut app = fresh_app();
    let outcome = app
        .authenticate("Ezra", "RCP-2025-XMAS-COURIER")
        .expect("login judged");
    assert_eq!(field(&outcome, "accepted").as_bool(), Some(true));

    let outcome = app.submit_answer("phase1", "\"b\"").expect("phase 1 judged");
    assert_eq!(field(&outcome, "accepted").as_bool(), Some(true));
    assert_eq!(app.get_phase_state(1).unwrap(), "completed");
    assert_eq!(app.get_phase_state(2).unwrap(), "active");

    let blob = LocalStorageProgress
        .load_blob(KEY)
        .expect("readable")
        .expect("written");
    assert!(blob.contains("\"currentPhase\":2"));
}

#[wasm_bindgen_test]
fn unknown_keys_and_locked_phases_surface_as_errors() {
    let mut app = fresh_app();
    assert!(app.submit_answer("phase8", "\"C\"").is_err());
    assert!(app.submit_answer("phase1", "\"B\"").is_err());
    assert!(app.get_phase_state(9).is_err());
}

#[wasm_bindgen_test]
fn shipped_deadline_has_passed_and_blocks_submissions() {
    dom::local_storage()
        .expect("localStorage")
        .remove_item(KEY)
        .expect("clear progress");
    let mut app = CourierApp::new(None).expect("default config opens");
    assert!(app.is_frozen());
    let outcome = app
        .authenticate("Ezra", "RCP-2025-XMAS-COURIER")
        .expect("login judged");
    assert_eq!(field(&outcome, "accepted").as_bool(), Some(true));
    assert!(app.submit_answer("phase1", "\"B\"").is_err());
}

#[wasm_bindgen_test]
fn hints_and_reset_round_trip() {
    let mut app = fresh_app();
    let hint = app.request_hint("login").expect("hint call");
    assert_eq!(field(&hint, "tier").as_f64(), Some(1.0));
    assert!(!app.reset_progress("wrong"));
    assert!(app.reset_progress(&ProtocolConfig::default().session_key));
    let snapshot = app.get_progress_snapshot().expect("snapshot");
    assert_eq!(field(&snapshot, "authenticated").as_bool(), Some(false));
}
