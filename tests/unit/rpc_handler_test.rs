//! Unit tests for the RPC handler: the JSON-RPC methods dispatched by `handle_method`.
//!
//! These tests go through the same code path as the `tabspace-rpc` binary,
//! using a temporary on-disk SQLite database and settings file. Favicon
//! fetching is switched off so no test touches the network.

use std::io::Cursor;
use std::sync::Mutex;

use serde_json::{json, Value};
use tempfile::TempDir;

use tabspace::app::App;
use tabspace::rpc_handler::{base64_encode, handle_method};
use tabspace::types::settings::BrowserSettings;

fn settings_path(tmp: &TempDir) -> String {
    tmp.path().join("settings.json").to_string_lossy().to_string()
}

fn open_app(tmp: &TempDir) -> Mutex<App> {
    let db_path = tmp.path().join("test.db");
    let mut app = App::with_settings_path(db_path.to_str().unwrap(), Some(settings_path(tmp)))
        .expect("Failed to init App");
    app.startup();
    Mutex::new(app)
}

/// Create a fresh App backed by a temp directory DB.
fn setup() -> (Mutex<App>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let mut settings = BrowserSettings::default();
    settings.favicons.enabled = false;
    std::fs::write(settings_path(&tmp), serde_json::to_string(&settings).unwrap()).unwrap();
    (open_app(&tmp), tmp)
}

fn call(app: &Mutex<App>, method: &str, params: Value) -> Value {
    handle_method(app, method, &params).unwrap_or_else(|e| panic!("{} failed: {}", method, e))
}

fn open(app: &Mutex<App>, url: &str, title: &str) -> String {
    let res = call(app, "tab.open", json!({"url": url, "title": title}));
    res["id"].as_str().unwrap().to_string()
}

fn default_space(app: &Mutex<App>) -> String {
    let spaces = call(app, "space.list", json!({}));
    spaces[0]["id"].as_str().unwrap().to_string()
}

fn titles(app: &Mutex<App>) -> Vec<String> {
    let space_id = default_space(app);
    let tabs = call(app, "space.tabs", json!({"space_id": space_id}));
    tabs.as_array()
        .unwrap()
        .iter()
        .map(|t| t["display_title"].as_str().unwrap().to_string())
        .collect()
}

// ─── Ping ───

#[test]
fn test_ping() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "ping", &json!({})).unwrap();
    assert_eq!(res, json!({"pong": true}));
}

// ─── Unknown method ───

#[test]
fn test_unknown_method_returns_error() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "nonexistent.method", &json!({}));
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Spaces ───

#[test]
fn test_startup_creates_default_space() {
    let (app, _tmp) = setup();
    let spaces = call(&app, "space.list", json!({}));
    let arr = spaces.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["name"], "Personal");
    assert_eq!(arr[0]["tab_count"], 0);
}

#[test]
fn test_space_create_and_remove() {
    let (app, _tmp) = setup();
    let res = call(&app, "space.create", json!({"name": "Work", "colors": ["#112233"], "color_scheme": "dark"}));
    let id = res["id"].as_str().unwrap().to_string();

    let spaces = call(&app, "space.list", json!({}));
    assert_eq!(spaces[1]["name"], "Work");
    assert_eq!(spaces[1]["colors"], json!(["#112233"]));
    assert_eq!(spaces[1]["order"], 1);

    call(&app, "space.remove", json!({"space_id": id}));
    assert_eq!(call(&app, "space.list", json!({})).as_array().unwrap().len(), 1);
    assert!(handle_method(&app, "space.remove", &json!({"space_id": id})).is_err());
}

#[test]
fn test_space_params_are_checked() {
    let (app, _tmp) = setup();
    assert!(handle_method(&app, "space.create", &json!({})).is_err());
    assert!(handle_method(&app, "space.tabs", &json!({"space_id": "not-a-uuid"}))
        .unwrap_err()
        .contains("invalid space_id"));
    assert!(handle_method(&app, "space.create", &json!({"name": "x", "colors": "red"})).is_err());
}

// ─── Tabs ───

#[test]
fn test_tab_open_and_list() {
    let (app, _tmp) = setup();
    let id = open(&app, "https://example.com", "Example");
    open(&app, "https://rust-lang.org", "Rust");

    let space_id = default_space(&app);
    let tabs = call(&app, "space.tabs", json!({"space_id": space_id}));
    assert_eq!(tabs[0]["id"], id);
    assert_eq!(tabs[0]["order"], 0);
    assert_eq!(tabs[1]["order"], 1);
    assert_eq!(tabs[0]["pin_state"], "normal");

    let space = &call(&app, "space.list", json!({}))[0];
    assert_eq!(space["current_tab"], tabs[1]["id"]);
}

#[test]
fn test_tab_open_rejects_non_web_urls() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "tab.open", &json!({"url": "ftp://bad.example"}));
    assert!(res.unwrap_err().contains("invalid url"));
    assert!(handle_method(&app, "tab.open", &json!({})).is_err());
}

#[test]
fn test_close_undo_redo_roundtrip() {
    let (app, _tmp) = setup();
    open(&app, "https://a.example", "A");
    let b = open(&app, "https://b.example", "B");
    open(&app, "https://c.example", "C");

    call(&app, "tab.close", json!({"tab_id": b}));
    assert_eq!(titles(&app), vec!["A", "C"]);

    let res = call(&app, "undo", json!({}));
    assert_eq!(res["alert"]["message"], "Undo Close Tab \"B\"");
    assert_eq!(res["alert"]["system_image"], "arrow.uturn.backward");
    assert_eq!(res["state"]["can_redo"], true);
    assert_eq!(titles(&app), vec!["A", "B", "C"]);

    let res = call(&app, "redo", json!({}));
    assert_eq!(res["alert"]["message"], "Redo Close Tab \"B\"");
    assert_eq!(titles(&app), vec!["A", "C"]);
}

#[test]
fn test_undo_with_empty_history() {
    let (app, _tmp) = setup();
    let res = call(&app, "undo", json!({}));
    assert_eq!(res["alert"], Value::Null);
    assert_eq!(res["state"]["can_undo"], false);

    let state = call(&app, "undo.state", json!({}));
    assert_eq!(state["undo_description"], "Undo Close Tab");
}

#[test]
fn test_close_unknown_tab_is_error() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "tab.close", &json!({"tab_id": uuid::Uuid::new_v4().to_string()}));
    assert!(res.unwrap_err().contains("Tab not found"));
}

#[test]
fn test_space_clear_and_undo() {
    let (app, _tmp) = setup();
    open(&app, "https://a.example", "A");
    open(&app, "https://b.example", "B");
    let c = open(&app, "https://c.example", "C");
    let space_id = default_space(&app);

    let res = call(&app, "space.clear", json!({"space_id": space_id}));
    assert_eq!(res["changed"], true);
    assert_eq!(titles(&app), vec!["C"]);
    assert_eq!(call(&app, "space.list", json!({}))[0]["current_tab"], c);

    let state = call(&app, "undo.state", json!({}));
    assert_eq!(state["undo_description"], "Undo Clear Space With 2 Tabs");
    call(&app, "undo", json!({}));
    assert_eq!(titles(&app), vec!["A", "B", "C"]);
}

#[test]
fn test_close_above_and_below() {
    let (app, _tmp) = setup();
    open(&app, "https://a.example", "A");
    let b = open(&app, "https://b.example", "B");
    open(&app, "https://c.example", "C");

    assert_eq!(call(&app, "tab.close_above", json!({"tab_id": b}))["changed"], true);
    assert_eq!(call(&app, "tab.close_below", json!({"tab_id": b}))["changed"], true);
    assert_eq!(titles(&app), vec!["B"]);
    assert_eq!(call(&app, "tab.close_below", json!({"tab_id": b}))["changed"], false);
}

#[test]
fn test_pin_move_rename() {
    let (app, _tmp) = setup();
    let a = open(&app, "https://a.example", "A");
    open(&app, "https://b.example", "B");

    call(&app, "tab.pin", json!({"tab_id": a}));
    call(&app, "tab.move", json!({"tab_id": a, "index": 1}));
    call(&app, "tab.rename", json!({"tab_id": a, "title": "Mine"}));

    let space_id = default_space(&app);
    let tabs = call(&app, "space.tabs", json!({"space_id": space_id}));
    assert_eq!(tabs[1]["id"], a);
    assert_eq!(tabs[1]["pin_state"], "pinned");
    assert_eq!(tabs[1]["display_title"], "Mine");
    assert_eq!(tabs[1]["title"], "A");

    assert!(handle_method(&app, "tab.move", &json!({"tab_id": a, "index": 9})).is_err());
    assert!(handle_method(&app, "tab.move", &json!({"tab_id": a})).is_err());
}

#[test]
fn test_navigate_updates_location() {
    let (app, _tmp) = setup();
    let a = open(&app, "https://a.example", "A");
    call(&app, "tab.navigate", json!({"tab_id": a, "url": "https://a.example/next", "title": "Next"}));

    let space_id = default_space(&app);
    let tabs = call(&app, "space.tabs", json!({"space_id": space_id}));
    assert_eq!(tabs[0]["url"], "https://a.example/next");
    assert!(handle_method(&app, "tab.navigate", &json!({"tab_id": a, "url": "javascript:1"})).is_err());
}

#[test]
fn test_set_favicon_validates_image() {
    let (app, _tmp) = setup();
    let a = open(&app, "https://a.example", "A");

    let image = image::DynamicImage::ImageRgba8(image::RgbaImage::new(2, 2));
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, image::ImageFormat::Png).unwrap();
    let data = base64_encode(png.get_ref());

    call(&app, "tab.set_favicon", json!({"tab_id": a, "data": data}));
    let space_id = default_space(&app);
    let tabs = call(&app, "space.tabs", json!({"space_id": space_id}));
    assert_eq!(tabs[0]["favicon"], data);

    let bad = base64_encode(b"plain text");
    assert!(handle_method(&app, "tab.set_favicon", &json!({"tab_id": a, "data": bad})).is_err());
    assert!(handle_method(&app, "tab.set_favicon", &json!({"tab_id": a, "data": "%%%"})).is_err());
}

#[test]
fn test_unload_and_load() {
    let (app, _tmp) = setup();
    let a = open(&app, "https://a.example", "A");
    open(&app, "https://b.example", "B");

    assert_eq!(call(&app, "tab.unload", json!({"tab_id": a}))["changed"], true);
    assert_eq!(call(&app, "tab.unload", json!({"tab_id": a}))["changed"], false);
    assert_eq!(call(&app, "tab.load", json!({"tab_id": a}))["changed"], true);
    call(&app, "tab.reload", json!({"tab_id": a}));
}

#[test]
fn test_duplicate_and_select() {
    let (app, _tmp) = setup();
    let a = open(&app, "https://a.example", "A");
    open(&app, "https://b.example", "B");

    let copy = call(&app, "tab.duplicate", json!({"tab_id": a}))["id"].clone();
    assert_eq!(titles(&app), vec!["A", "A", "B"]);
    assert_eq!(call(&app, "space.list", json!({}))[0]["current_tab"], copy);

    call(&app, "tab.select", json!({"tab_id": a}));
    assert_eq!(call(&app, "space.list", json!({}))[0]["current_tab"], a);
}

// ─── Settings ───

#[test]
fn test_settings_get_set_reset() {
    let (app, _tmp) = setup();
    let settings = call(&app, "settings.get", json!({}));
    assert_eq!(settings["tabs"]["undo_stack_size"], 20);

    call(&app, "settings.set", json!({"key": "tabs.undo_stack_size", "value": 1}));
    assert_eq!(call(&app, "settings.get", json!({}))["tabs"]["undo_stack_size"], 1);

    // A depth of one only remembers the last close.
    open(&app, "https://a.example", "A");
    let b = open(&app, "https://b.example", "B");
    let c = open(&app, "https://c.example", "C");
    call(&app, "tab.close", json!({"tab_id": b}));
    call(&app, "tab.close", json!({"tab_id": c}));
    assert!(call(&app, "undo", json!({}))["alert"].is_object());
    assert!(call(&app, "undo", json!({}))["alert"].is_null());

    call(&app, "settings.reset", json!({}));
    assert_eq!(call(&app, "settings.get", json!({}))["tabs"]["undo_stack_size"], 20);
}

#[test]
fn test_settings_set_rejects_bad_input() {
    let (app, _tmp) = setup();
    assert!(handle_method(&app, "settings.set", &json!({"key": "tabs.nope", "value": 1})).is_err());
    assert!(handle_method(&app, "settings.set", &json!({"key": "tabs.undo_stack_size", "value": 0})).is_err());
    assert!(handle_method(&app, "settings.set", &json!({"key": "tabs.undo_stack_size"})).is_err());
}

// ─── Housekeeping ───

#[test]
fn test_tick_suspends_nothing_right_after_open() {
    let (app, _tmp) = setup();
    open(&app, "https://a.example", "A");
    let res = call(&app, "tick", json!({}));
    assert_eq!(res["suspended"], json!([]));
}

#[test]
fn test_state_survives_restart() {
    let (app, tmp) = setup();
    open(&app, "https://a.example", "A");
    let b = open(&app, "https://b.example", "B");
    call(&app, "tab.pin", json!({"tab_id": b}));
    app.lock().unwrap().shutdown();
    drop(app);

    let app = open_app(&tmp);
    assert_eq!(titles(&app), vec!["A", "B"]);
    let space_id = default_space(&app);
    let tabs = call(&app, "space.tabs", json!({"space_id": space_id}));
    assert_eq!(tabs[1]["pin_state"], "pinned");
    assert_eq!(call(&app, "undo.state", json!({}))["can_undo"], false);
}
