//! RPC method handler for the Tabspace JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested. `handle_method`
//! dispatches a method call to the `App` and returns the JSON result.

use std::sync::Mutex;
use std::time::Instant;

use crate::app::App;
use crate::managers::space_manager::SpaceManagerTrait;
use crate::managers::undo_manager::TabUndoManagerTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::space::Space;
use crate::types::tab::Tab;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use uuid::Uuid;

/// Encode bytes to base64 string.
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    BASE64.decode(input).map_err(|e| format!("base64 decode error: {}", e))
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn id_param(params: &Value, key: &str) -> Result<Uuid, String> {
    let raw = str_param(params, key)?;
    Uuid::parse_str(raw).map_err(|e| format!("invalid {}: {}", key, e))
}

fn bool_param(params: &Value, key: &str, default: bool) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn is_web_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

pub fn tab_json(tab: &Tab) -> Value {
    json!({
        "id": tab.id,
        "title": tab.title,
        "display_title": tab.display_title(),
        "custom_title": tab.custom_title,
        "url": tab.url,
        "order": tab.order,
        "pin_state": tab.pin_state,
        "content_type": tab.content_type,
        "favicon": tab.favicon.as_deref().map(base64_encode),
        "space_id": tab.space_id,
    })
}

pub fn space_json(space: &Space) -> Value {
    json!({
        "id": space.id,
        "name": space.name,
        "system_image": space.system_image,
        "order": space.order,
        "colors": space.colors,
        "grain_opacity": space.grain_opacity,
        "color_opacity": space.color_opacity,
        "color_scheme": space.color_scheme,
        "pinned_tabs_visible": space.pinned_tabs_visible,
        "tab_count": space.tab_count(),
        "current_tab": space.current_tab_id(),
        "loaded_tabs": space.loaded_tabs(),
    })
}

fn undo_state(a: &App) -> Value {
    json!({
        "can_undo": a.undo_manager.can_undo(),
        "can_redo": a.undo_manager.can_redo(),
        "undo_description": a.undo_manager.undo_description(),
        "redo_description": a.undo_manager.redo_description(),
    })
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Spaces ───
        "space.create" => {
            let name = str_param(params, "name")?;
            let system_image = params.get("system_image").and_then(|v| v.as_str()).unwrap_or("square.grid.2x2");
            let color_scheme = params.get("color_scheme").and_then(|v| v.as_str()).unwrap_or("light");
            let colors: Vec<String> = match params.get("colors") {
                Some(v) => serde_json::from_value(v.clone()).map_err(|e| format!("invalid colors: {}", e))?,
                None => Vec::new(),
            };
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let id = a.space_manager.create_space(name, system_image, colors, color_scheme);
            Ok(json!({"id": id}))
        }
        "space.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let arr: Vec<Value> = a.space_manager.spaces().iter().map(space_json).collect();
            Ok(json!(arr))
        }
        "space.tabs" => {
            let space_id = id_param(params, "space_id")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let space = a.space_manager.space(space_id).ok_or("space not found")?;
            let arr: Vec<Value> = space.tabs().iter().map(tab_json).collect();
            Ok(json!(arr))
        }
        "space.clear" => {
            let space_id = id_param(params, "space_id")?;
            let delete_current = bool_param(params, "delete_current", false);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let changed = a.clear_space(space_id, delete_current).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "changed": changed}))
        }
        "space.remove" => {
            let space_id = id_param(params, "space_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.remove_space(space_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Tabs ───
        "tab.open" => {
            let url = str_param(params, "url")?;
            if !is_web_url(url) {
                return Err("invalid url: must start with http:// or https://".to_string());
            }
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or(url);
            let select = bool_param(params, "select", true);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let space_id = match params.get("space_id") {
                Some(_) => id_param(params, "space_id")?,
                None => a.default_space_id().ok_or("no space")?,
            };
            let id = a.open_tab(space_id, url, title, select).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "tab.duplicate" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let id = a.duplicate_tab(tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "tab.close" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.close_tab(tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.close_above" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let changed = a.close_tabs_above(tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "changed": changed}))
        }
        "tab.close_below" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let changed = a.close_tabs_below(tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "changed": changed}))
        }
        "tab.select" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.select_tab(tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.pin" | "tab.unpin" | "tab.favorite" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let result = match method {
                "tab.pin" => a.space_manager.pin_tab(tab_id),
                "tab.unpin" => a.space_manager.unpin_tab(tab_id),
                _ => a.space_manager.favorite_tab(tab_id),
            };
            result.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.load" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let loaded = a.space_manager.load_tab(tab_id).map_err(|e| e.to_string())?;
            a.page_suspension.start(tab_id, Instant::now());
            Ok(json!({"ok": true, "changed": loaded}))
        }
        "tab.unload" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let unloaded = a.unload_tab(tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "changed": unloaded}))
        }
        "tab.reload" => {
            let tab_id = id_param(params, "tab_id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.space_manager.reload_tab(tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.move" => {
            let tab_id = id_param(params, "tab_id")?;
            let index = params.get("index").and_then(|v| v.as_u64()).ok_or("missing index")? as usize;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.space_manager.move_tab(tab_id, index).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.rename" => {
            let tab_id = id_param(params, "tab_id")?;
            let title = params.get("title").and_then(|v| v.as_str());
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.space_manager.rename_tab(tab_id, title).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.navigate" => {
            let tab_id = id_param(params, "tab_id")?;
            let url = str_param(params, "url")?;
            if !is_web_url(url) {
                return Err("invalid url: must start with http:// or https://".to_string());
            }
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or(url);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.navigate(tab_id, url, title).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.set_favicon" => {
            let tab_id = id_param(params, "tab_id")?;
            let bytes = base64_decode(str_param(params, "data")?)?;
            crate::services::favicon_service::FaviconService::validate_image(&bytes).map_err(|e| e.to_string())?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            if !a.space_manager.apply_favicon(tab_id, bytes) {
                return Err("tab not found".to_string());
            }
            Ok(json!({"ok": true}))
        }

        // ─── Undo / redo ───
        "undo" | "redo" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let alert = if method == "undo" { a.undo() } else { a.redo() };
            a.drain_alerts();
            Ok(json!({"alert": alert, "state": undo_state(&a)}))
        }
        "undo.state" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(undo_state(&a))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            a.apply_settings();
            Ok(json!({"ok": true}))
        }
        "settings.reset" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine.reset().map_err(|e| e.to_string())?;
            a.apply_settings();
            Ok(json!({"ok": true}))
        }

        // ─── Housekeeping ───
        "tick" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let suspended = a.tick(Instant::now());
            Ok(json!({"suspended": suspended}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
