//! Tabspace RPC server: JSON-RPC over stdin/stdout for an external UI process.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.close", "params":{"tab_id":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! `undo` and `redo` results carry the alert the UI should show.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use tabspace::app::App;
use tabspace::platform;
use tabspace::rpc_handler::handle_method;

use serde_json::{json, Value};

/// Fixed-window rate limiter over all requests.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn emit(out: &mut impl Write, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}

fn database_path() -> PathBuf {
    match std::env::var("TABSPACE_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir).join("tabspace.db"),
        Err(_) => platform::default_database_path(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let db_path = database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut app = App::new(&db_path.to_string_lossy())?;
    app.startup();
    let app = Mutex::new(app);
    log::info!("Serving RPC with database {}", db_path.display());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    emit(&mut out, &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}))?;

    let mut rate_limiter = RateLimiter::new(200);

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("stdin closed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&mut out, &json!({"id": null, "error": format!("parse error: {}", e)}))?;
                continue;
            }
        };
        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            log::warn!("Rate limit exceeded");
            emit(&mut out, &json!({"id": id, "error": "rate limit exceeded"}))?;
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));
        log::debug!("-> {}", method);

        let response = match handle_method(&app, method, &params) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&mut out, &response)?;
    }

    if let Ok(mut a) = app.lock() {
        a.shutdown();
    }
    Ok(())
}
