//! Runtime diagnostics under `/debug/pprof/`.
//!
//! Only registered in debug mode.

use std::time::Instant;

use axum::{response::IntoResponse, Json};
use serde_json::json;

use crate::config::RunMode;
use crate::handlers::{handler_fn, BoxedHandler};
use crate::http::response::not_found;

/// Profiles served by the diagnostics handler.
pub const PROFILES: &[&str] = &["runtime", "build"];

/// Diagnostics handler for service `name`.
pub fn diagnostics_handler(name: String, mode: RunMode) -> BoxedHandler {
    let started = Instant::now();

    handler_fn(move |request| {
        let name = name.clone();
        async move {
            let profile = request
                .uri()
                .path()
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();

            match profile.as_str() {
                "pprof" => Json(json!({ "profiles": PROFILES })).into_response(),
                "runtime" => runtime_profile().into_response(),
                "build" => Json(json!({
                    "name": name,
                    "version": env!("CARGO_PKG_VERSION"),
                    "mode": mode,
                    "uptime_secs": started.elapsed().as_secs(),
                }))
                .into_response(),
                _ => not_found().await,
            }
        }
    })
}

fn runtime_profile() -> Json<serde_json::Value> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let metrics = handle.metrics();
            Json(json!({
                "workers": metrics.num_workers(),
                "alive_tasks": metrics.num_alive_tasks(),
            }))
        }
        Err(_) => Json(json!({ "workers": 0, "alive_tasks": 0 })),
    }
}
