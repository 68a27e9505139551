//! Built-in API documentation.
//!
//! Serves a document generated from the assembled route table:
//! `/swagger/doc.json` (machine readable) and `/swagger/index.html`.

use std::sync::Arc;

use axum::{
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;

use crate::config::RunMode;
use crate::handlers::{handler_fn, BoxedHandler};
use crate::http::response::not_found;
use crate::routing::RouteDescription;

/// The generated documentation document.
#[derive(Debug, Clone, Serialize)]
pub struct ApiDocument {
    pub service: String,
    pub version: &'static str,
    pub mode: RunMode,
    pub routes: Vec<RouteDescription>,
}

impl ApiDocument {
    pub fn new(service: impl Into<String>, mode: RunMode, routes: Vec<RouteDescription>) -> Self {
        Self {
            service: service.into(),
            version: env!("CARGO_PKG_VERSION"),
            mode,
            routes,
        }
    }

    fn render_html(&self) -> String {
        let rows: String = self
            .routes
            .iter()
            .map(|r| {
                format!(
                    "<tr><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
                    r.method, r.path, r.auth, r.endpoint
                )
            })
            .collect();

        format!(
            "<!DOCTYPE html>\n<html><head><title>{name} API</title></head><body>\n\
             <h1>{name} {version} ({mode})</h1>\n\
             <p><a href=\"doc.json\">doc.json</a></p>\n\
             <table>\n<tr><th>Method</th><th>Path</th><th>Auth</th><th>Endpoint</th></tr>\n\
             {rows}</table>\n</body></html>\n",
            name = self.service,
            version = self.version,
            mode = self.mode,
        )
    }
}

/// Docs handler serving `document`.
pub fn docs_handler(document: ApiDocument) -> BoxedHandler {
    let document = Arc::new(document);
    let html = Arc::new(document.render_html());

    handler_fn(move |request| {
        let document = document.clone();
        let html = html.clone();
        async move {
            match request.uri().path().rsplit('/').next() {
                Some("doc.json") => Json(document.as_ref().clone()).into_response(),
                Some("index.html") => Html(html.as_ref().clone()).into_response(),
                _ => not_found().await,
            }
        }
    })
}
