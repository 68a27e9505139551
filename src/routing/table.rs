//! The route table.
//!
//! # Responsibilities
//! - Collect route entries (method, pattern, target, guard)
//! - Reject malformed, conflicting and duplicate routes at startup
//! - Resolve (method, path) to an entry for introspection and docs
//!
//! # Design Decisions
//! - Immutable after `build` (thread-safe without locks)
//! - Pattern syntax is shared with axum (`{id}`, `{*rest}`), so anything
//!   accepted here is accepted by the compiled router
//! - Resolution is exact: no method fallback, no trailing-slash redirect

use std::collections::HashMap;

use axum::http::Method;
use serde::Serialize;
use thiserror::Error;

use crate::handlers::Endpoint;

/// Startup routing errors. Any of these prevents the server from starting.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route pattern {pattern:?} rejected: {source}")]
    Conflict {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("duplicate route {method} {pattern}")]
    Duplicate { method: Method, pattern: String },

    #[error("method {method} cannot be routed")]
    UnsupportedMethod { method: Method },

    #[error("static mount {pattern:?} cannot share its pattern with handler routes")]
    SharedStaticMount { pattern: String },
}

/// What a route entry dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A terminal handler.
    Handler(Endpoint),
    /// The static file server.
    StaticFiles,
}

/// Per-route guard, layered after the global chain and before the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// No guard.
    Open,
    /// A verified principal is required.
    Principal,
    /// The named environment variable must open the gate on each request.
    EnvGate { var: String },
}

impl Guard {
    pub fn label(&self) -> &'static str {
        match self {
            Guard::Open => "none",
            Guard::Principal => "required",
            Guard::EnvGate { .. } => "env-gated",
        }
    }
}

/// One registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub method: Method,
    pub pattern: String,
    pub target: Target,
    pub guard: Guard,
    /// Prefix of the group the route was registered through.
    pub group: Option<String>,
}

/// Serializable summary of a route, used by the docs and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDescription {
    pub method: String,
    pub path: String,
    pub auth: &'static str,
    pub endpoint: String,
}

impl From<&RouteEntry> for RouteDescription {
    fn from(entry: &RouteEntry) -> Self {
        Self {
            method: entry.method.to_string(),
            path: entry.pattern.clone(),
            auth: entry.guard.label(),
            endpoint: match entry.target {
                Target::Handler(endpoint) => endpoint.name().to_string(),
                Target::StaticFiles => "static_files".to_string(),
            },
        }
    }
}

/// Result of resolving a request against the table.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    Matched {
        entry: &'a RouteEntry,
        params: Vec<(String, String)>,
    },
    NotFound,
}

/// Accumulates entries; `build` validates them.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    entries: Vec<RouteEntry>,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        &mut self,
        method: Method,
        pattern: impl Into<String>,
        target: Target,
        guard: Guard,
    ) -> &mut Self {
        self.entries.push(RouteEntry {
            method,
            pattern: pattern.into(),
            target,
            guard,
            group: None,
        });
        self
    }

    pub fn get(&mut self, pattern: &str, endpoint: Endpoint) -> &mut Self {
        self.route(Method::GET, pattern, Target::Handler(endpoint), Guard::Open)
    }

    pub fn post(&mut self, pattern: &str, endpoint: Endpoint) -> &mut Self {
        self.route(Method::POST, pattern, Target::Handler(endpoint), Guard::Open)
    }

    /// Mount the static file server under `prefix`.
    pub fn static_files(&mut self, prefix: &str) -> &mut Self {
        let pattern = format!("{}/{{*path}}", prefix.trim_end_matches('/'));
        self.route(Method::GET, pattern, Target::StaticFiles, Guard::Open)
    }

    /// Open a group: every route registered through it gets `prefix`
    /// prepended and `guard` attached.
    pub fn group(&mut self, prefix: &str, guard: Guard) -> RouteGroup<'_> {
        RouteGroup {
            builder: self,
            prefix: prefix.trim_end_matches('/').to_string(),
            guard,
        }
    }

    pub fn build(self) -> Result<RouteTable, RouteError> {
        let mut index = matchit::Router::new();
        let mut paths: Vec<PathRoutes> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();

        for (position, entry) in self.entries.iter().enumerate() {
            check_pattern(&entry.pattern)?;

            let slot = match slots.get(&entry.pattern) {
                Some(&slot) => slot,
                None => {
                    let slot = paths.len();
                    index
                        .insert(entry.pattern.clone(), slot)
                        .map_err(|source| insert_error(&entry.pattern, source))?;
                    slots.insert(entry.pattern.clone(), slot);
                    paths.push(PathRoutes {
                        pattern: entry.pattern.clone(),
                        methods: Vec::new(),
                    });
                    slot
                }
            };

            let path = &mut paths[slot];
            if path.methods.iter().any(|(m, _)| *m == entry.method) {
                return Err(RouteError::Duplicate {
                    method: entry.method.clone(),
                    pattern: entry.pattern.clone(),
                });
            }
            path.methods.push((entry.method.clone(), position));
        }

        // The static file server owns every method under its pattern.
        for path in &paths {
            let static_mount = path
                .methods
                .iter()
                .any(|&(_, position)| self.entries[position].target == Target::StaticFiles);
            if static_mount && path.methods.len() > 1 {
                return Err(RouteError::SharedStaticMount {
                    pattern: path.pattern.clone(),
                });
            }
        }

        Ok(RouteTable {
            entries: self.entries,
            paths,
            index,
        })
    }
}

/// Syntax accepted by both matchit and axum: absolute, with captures
/// written `{name}` or `{*name}`.
fn check_pattern(pattern: &str) -> Result<(), RouteError> {
    let invalid = |reason: &str| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if !pattern.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if pattern
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err(invalid(
            "legacy capture syntax (':name' or '*name'), use '{name}' or '{*name}'",
        ));
    }
    Ok(())
}

/// Overlaps with an existing route are conflicts; everything else matchit
/// rejects is a malformed pattern.
fn insert_error(pattern: &str, source: matchit::InsertError) -> RouteError {
    match source {
        matchit::InsertError::Conflict { .. } => RouteError::Conflict {
            pattern: pattern.to_string(),
            source,
        },
        other => RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Registration scope for a route group.
pub struct RouteGroup<'a> {
    builder: &'a mut RouteTableBuilder,
    prefix: String,
    guard: Guard,
}

impl RouteGroup<'_> {
    pub fn route(&mut self, method: Method, path: &str, endpoint: Endpoint) -> &mut Self {
        self.builder.entries.push(RouteEntry {
            method,
            pattern: format!("{}{}", self.prefix, path),
            target: Target::Handler(endpoint),
            guard: self.guard.clone(),
            group: Some(self.prefix.clone()),
        });
        self
    }

    pub fn get(&mut self, path: &str, endpoint: Endpoint) -> &mut Self {
        self.route(Method::GET, path, endpoint)
    }

    pub fn post(&mut self, path: &str, endpoint: Endpoint) -> &mut Self {
        self.route(Method::POST, path, endpoint)
    }

    pub fn put(&mut self, path: &str, endpoint: Endpoint) -> &mut Self {
        self.route(Method::PUT, path, endpoint)
    }
}

/// All entries sharing one pattern.
#[derive(Debug)]
pub(crate) struct PathRoutes {
    pub(crate) pattern: String,
    /// (method, index into `entries`), in registration order.
    pub(crate) methods: Vec<(Method, usize)>,
}

/// Validated, immutable route table.
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    paths: Vec<PathRoutes>,
    index: matchit::Router<usize>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub(crate) fn paths(&self) -> &[PathRoutes] {
        &self.paths
    }

    pub(crate) fn entry(&self, position: usize) -> &RouteEntry {
        &self.entries[position]
    }

    pub fn describe(&self) -> Vec<RouteDescription> {
        self.entries.iter().map(RouteDescription::from).collect()
    }

    /// Find the entry serving `method` on `path`.
    ///
    /// An unknown path and an unsupported method on a known path both
    /// resolve to [`Resolution::NotFound`].
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        let Ok(matched) = self.index.at(path) else {
            return Resolution::NotFound;
        };

        let routes = &self.paths[*matched.value];
        match routes.methods.iter().find(|(m, _)| m == method) {
            Some(&(_, position)) => Resolution::Matched {
                entry: &self.entries[position],
                params: matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            None => Resolution::NotFound,
        }
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        matches!(self.resolve(method, path), Resolution::Matched { .. })
    }
}
