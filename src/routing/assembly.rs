//! Route table assembly.
//!
//! Builds the one table the server runs with. The runtime mode is consulted
//! exactly once, here, through [`ConditionalRoutes`].

use axum::http::Method;

use crate::config::{AppConfig, DocsConfig, RunMode};
use crate::handlers::Endpoint;
use crate::routing::table::{Guard, RouteError, RouteTable, RouteTableBuilder, Target};

pub const DOCS_PATTERN: &str = "/swagger/{*any}";
pub const PROFILING_INDEX: &str = "/debug/pprof/";
pub const PROFILING_PATTERN: &str = "/debug/pprof/{*profile}";
pub const STATIC_PREFIX: &str = "/static";
pub const USERS_PREFIX: &str = "/v1/users";

/// Developer tooling routes, selected once from the runtime mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalRoutes {
    /// Docs and profiling, both unrestricted.
    Debug,
    /// Docs behind an environment gate; no profiling.
    Release { gate_var: String },
}

impl ConditionalRoutes {
    pub fn for_mode(mode: RunMode, docs: &DocsConfig) -> Self {
        match mode {
            RunMode::Debug => ConditionalRoutes::Debug,
            RunMode::Release => ConditionalRoutes::Release {
                gate_var: docs.release_gate_var.clone(),
            },
        }
    }

    pub fn register(&self, builder: &mut RouteTableBuilder) {
        match self {
            ConditionalRoutes::Debug => {
                builder
                    .get(DOCS_PATTERN, Endpoint::ApiDocs)
                    .get(PROFILING_INDEX, Endpoint::Profiling)
                    .get(PROFILING_PATTERN, Endpoint::Profiling);
            }
            ConditionalRoutes::Release { gate_var } => {
                builder.route(
                    Method::GET,
                    DOCS_PATTERN,
                    Target::Handler(Endpoint::ApiDocs),
                    Guard::EnvGate {
                        var: gate_var.clone(),
                    },
                );
            }
        }
    }
}

/// Assemble the full route table for `config`.
pub fn assemble(config: &AppConfig) -> Result<RouteTable, RouteError> {
    let mut builder = RouteTable::builder();

    builder.static_files(STATIC_PREFIX);

    ConditionalRoutes::for_mode(config.app.mode, &config.docs).register(&mut builder);

    builder
        .post("/v1/register", Endpoint::Register)
        .post("/v1/login", Endpoint::Login)
        .post("/v1/login/phone", Endpoint::PhoneLogin)
        .get("/v1/vcode", Endpoint::VerificationCode);

    // Public profile read stays outside the authenticated group.
    builder.get("/v1/users/{id}", Endpoint::GetUser);

    builder
        .group(USERS_PREFIX, Guard::Principal)
        .put("/{id}", Endpoint::UpdateUser)
        .post("/follow", Endpoint::Follow)
        .get("/{id}/following", Endpoint::FollowingList)
        .get("/{id}/followers", Endpoint::FollowerList);

    builder.build()
}
