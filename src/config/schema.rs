//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Placeholder secret shipped in defaults. Rejected in release mode.
pub const PLACEHOLDER_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Application identity and runtime mode.
    pub app: AppSection,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Response security policy (CORS, HSTS).
    pub security: SecurityConfig,

    /// API documentation exposure.
    pub docs: DocsConfig,

    /// Static asset serving.
    pub static_files: StaticFilesConfig,

    /// Token verification settings.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Runtime mode, read once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Developer tooling is exposed without restriction.
    #[default]
    Debug,
    /// Profiling is absent and docs sit behind an environment gate.
    Release,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Debug => "debug",
            RunMode::Release => "release",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(RunMode::Debug),
            "release" => Ok(RunMode::Release),
            other => Err(format!("unknown run mode: {other}")),
        }
    }
}

/// Application section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSection {
    /// Service name, reported by the docs and diagnostics endpoints.
    pub name: String,

    /// Runtime mode (debug | release).
    pub mode: RunMode,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "user-gateway".to_string(),
            mode: RunMode::Debug,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Security headers and CORS policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty or `["*"]` allows any origin.
    pub cors_allow_origins: Vec<String>,

    /// Emit `Strict-Transport-Security` (set when fronted by TLS).
    pub hsts: bool,
}

/// API documentation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Environment variable that opens the docs in release mode.
    pub release_gate_var: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            release_gate_var: "ENABLE_API_DOCS".to_string(),
        }
    }
}

/// Static asset settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory served under `/static`.
    pub dir: PathBuf,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./static"),
        }
    }
}

/// Token verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,

    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            token_ttl_secs: 86_400,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
