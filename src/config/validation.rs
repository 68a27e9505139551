//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and header values before the server binds
//! - Refuse placeholder secrets in release mode
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::{AppConfig, RunMode, PLACEHOLDER_JWT_SECRET};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("security.cors_allow_origins: invalid origin {0:?}")]
    InvalidOrigin(String),

    #[error("docs.release_gate_var must not be empty")]
    EmptyGateVar,

    #[error("auth.jwt_secret must be set in release mode")]
    PlaceholderSecret,

    #[error("auth.jwt_secret must not be empty")]
    EmptySecret,

    #[error("auth.token_ttl_secs must be greater than zero")]
    ZeroTokenTtl,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    for origin in &config.security.cors_allow_origins {
        if origin.trim() != "*" && HeaderValue::from_str(origin.trim()).is_err() {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if config.docs.release_gate_var.trim().is_empty() {
        errors.push(ValidationError::EmptyGateVar);
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    } else if config.app.mode == RunMode::Release
        && config.auth.jwt_secret == PLACEHOLDER_JWT_SECRET
    {
        errors.push(ValidationError::PlaceholderSecret);
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::ZeroTokenTtl);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
