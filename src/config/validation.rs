//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject options listed twice
//! - Validate the metrics endpoint address and path
//! - Check that the log level parses as a filter
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ObserverConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{ObserverConfig, OptionName};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("service_name must not be empty")]
    EmptyServiceName,
    #[error("option {0:?} is listed more than once")]
    DuplicateOption(OptionName),
    #[error("metrics.address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
    #[error("metrics.path {0:?} must start with '/'")]
    InvalidMetricsPath(String),
    #[error("logging.level {0:?} is not a valid filter")]
    InvalidLogLevel(String),
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &ObserverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    let mut seen = HashSet::new();
    for option in &config.options {
        if !seen.insert(*option) {
            errors.push(ValidationError::DuplicateOption(*option));
        }
    }

    if config.metrics.enabled {
        if config.metrics.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(config.metrics.address.clone()));
        }
        if !config.metrics.path.starts_with('/') {
            errors.push(ValidationError::InvalidMetricsPath(config.metrics.path.clone()));
        }
    }

    if EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
