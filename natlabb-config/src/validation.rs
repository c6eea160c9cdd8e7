//! Custom validation functions for configuration.
//!
//! Shared validation logic used by the broker and worker configuration
//! modules.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref NAME_RE: Regex = Regex::new("^[a-zA-Z0-9_.-]{1,128}$").unwrap();
    static ref ENDPOINT_RE: Regex =
        Regex::new("^[a-zA-Z0-9_.-]+(:[0-9]{1,5})?$").unwrap();
}

/// Validate a broker identifier (exchange or queue name).
pub fn validate_broker_name(name: &str) -> Result<(), ValidationError> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_broker_name"))
    }
}

/// Validate that every queue name in the list is a well-formed identifier.
pub fn validate_queue_list(queues: &[String]) -> Result<(), ValidationError> {
    if queues.is_empty() {
        return Err(ValidationError::new("empty_queue_list"));
    }
    if queues.iter().any(|q| !NAME_RE.is_match(q)) {
        return Err(ValidationError::new("invalid_queue_name"));
    }
    Ok(())
}

/// Validate a `host` or `host:port` broker endpoint list.
pub fn validate_endpoint_list(endpoints: &[String]) -> Result<(), ValidationError> {
    if endpoints.is_empty() {
        return Err(ValidationError::new("empty_endpoint_list"));
    }
    if endpoints.iter().any(|e| !ENDPOINT_RE.is_match(e)) {
        return Err(ValidationError::new("invalid_endpoint"));
    }
    Ok(())
}
