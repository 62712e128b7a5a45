use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid command arguments: {0}")]
    InvalidArgs(String),
}

/// Failures while turning the stored credential into a session token.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication rejected: {0}")]
    Rejected(String),

    #[error("Authentication request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to read credentials: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Credential store error: {0}")]
    Store(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{operation} failed. Status: {status}, Response: {body}")]
    RequestFailed {
        operation: String,
        status: StatusCode,
        body: String,
    },

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse {operation} response: {reason}")]
    Decode { operation: String, reason: String },

    #[error("Account group lookup failed: {0}")]
    GroupLookup(String),

    #[error("Invalid authorization header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// Whether a status fetch that failed this way may succeed if retried.
    ///
    /// Network errors, server-side errors and throttling are transient; a
    /// missing or forbidden resource will not fix itself.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Decode { .. } => true,
            ApiError::RequestFailed { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::GroupLookup(_) | ApiError::InvalidHeader(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Timed out after {elapsed:?} ({attempts} status checks) waiting for {resource}")]
    Timeout {
        resource: String,
        elapsed: Duration,
        attempts: u32,
    },

    #[error("{resource} disappeared while waiting for status '{expected}'")]
    Vanished { resource: String, expected: String },

    #[error("Status check for {resource} failed: {source}")]
    Fetch {
        resource: String,
        #[source]
        source: ApiError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(status: StatusCode) -> ApiError {
        ApiError::RequestFailed {
            operation: "Get server 1".to_string(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(failed(StatusCode::BAD_GATEWAY).is_transient());
        assert!(failed(StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert!(failed(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(
            ApiError::Decode {
                operation: "Get server 1".to_string(),
                reason: "eof".to_string()
            }
            .is_transient()
        );

        assert!(!failed(StatusCode::NOT_FOUND).is_transient());
        assert!(!failed(StatusCode::UNAUTHORIZED).is_transient());
        assert!(!failed(StatusCode::FORBIDDEN).is_transient());
        assert!(!failed(StatusCode::BAD_REQUEST).is_transient());
        assert!(!ApiError::GroupLookup("no groups".to_string()).is_transient());
    }
}
