use std::path::PathBuf;

use thiserror::Error;

use crate::transport::Method;

/// The top-level error type returned by checks.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Verification(#[from] VerificationFailure),
}

impl HarnessError {
    /// Short label used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::Configuration(_) => "configuration",
            HarnessError::Fixture(_) => "fixture",
            HarnessError::Transport(_) => "transport",
            HarnessError::Verification(failure) => failure.kind(),
        }
    }
}

/// Missing or unusable configuration.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing configuration key '{key}'")]
    MissingKey { key: String },

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("no base url configured for environment '{environment}' (base.url.{environment})")]
    UnknownEnvironment { environment: String },

    #[error("no path configured for api version '{version}' (api.{version})")]
    UnknownVersion { version: String },

    #[error("no path configured for endpoint '{endpoint}' (api.endpoint.{endpoint})")]
    UnknownEndpoint { endpoint: String },
}

/// A fixture file that could not be read or parsed.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("fixture not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read fixture {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed fixture {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The HTTP exchange itself failed; no response was received.
#[derive(Error, Debug, Clone)]
#[error("{method} {url} failed: {message}")]
pub struct TransportError {
    pub method: Method,
    pub url: String,
    pub message: String,
}

/// An assertion about a response did not hold.
///
/// Each variant carries the expected and the actual side so a report can be
/// read without re-running the check.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationFailure {
    #[error("expected HTTP status code {expected} but got {actual}")]
    Status { expected: u16, actual: u16 },

    #[error("response time exceeded the maximum allowed time: expected <= {max_millis}ms but got {observed_millis}ms")]
    Latency { max_millis: u64, observed_millis: u64 },

    #[error("expected object:\n{expected}\nbut got:\n{actual}")]
    BodyMismatch { expected: String, actual: String },

    #[error("response body is not a valid {target}: {message}\nbody:\n{body}")]
    Decode {
        target: &'static str,
        message: String,
        body: String,
    },

    #[error("error envelope field '{field}' is invalid: expected {expected}, got {actual}")]
    Envelope {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("the 'errors' field should contain '{field_path}' as a key, found keys {present:?}")]
    FieldErrorAbsent {
        field_path: String,
        present: Vec<String>,
    },

    #[error("the 'errors' field '{field_path}' should not be null")]
    FieldErrorNull { field_path: String },

    #[error("the error message for '{field_path}' is incorrect: expected one of {actual:?} to be '{expected}'")]
    FieldErrorMessage {
        field_path: String,
        expected: String,
        actual: Vec<String>,
    },

    #[error("the response does not contain the following expected items:\n{missing}\nresponse:\n{response}")]
    MissingItems { missing: String, response: String },

    #[error("the response contains the following duplicate items:\n{duplicates}\nresponse:\n{response}")]
    DuplicateItems { duplicates: String, response: String },

    #[error("precondition not met: {0}")]
    Precondition(String),
}

impl VerificationFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationFailure::Status { .. } => "status",
            VerificationFailure::Latency { .. } => "latency",
            VerificationFailure::BodyMismatch { .. } => "body",
            VerificationFailure::Decode { .. } => "decode",
            VerificationFailure::Envelope { .. } => "envelope",
            VerificationFailure::FieldErrorAbsent { .. }
            | VerificationFailure::FieldErrorNull { .. }
            | VerificationFailure::FieldErrorMessage { .. } => "field-error",
            VerificationFailure::MissingItems { .. } => "missing-items",
            VerificationFailure::DuplicateItems { .. } => "duplicate-items",
            VerificationFailure::Precondition(_) => "precondition",
        }
    }
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
