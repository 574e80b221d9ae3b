// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use herald_transport::Failure;

/// Errors raised by a serializer around method invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializerError {
    #[error("context deserialization failed: {0}")]
    Context(String),
    #[error("entity deserialization failed: {0}")]
    Deserialize(String),
    #[error("entity serialization failed: {0}")]
    Serialize(String),
}

/// Failure returned by a method handler.
///
/// `expected` marks failures that are part of the method's contract: the
/// remote caller is anticipated to handle them, so the serving side relays
/// them without error-level logging.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct EndpointError {
    kind: String,
    message: String,
    detail: Option<String>,
    expected: bool,
}

impl EndpointError {
    /// An unexpected failure: a bug or an operational problem.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        EndpointError {
            kind: kind.into(),
            message: message.into(),
            detail: None,
            expected: false,
        }
    }

    /// An expected failure, part of the method's contract.
    pub fn expected(kind: impl Into<String>, message: impl Into<String>) -> Self {
        EndpointError {
            expected: true,
            ..Self::new(kind, message)
        }
    }

    /// Attach traceback-like detail, relayed to the caller verbatim.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_expected(&self) -> bool {
        self.expected
    }
}

/// Why a dispatch failed, before, during, or after method invocation.
#[derive(Error, Debug)]
pub enum DispatchError {
    // Resolution
    #[error("no such method: {method}")]
    NoSuchMethod { method: String },
    #[error("unsupported version: {version}")]
    UnsupportedVersion {
        version: String,
        method: Option<String>,
    },

    // Invocation
    #[error(transparent)]
    Serializer(#[from] SerializerError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

impl DispatchError {
    /// Only failures the endpoint explicitly marked as expected count.
    /// Resolution misses and serializer failures are the serving side's
    /// problem and are reported as unexpected.
    pub fn is_expected(&self) -> bool {
        match self {
            DispatchError::Endpoint(e) => e.is_expected(),
            _ => false,
        }
    }

    /// Wire form of this failure. `log_failure` is the complement of
    /// [`is_expected`](Self::is_expected).
    pub fn to_failure(&self) -> Failure {
        let failure = match self {
            DispatchError::NoSuchMethod { .. } => Failure::new("NoSuchMethod", self.to_string()),
            DispatchError::UnsupportedVersion { method, .. } => {
                let failure = Failure::new("UnsupportedVersion", self.to_string());
                match method {
                    Some(method) => failure.with_detail(format!("requested method: {method}")),
                    None => failure,
                }
            }
            DispatchError::Serializer(e) => Failure::new("SerializationError", e.to_string()),
            DispatchError::Endpoint(e) => {
                let failure = Failure::new(e.kind(), e.message());
                match e.detail() {
                    Some(detail) => failure.with_detail(detail),
                    None => failure,
                }
            }
        };
        failure.with_log_failure(!self.is_expected())
    }
}
