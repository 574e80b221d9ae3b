// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version assumed for requests and endpoints that do not declare one.
pub const DEFAULT_VERSION: &str = "1.0";

/// Request context as delivered by the transport. Opaque at this layer;
/// the serializer turns it into something the application understands.
pub type WireContext = Map<String, Value>;

/// Named arguments of a request.
pub type Args = Map<String, Value>;

/// A single RPC request as carried on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Method to invoke. Matched exactly, case sensitive.
    method: String,

    /// Named arguments. Absent on the wire means empty.
    #[serde(default)]
    args: Args,

    /// Namespace coordinate. Absent or empty means the default namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,

    /// Requested interface version, "MAJOR.MINOR". Absent means "1.0".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

impl Request {
    pub fn new(method: impl Into<String>) -> Self {
        Request {
            method: method.into(),
            args: Args::new(),
            namespace: None,
            version: None,
        }
    }

    pub fn with_args(self, args: Args) -> Self {
        Request { args, ..self }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        Request {
            namespace: Some(namespace.into()),
            ..self
        }
    }

    pub fn with_version(self, version: impl Into<String>) -> Self {
        Request {
            version: Some(version.into()),
            ..self
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Requested version, falling back to [`DEFAULT_VERSION`].
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }
}

/// What the serving side sends back for a call: exactly one of a result
/// or a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    Result(Value),
    Failure(Failure),
}

/// Serialized form of a dispatch failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    error_type: String,
    error_message: String,

    /// Traceback-like detail, empty when none was attached.
    #[serde(default)]
    detail: String,

    /// False when the serving side classified the failure as expected,
    /// true otherwise.
    log_failure: bool,
}

impl Failure {
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Failure {
            error_type: error_type.into(),
            error_message: error_message.into(),
            detail: String::new(),
            log_failure: true,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_log_failure(mut self, log_failure: bool) -> Self {
        self.log_failure = log_failure;
        self
    }

    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn log_failure(&self) -> bool {
        self.log_failure
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type, self.error_message)
    }
}
