// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use herald_transport::DEFAULT_VERSION;

/// Identity of an RPC interface: where it listens (exchange, topic) and
/// what it serves (namespace, version).
///
/// Exchange and topic are consulted only when binding a server listener;
/// namespace and version are the coordinates matched against incoming
/// requests. Targets are built once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exchange: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

impl Target {
    pub fn new() -> Self {
        Target::default()
    }

    pub fn with_exchange(self, exchange: impl Into<String>) -> Self {
        Target {
            exchange: Some(exchange.into()),
            ..self
        }
    }

    pub fn with_topic(self, topic: impl Into<String>) -> Self {
        Target {
            topic: Some(topic.into()),
            ..self
        }
    }

    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        Target {
            namespace: Some(namespace.into()),
            ..self
        }
    }

    pub fn with_version(self, version: impl Into<String>) -> Self {
        Target {
            version: Some(version.into()),
            ..self
        }
    }

    pub fn exchange(&self) -> Option<&str> {
        self.exchange.as_deref()
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Declared version, falling back to [`DEFAULT_VERSION`].
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// Namespace equality after normalization: an absent namespace and an
    /// empty one are the same thing. Exact match otherwise, no hierarchy.
    pub fn matches_namespace(&self, candidate: Option<&str>) -> bool {
        normalize(self.namespace.as_deref()) == normalize(candidate)
    }

    /// Backward-compatibility check against a requested version: majors
    /// must be equal and the requested minor must not exceed the declared
    /// one. Malformed versions on either side never match.
    pub fn is_compatible_with(&self, requested: &str) -> bool {
        match (
            parse_version(self.version_or_default()),
            parse_version(requested),
        ) {
            (Some((major, minor)), Some((req_major, req_minor))) => {
                major == req_major && req_minor <= minor
            }
            _ => false,
        }
    }
}

fn normalize(namespace: Option<&str>) -> Option<&str> {
    namespace.filter(|ns| !ns.is_empty())
}

/// Strict "MAJOR.MINOR" parse with unsigned decimal components.
fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    if !major.bytes().all(|b| b.is_ascii_digit()) || !minor.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((major.parse().ok()?, minor.parse().ok()?))
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(exchange) = &self.exchange {
            parts.push(format!("exchange={exchange}"));
        }
        if let Some(topic) = &self.topic {
            parts.push(format!("topic={topic}"));
        }
        if let Some(namespace) = &self.namespace {
            parts.push(format!("namespace={namespace}"));
        }
        if let Some(version) = &self.version {
            parts.push(format!("version={version}"));
        }
        if parts.is_empty() {
            return write!(f, "default");
        }
        write!(f, "{}", parts.join(", "))
    }
}
