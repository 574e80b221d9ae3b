// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Endpoints and their method tables. An endpoint is a set of methods
//! served at a declared target. Handlers are stored as uniform boxed
//! async closures over JSON values, with typed registration on top, so
//! method lookup at dispatch time is a plain map access.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use herald_transport::Args;

use crate::errors::EndpointError;
use crate::target::Target;

/// Uniform handler shape stored in a method table: shared request context
/// plus named arguments in, a JSON value or an endpoint error out.
pub type MethodHandler<C> =
    Arc<dyn Fn(Arc<C>, Args) -> BoxFuture<'static, Result<Value, EndpointError>> + Send + Sync>;

/// Methods exposed by one endpoint, keyed by exact method name.
pub struct MethodTable<C> {
    handlers: HashMap<String, MethodHandler<C>>,
}

impl<C> MethodTable<C>
where
    C: Send + Sync + 'static,
{
    pub fn new() -> Self {
        MethodTable {
            handlers: HashMap::new(),
        }
    }

    /// Register a typed method under `name`, replacing any previous
    /// registration. The argument map is decoded into `Req` and the
    /// result encoded back into a JSON value; arguments that do not
    /// decode fail the call with an `InvalidArgument` endpoint error.
    pub fn register<F, Req, Res, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Arc<C>, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, EndpointError>> + Send + 'static,
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + 'static,
    {
        let handler = Arc::new(handler);
        let wrapped: MethodHandler<C> = Arc::new(move |ctxt, args| {
            let handler = handler.clone();
            Box::pin(async move {
                let request: Req = serde_json::from_value(Value::Object(args)).map_err(|e| {
                    EndpointError::new("InvalidArgument", format!("cannot decode arguments: {e}"))
                })?;
                let result = handler(ctxt, request).await?;
                serde_json::to_value(result).map_err(|e| {
                    EndpointError::new("InvalidResult", format!("cannot encode result: {e}"))
                })
            })
        });
        self.handlers.insert(name.into(), wrapped);
    }

    pub fn get(&self, name: &str) -> Option<&MethodHandler<C>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered method names, unordered.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<C> Default for MethodTable<C>
where
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// One RPC endpoint: a target declaring where and what it serves, plus
/// the methods it exposes.
pub trait Endpoint<C>: Send + Sync {
    /// Declared target. The default target serves the default namespace
    /// at version 1.0.
    fn target(&self) -> Target {
        Target::default()
    }

    /// Methods exposed by this endpoint.
    fn methods(&self) -> &MethodTable<C>;
}
