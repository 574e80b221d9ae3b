// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Shared test fixtures: endpoints that count their invocations, one that
//! always fails, and serializers that tag or reject what they touch.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use herald_transport::{Args, WireContext};

use crate::endpoint::{Endpoint, MethodTable};
use crate::errors::{EndpointError, SerializerError};
use crate::serializer::Serializer;
use crate::target::Target;

/// Endpoint whose methods count their invocations and report which
/// method ran along with the arguments it saw.
pub(crate) struct CountingEndpoint<C> {
    target: Target,
    methods: MethodTable<C>,
    calls: Arc<AtomicUsize>,
}

impl<C> CountingEndpoint<C>
where
    C: Send + Sync + 'static,
{
    pub(crate) fn with_methods(target: Target, names: &[&str]) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut methods = MethodTable::new();

        for name in names {
            let counter = calls.clone();
            let method = name.to_string();
            methods.register(method.clone(), move |_ctxt: Arc<C>, args: Args| {
                let counter = counter.clone();
                let method = method.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({ "method": method, "args": Value::Object(args) }))
                }
            });
        }

        CountingEndpoint {
            target,
            methods,
            calls,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<C> Endpoint<C> for CountingEndpoint<C>
where
    C: Send + Sync + 'static,
{
    fn target(&self) -> Target {
        self.target.clone()
    }

    fn methods(&self) -> &MethodTable<C> {
        &self.methods
    }
}

/// Endpoint in the default namespace whose methods only fail: `fail`
/// returns an unexpected error, `fail_expected` an expected one.
pub(crate) struct FailingEndpoint {
    methods: MethodTable<WireContext>,
}

impl FailingEndpoint {
    pub(crate) fn new() -> Self {
        let mut methods = MethodTable::new();
        methods.register("fail", |_ctxt: Arc<WireContext>, _args: Args| async move {
            Err::<Value, _>(
                EndpointError::new("Broken", "endpoint exploded").with_detail("in fail()"),
            )
        });
        methods.register(
            "fail_expected",
            |_ctxt: Arc<WireContext>, _args: Args| async move {
                Err::<Value, _>(EndpointError::expected("Invalid", "bad input"))
            },
        );

        FailingEndpoint { methods }
    }
}

impl Endpoint<WireContext> for FailingEndpoint {
    fn methods(&self) -> &MethodTable<WireContext> {
        &self.methods
    }
}

/// Endpoint whose single `slow` method sleeps before answering, for
/// shutdown and draining tests.
pub(crate) struct SlowEndpoint {
    methods: MethodTable<WireContext>,
    completions: Arc<AtomicUsize>,
}

impl SlowEndpoint {
    pub(crate) fn new(delay: Duration) -> Self {
        let completions = Arc::new(AtomicUsize::new(0));
        let mut methods = MethodTable::new();

        let done = completions.clone();
        methods.register("slow", move |_ctxt: Arc<WireContext>, _args: Args| {
            let done = done.clone();
            async move {
                tokio::time::sleep(delay).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(json!("done"))
            }
        });

        SlowEndpoint {
            methods,
            completions,
        }
    }

    /// Calls that ran to completion, sleep included.
    pub(crate) fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

impl Endpoint<WireContext> for SlowEndpoint {
    fn methods(&self) -> &MethodTable<WireContext> {
        &self.methods
    }
}

/// Endpoint whose single `work` method reports how many calls were inside
/// it at the same time, for concurrency-limit tests.
pub(crate) struct GaugeEndpoint {
    methods: MethodTable<WireContext>,
    peak: Arc<AtomicUsize>,
}

impl GaugeEndpoint {
    pub(crate) fn new(hold: Duration) -> Self {
        let peak = Arc::new(AtomicUsize::new(0));
        let inside = Arc::new(AtomicUsize::new(0));
        let mut methods = MethodTable::new();

        let high = peak.clone();
        methods.register("work", move |_ctxt: Arc<WireContext>, _args: Args| {
            let inside = inside.clone();
            let high = high.clone();
            async move {
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                high.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(hold).await;
                inside.fetch_sub(1, Ordering::SeqCst);
                Ok(json!(now))
            }
        });

        GaugeEndpoint { methods, peak }
    }

    /// Most calls ever observed inside `work` at once.
    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Endpoint<WireContext> for GaugeEndpoint {
    fn methods(&self) -> &MethodTable<WireContext> {
        &self.methods
    }
}

/// Serializer that wraps everything it touches, so tests can tell whether
/// and with which context each translation ran. The request context is
/// the `user` entry of the wire context.
pub(crate) struct TaggingSerializer;

impl Serializer for TaggingSerializer {
    type Context = String;

    fn deserialize_context(&self, ctxt: &WireContext) -> Result<String, SerializerError> {
        Ok(ctxt
            .get("user")
            .and_then(Value::as_str)
            .unwrap_or("anonymous")
            .to_string())
    }

    fn deserialize_entity(&self, ctxt: &String, entity: Value) -> Result<Value, SerializerError> {
        Ok(json!({ "in": entity, "user": ctxt }))
    }

    fn serialize_entity(&self, ctxt: &String, entity: Value) -> Result<Value, SerializerError> {
        Ok(json!({ "out": entity, "user": ctxt }))
    }
}

/// Serializer that rejects every context.
pub(crate) struct FailingSerializer;

impl Serializer for FailingSerializer {
    type Context = ();

    fn deserialize_context(&self, _ctxt: &WireContext) -> Result<(), SerializerError> {
        Err(SerializerError::Context("no context today".to_string()))
    }

    fn deserialize_entity(&self, _ctxt: &(), entity: Value) -> Result<Value, SerializerError> {
        Ok(entity)
    }

    fn serialize_entity(&self, _ctxt: &(), entity: Value) -> Result<Value, SerializerError> {
        Ok(entity)
    }
}
