// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Method resolution and invocation. Endpoints are scanned in
//! registration order; the first one matching the request's namespace,
//! version-compatible with it, and exposing its method wins.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use herald_transport::{Args, Request, WireContext};

use crate::endpoint::{Endpoint, MethodHandler};
use crate::errors::DispatchError;
use crate::serializer::Serializer;

/// Maps one incoming request to exactly one method invocation, or to a
/// classified dispatch error. The endpoint list and the serializer are
/// immutable after construction, so dispatching is safe to run
/// concurrently for independent requests.
pub struct RpcDispatcher<S: Serializer> {
    endpoints: Vec<Arc<dyn Endpoint<S::Context>>>,
    serializer: S,
}

impl<S> RpcDispatcher<S>
where
    S: Serializer,
    S::Context: Send + Sync + 'static,
{
    /// Build a dispatcher over an ordered endpoint list. Registration
    /// order is the priority order and is never reordered.
    pub fn new(endpoints: Vec<Arc<dyn Endpoint<S::Context>>>, serializer: S) -> Self {
        RpcDispatcher {
            endpoints,
            serializer,
        }
    }

    pub fn endpoints(&self) -> &[Arc<dyn Endpoint<S::Context>>] {
        &self.endpoints
    }

    /// Resolve and invoke the method named by `request`.
    ///
    /// An endpoint is considered only if its target matches the request's
    /// namespace and is version-compatible with the requested version.
    /// The first such endpoint exposing the method is invoked; a
    /// compatible endpoint without the method does not stop the scan. If
    /// the scan saw a compatible endpoint but no method, the failure is
    /// `NoSuchMethod`; if it saw none at all, `UnsupportedVersion`.
    pub async fn dispatch(
        &self,
        ctxt: &WireContext,
        request: &Request,
    ) -> Result<Value, DispatchError> {
        let method = request.method();
        let namespace = request.namespace();
        let version = request.version_or_default();

        let mut found_compatible = false;
        for endpoint in &self.endpoints {
            let target = endpoint.target();
            if !target.matches_namespace(namespace) || !target.is_compatible_with(version) {
                continue;
            }

            match endpoint.methods().get(method) {
                Some(handler) => {
                    debug!(method, ?namespace, version, %target, "method resolved");
                    return self.invoke(handler, ctxt, request.args()).await;
                }
                None => found_compatible = true,
            }
        }

        if found_compatible {
            Err(DispatchError::NoSuchMethod {
                method: method.to_string(),
            })
        } else {
            Err(DispatchError::UnsupportedVersion {
                version: version.to_string(),
                method: Some(method.to_string()),
            })
        }
    }

    /// Deserialize the context and every argument, run the handler, then
    /// serialize the result. That micro-ordering is fixed.
    async fn invoke(
        &self,
        handler: &MethodHandler<S::Context>,
        ctxt: &WireContext,
        args: &Args,
    ) -> Result<Value, DispatchError> {
        let ctxt = Arc::new(self.serializer.deserialize_context(ctxt)?);

        let mut deserialized = Args::new();
        for (name, value) in args {
            let value = self.serializer.deserialize_entity(&ctxt, value.clone())?;
            deserialized.insert(name.clone(), value);
        }

        let result = handler(ctxt.clone(), deserialized).await?;
        Ok(self.serializer.serialize_entity(&ctxt, result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::serializer::NoopSerializer;
    use crate::target::Target;
    use crate::testutils::{
        CountingEndpoint, FailingEndpoint, FailingSerializer, TaggingSerializer,
    };

    fn dispatcher(
        endpoints: Vec<Arc<dyn Endpoint<WireContext>>>,
    ) -> RpcDispatcher<NoopSerializer> {
        RpcDispatcher::new(endpoints, NoopSerializer)
    }

    fn request(method: &str) -> Request {
        Request::new(method)
    }

    #[tokio::test]
    async fn dispatches_to_an_endpoint_without_a_declared_target() {
        let endpoint = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let d = dispatcher(vec![endpoint.clone() as _]);

        let result = d
            .dispatch(&WireContext::new(), &request("foo").with_version("1.0"))
            .await
            .unwrap();

        assert_eq!(result["method"], "foo");
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_method_is_no_such_method() {
        let endpoint = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let d = dispatcher(vec![endpoint.clone() as _]);

        let err = d
            .dispatch(&WireContext::new(), &request("foobar"))
            .await
            .unwrap_err();

        match err {
            DispatchError::NoSuchMethod { method } => assert_eq!(method, "foobar"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(endpoint.calls(), 0);
    }

    #[tokio::test]
    async fn namespace_routes_to_the_declared_endpoint() {
        let plain = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let ns = Arc::new(CountingEndpoint::with_methods(
            Target::new().with_namespace("testns"),
            &["foo"],
        ));
        let d = dispatcher(vec![plain.clone() as _, ns.clone() as _]);

        d.dispatch(&WireContext::new(), &request("foo").with_namespace("testns"))
            .await
            .unwrap();

        assert_eq!(ns.calls(), 1);
        assert_eq!(plain.calls(), 0);
    }

    #[tokio::test]
    async fn namespace_mismatch_is_unsupported_version_never_no_such_method() {
        let plain = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let ns = Arc::new(CountingEndpoint::with_methods(
            Target::new().with_namespace("testns"),
            &["foo"],
        ));
        let d = dispatcher(vec![plain.clone() as _, ns.clone() as _]);

        let err = d
            .dispatch(&WireContext::new(), &request("foo").with_namespace("nstest"))
            .await
            .unwrap_err();

        match err {
            DispatchError::UnsupportedVersion { version, method } => {
                assert_eq!(version, "1.0");
                assert_eq!(method.as_deref(), Some("foo"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(plain.calls(), 0);
        assert_eq!(ns.calls(), 0);
    }

    #[tokio::test]
    async fn empty_namespace_is_the_default_namespace() {
        let endpoint = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let d = dispatcher(vec![endpoint.clone() as _]);

        d.dispatch(&WireContext::new(), &request("foo").with_namespace(""))
            .await
            .unwrap();

        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn version_selects_the_compatible_endpoint() {
        let v15 = Arc::new(CountingEndpoint::with_methods(
            Target::new().with_version("1.5"),
            &["foo"],
        ));
        let v34 = Arc::new(CountingEndpoint::with_methods(
            Target::new().with_version("3.4"),
            &["foo"],
        ));
        let d = dispatcher(vec![v15.clone() as _, v34.clone() as _]);

        d.dispatch(&WireContext::new(), &request("foo").with_version("3.2"))
            .await
            .unwrap();

        assert_eq!(v34.calls(), 1);
        assert_eq!(v15.calls(), 0);
    }

    #[tokio::test]
    async fn no_compatible_version_is_unsupported_version() {
        let v15 = Arc::new(CountingEndpoint::with_methods(
            Target::new().with_version("1.5"),
            &["foo"],
        ));
        let v30 = Arc::new(CountingEndpoint::with_methods(
            Target::new().with_version("3.0"),
            &["foo"],
        ));
        let d = dispatcher(vec![v15.clone() as _, v30.clone() as _]);

        let err = d
            .dispatch(&WireContext::new(), &request("foo").with_version("3.2"))
            .await
            .unwrap_err();

        match err {
            DispatchError::UnsupportedVersion { version, .. } => assert_eq!(version, "3.2"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(v15.calls(), 0);
        assert_eq!(v30.calls(), 0);
    }

    #[tokio::test]
    async fn first_registered_endpoint_wins() {
        let first = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let second = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let d = dispatcher(vec![first.clone() as _, second.clone() as _]);

        d.dispatch(&WireContext::new(), &request("foo")).await.unwrap();

        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn scan_continues_past_a_compatible_endpoint_without_the_method() {
        let lacks = Arc::new(CountingEndpoint::with_methods(Target::default(), &["bar"]));
        let has = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let d = dispatcher(vec![lacks.clone() as _, has.clone() as _]);

        d.dispatch(&WireContext::new(), &request("foo")).await.unwrap();

        assert_eq!(has.calls(), 1);
        assert_eq!(lacks.calls(), 0);
    }

    #[tokio::test]
    async fn dispatch_is_idempotent() {
        let endpoint = Arc::new(CountingEndpoint::with_methods(Target::default(), &["foo"]));
        let d = dispatcher(vec![endpoint.clone() as _]);
        let req = request("foo").with_arg("k", json!(1));

        let first = d.dispatch(&WireContext::new(), &req).await.unwrap();
        let second = d.dispatch(&WireContext::new(), &req).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test]
    async fn serializer_runs_on_context_arguments_and_result() {
        let endpoint = Arc::new(CountingEndpoint::<String>::with_methods(
            Target::default(),
            &["foo"],
        ));
        let d = RpcDispatcher::new(vec![endpoint.clone() as _], TaggingSerializer);

        let mut ctxt = WireContext::new();
        ctxt.insert("user".to_string(), json!("alice"));

        let result = d
            .dispatch(&ctxt, &request("foo").with_arg("k", json!("v")))
            .await
            .unwrap();

        // The result is wrapped by serialize_entity; inside it, each
        // argument was wrapped by deserialize_entity with the
        // deserialized context applied to both.
        assert_eq!(result["user"], "alice");
        assert_eq!(result["out"]["args"]["k"]["in"], "v");
        assert_eq!(result["out"]["args"]["k"]["user"], "alice");
    }

    #[tokio::test]
    async fn endpoint_errors_keep_their_class() {
        let d = dispatcher(vec![Arc::new(FailingEndpoint::new()) as _]);

        let err = d
            .dispatch(&WireContext::new(), &request("fail"))
            .await
            .unwrap_err();
        assert!(!err.is_expected());
        assert_eq!(err.to_failure().error_type(), "Broken");

        let err = d
            .dispatch(&WireContext::new(), &request("fail_expected"))
            .await
            .unwrap_err();
        assert!(err.is_expected());
        assert_eq!(err.to_failure().error_type(), "Invalid");
    }

    #[tokio::test]
    async fn serializer_failure_touches_no_endpoint() {
        let endpoint = Arc::new(CountingEndpoint::<()>::with_methods(
            Target::default(),
            &["foo"],
        ));
        let d = RpcDispatcher::new(vec![endpoint.clone() as _], FailingSerializer);

        let err = d
            .dispatch(&WireContext::new(), &request("foo"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Serializer(_)));
        assert!(!err.is_expected());
        assert_eq!(endpoint.calls(), 0);
    }
}
