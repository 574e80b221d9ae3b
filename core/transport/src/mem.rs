// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! In-process reference transport. Routes are bounded tokio channels keyed
//! by exchange and topic; each call carries a oneshot reply channel back to
//! the caller. There is no redelivery, so acknowledgement is a bookkeeping
//! step here and cannot fail.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::errors::{CallError, TransportError};
use crate::message::{Reply, Request, WireContext};
use crate::traits::{Incoming, Listener, Transport};

/// Exchange used when a route does not name one.
pub const DEFAULT_EXCHANGE: &str = "herald";

/// Queue capacity of each bound route.
const ROUTE_CAPACITY: usize = 128;

/// Route a listener binds: the exchange and topic pair. Routes are keyed
/// by the pair itself, so a separator inside either name cannot alias two
/// routes; the joined `exchange/topic` form is only for log fields and
/// error text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Route {
    exchange: String,
    topic: String,
}

impl Route {
    fn new(exchange: Option<&str>, topic: &str) -> Self {
        Route {
            exchange: exchange.unwrap_or(DEFAULT_EXCHANGE).to_string(),
            topic: topic.to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exchange, self.topic)
    }
}

struct MemTransportInner {
    routes: RwLock<HashMap<Route, mpsc::Sender<MemCall>>>,
}

/// In-memory transport handle. Cheap to clone; all clones share the same
/// route table.
#[derive(Clone)]
pub struct MemTransport {
    inner: Arc<MemTransportInner>,
}

impl MemTransport {
    pub fn new() -> Self {
        MemTransport {
            inner: Arc::new(MemTransportInner {
                routes: RwLock::new(HashMap::new()),
            }),
        }
    }

    fn sender(&self, route: &Route) -> Result<mpsc::Sender<MemCall>, TransportError> {
        self.inner
            .routes
            .read()
            .get(route)
            .cloned()
            .ok_or_else(|| TransportError::NoRoute(route.to_string()))
    }

    async fn deliver(&self, route: &Route, call: MemCall) -> Result<(), TransportError> {
        let sender = self.sender(route)?;
        sender
            .send(call)
            .await
            .map_err(|_| TransportError::QueueClosed(route.to_string()))
    }

    /// Send a request and wait for the reply. A failure reply surfaces as
    /// [`CallError::Remote`].
    pub async fn call(
        &self,
        exchange: Option<&str>,
        topic: &str,
        ctxt: WireContext,
        request: Request,
    ) -> Result<Value, CallError> {
        let route = Route::new(exchange, topic);
        let (reply_tx, reply_rx) = oneshot::channel();
        let call = MemCall::new(ctxt, request, Some(reply_tx));

        debug!(call_id = call.call_id, route = %route, "sending call");
        self.deliver(&route, call).await?;

        match reply_rx.await {
            Ok(Reply::Result(value)) => Ok(value),
            Ok(Reply::Failure(failure)) => Err(CallError::Remote(failure)),
            Err(_) => Err(CallError::NoReply),
        }
    }

    /// Send a request without waiting for any reply.
    pub async fn cast(
        &self,
        exchange: Option<&str>,
        topic: &str,
        ctxt: WireContext,
        request: Request,
    ) -> Result<(), CallError> {
        let route = Route::new(exchange, topic);
        let call = MemCall::new(ctxt, request, None);

        debug!(call_id = call.call_id, route = %route, "sending cast");
        self.deliver(&route, call).await?;
        Ok(())
    }
}

impl Default for MemTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemTransport {
    type Listener = MemListener;

    async fn listen(
        &self,
        exchange: Option<&str>,
        topic: &str,
    ) -> Result<MemListener, TransportError> {
        let route = Route::new(exchange, topic);
        let mut routes = self.inner.routes.write();
        if routes.contains_key(&route) {
            return Err(TransportError::AlreadyListening(route.to_string()));
        }

        let (tx, rx) = mpsc::channel(ROUTE_CAPACITY);
        routes.insert(route.clone(), tx);
        debug!(route = %route, "listener bound");

        Ok(MemListener {
            route,
            receiver: rx,
            inner: self.inner.clone(),
        })
    }
}

/// Listener bound to one route. Dropping it unbinds the route.
pub struct MemListener {
    route: Route,
    receiver: mpsc::Receiver<MemCall>,
    inner: Arc<MemTransportInner>,
}

impl MemListener {
    /// Exchange this listener is bound on.
    pub fn exchange(&self) -> &str {
        &self.route.exchange
    }

    /// Topic this listener is bound on.
    pub fn topic(&self) -> &str {
        &self.route.topic
    }
}

impl fmt::Debug for MemListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemListener")
            .field("route", &format_args!("{}", self.route))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Listener for MemListener {
    type Call = MemCall;

    async fn next(&mut self) -> Option<MemCall> {
        self.receiver.recv().await
    }
}

impl Drop for MemListener {
    fn drop(&mut self) {
        self.inner.routes.write().remove(&self.route);
        debug!(route = %self.route, "listener unbound");
    }
}

/// One in-flight call on the in-memory transport.
pub struct MemCall {
    call_id: u64,
    ctxt: WireContext,
    request: Request,
    reply_tx: Option<oneshot::Sender<Reply>>,
    acked: bool,
}

impl MemCall {
    fn new(ctxt: WireContext, request: Request, reply_tx: Option<oneshot::Sender<Reply>>) -> Self {
        MemCall {
            call_id: rand::random::<u64>(),
            ctxt,
            request,
            reply_tx,
            acked: false,
        }
    }

    /// Transport-assigned id of this call, used in log fields.
    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    pub fn is_acked(&self) -> bool {
        self.acked
    }

    /// Whether the caller is waiting for a reply.
    pub fn expects_reply(&self) -> bool {
        self.reply_tx.is_some()
    }
}

#[async_trait]
impl Incoming for MemCall {
    fn context(&self) -> &WireContext {
        &self.ctxt
    }

    fn request(&self) -> &Request {
        &self.request
    }

    async fn ack(&mut self) -> Result<(), TransportError> {
        self.acked = true;
        debug!(call_id = self.call_id, "call acknowledged");
        Ok(())
    }

    async fn reply(mut self, reply: Reply) -> Result<(), TransportError> {
        match self.reply_tx.take() {
            Some(tx) => tx.send(reply).map_err(|_| TransportError::ReplyClosed),
            None => {
                // Cast: nobody is waiting for this reply.
                debug!(call_id = self.call_id, "no reply expected, dropping");
                Ok(())
            }
        }
    }
}
