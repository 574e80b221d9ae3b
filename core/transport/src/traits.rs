// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Seam between the RPC layer and a queueing substrate. A transport binds
//! listeners to routes and hands over incoming calls. Each call is
//! acknowledged once and replied to at most once.

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::message::{Reply, Request, WireContext};

/// A message transport able to bind listeners on routes.
#[async_trait]
pub trait Transport: Send + Sync {
    type Listener: Listener + Send + 'static;

    /// Bind a listener on the given route. `exchange` scopes the topic;
    /// `None` means the transport's default exchange.
    async fn listen(
        &self,
        exchange: Option<&str>,
        topic: &str,
    ) -> Result<Self::Listener, TransportError>;
}

/// Stream of incoming calls on one route.
#[async_trait]
pub trait Listener: Send {
    type Call: Incoming + Send + 'static;

    /// Next incoming call, or `None` once the transport is closed.
    async fn next(&mut self) -> Option<Self::Call>;
}

/// A single in-flight call handed over by a listener.
#[async_trait]
pub trait Incoming: Send {
    /// Request context as carried on the wire.
    fn context(&self) -> &WireContext;

    /// The request itself.
    fn request(&self) -> &Request;

    /// Acknowledge receipt. Must happen before the request is processed.
    async fn ack(&mut self) -> Result<(), TransportError>;

    /// Send the reply for this call. Consuming the call makes a second
    /// reply unrepresentable.
    async fn reply(self, reply: Reply) -> Result<(), TransportError>;
}
