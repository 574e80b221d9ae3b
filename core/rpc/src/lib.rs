// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Versioned RPC method dispatch over pluggable transports.
//!
//! Endpoints declare a [`Target`] (namespace and version) and a table of
//! methods; the [`RpcDispatcher`] resolves incoming requests against the
//! registered endpoints in order, and the [`RpcServer`] runs the per-call
//! acknowledge/dispatch/reply contract on top of a transport listener.

pub mod dispatcher;
pub mod endpoint;
pub mod errors;
pub mod serializer;
pub mod server;
pub mod target;

#[cfg(test)]
pub(crate) mod testutils;

pub use dispatcher::RpcDispatcher;
pub use endpoint::{Endpoint, MethodHandler, MethodTable};
pub use errors::{DispatchError, EndpointError, SerializerError};
pub use serializer::{NoopSerializer, Serializer};
pub use server::{RpcServer, ServerConfig, ServerError};
pub use target::Target;

// Wire types callers need to build requests and inspect replies.
pub use herald_transport::{Args, Failure, Reply, Request, WireContext};
