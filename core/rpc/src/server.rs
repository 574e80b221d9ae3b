// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! The serving loop and the per-call contract: acknowledge first, then
//! dispatch, then reply exactly once whatever the outcome. Each call runs
//! on its own task, bounded by a semaphore; shutdown stops accepting new
//! calls and drains the in-flight ones.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use herald_transport::{Incoming, Listener, Reply, Transport, TransportError};

use crate::dispatcher::RpcDispatcher;
use crate::serializer::Serializer;
use crate::target::Target;

/// Errors that keep the serving loop from starting.
#[derive(Error, Debug, PartialEq)]
pub enum ServerError {
    #[error("server target has no topic")]
    MissingTopic,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn default_max_inflight() -> usize {
    64
}

/// Serving-loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Maximum number of calls processed concurrently.
    #[serde(default = "default_max_inflight")]
    max_inflight: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            max_inflight: default_max_inflight(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_inflight(self, max_inflight: usize) -> Self {
        ServerConfig { max_inflight }
    }

    pub fn max_inflight(&self) -> usize {
        self.max_inflight
    }
}

struct ServerInner<S: Serializer> {
    dispatcher: RpcDispatcher<S>,
    config: ServerConfig,
    limiter: Arc<Semaphore>,
    cancellation_token: RwLock<CancellationToken>,
    drain_signal: RwLock<Option<drain::Signal>>,
    drain_watch: RwLock<Option<drain::Watch>>,
}

/// RPC server binding a dispatcher to a transport listener. Cheap to
/// clone; all clones share the same shutdown plumbing, so several serve
/// loops (one per route) can be stopped with a single [`shutdown`].
///
/// [`shutdown`]: RpcServer::shutdown
pub struct RpcServer<S: Serializer> {
    inner: Arc<ServerInner<S>>,
}

impl<S: Serializer> Clone for RpcServer<S> {
    fn clone(&self) -> Self {
        RpcServer {
            inner: self.inner.clone(),
        }
    }
}

impl<S> RpcServer<S>
where
    S: Serializer + Send + Sync + 'static,
    S::Context: Send + Sync + 'static,
{
    pub fn new(dispatcher: RpcDispatcher<S>) -> Self {
        Self::with_config(dispatcher, ServerConfig::default())
    }

    pub fn with_config(dispatcher: RpcDispatcher<S>, config: ServerConfig) -> Self {
        let (drain_signal, drain_watch) = drain::channel();

        RpcServer {
            inner: Arc::new(ServerInner {
                // At least one call must be able to run.
                limiter: Arc::new(Semaphore::new(config.max_inflight().max(1))),
                dispatcher,
                config,
                cancellation_token: RwLock::new(CancellationToken::new()),
                drain_signal: RwLock::new(Some(drain_signal)),
                drain_watch: RwLock::new(Some(drain_watch)),
            }),
        }
    }

    pub fn dispatcher(&self) -> &RpcDispatcher<S> {
        &self.inner.dispatcher
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Bind a listener for `target` on `transport` and serve until
    /// shutdown or until the transport closes. The target must carry a
    /// topic. Must be called within a tokio runtime.
    pub async fn serve<T>(
        &self,
        transport: T,
        target: Target,
    ) -> Result<JoinHandle<()>, ServerError>
    where
        T: Transport + 'static,
    {
        let topic = target.topic().ok_or(ServerError::MissingTopic)?;
        let listener = transport.listen(target.exchange(), topic).await?;
        info!(%target, "rpc server started");

        // The loop holds its own watch and call tasks clone that one,
        // never the shared slot; the drain on shutdown therefore covers
        // every call the loop spawned, including one dequeued while
        // shutdown is taking the stored watch.
        let cancellation = self.inner.cancellation_token.read().clone();
        let drain_watch = self.inner.drain_watch.read().clone();

        let server = self.clone();
        Ok(tokio::spawn(async move {
            server.serve_loop(listener, cancellation, drain_watch).await
        }))
    }

    async fn serve_loop<L>(
        &self,
        mut listener: L,
        cancellation: CancellationToken,
        drain_watch: Option<drain::Watch>,
    ) where
        L: Listener + 'static,
    {
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    info!("rpc server received shutdown signal");
                    return;
                }
                call = listener.next() => {
                    let Some(call) = call else {
                        info!("transport listener closed");
                        return;
                    };

                    let Ok(permit) = self.inner.limiter.clone().acquire_owned().await else {
                        // The semaphore is never closed.
                        return;
                    };
                    let watch = drain_watch.clone();
                    let server = self.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        let _watch = watch;
                        server.process_incoming(call).await;
                    });
                }
            }
        }
    }

    /// Per-call contract: acknowledge first, dispatch, then exactly one
    /// reply on every path. Expected failures are relayed without
    /// error-level logging.
    async fn process_incoming<I>(&self, mut call: I)
    where
        I: Incoming,
    {
        let method = call.request().method().to_string();

        if let Err(e) = call.ack().await {
            error!(method, error = %e, "cannot acknowledge call, skipping");
            return;
        }

        let reply = match self
            .inner
            .dispatcher
            .dispatch(call.context(), call.request())
            .await
        {
            Ok(value) => Reply::Result(value),
            Err(e) if e.is_expected() => {
                debug!(method, error = %e, "expected failure during call handling");
                Reply::Failure(e.to_failure())
            }
            Err(e) => {
                error!(method, error = %e, "call handling failed");
                Reply::Failure(e.to_failure())
            }
        };

        if let Err(e) = call.reply(reply).await {
            error!(method, error = %e, "cannot send reply");
        }
    }

    /// Stop accepting new calls, then wait for the serve loops to exit
    /// and for in-flight calls to finish; their replies are still sent.
    /// The server can serve again afterwards.
    pub async fn shutdown(&self) {
        info!("shutting down rpc server");

        self.inner.cancellation_token.read().cancel();

        let drain_signal = self.inner.drain_signal.write().take();
        let drain_watch = self.inner.drain_watch.write().take();

        // Drop the stored watch so only serve loops and call tasks hold
        // one.
        drop(drain_watch);

        if let Some(signal) = drain_signal {
            debug!("draining in-flight calls");
            signal.drain().await;
            debug!("all in-flight calls drained");
        }

        // Recreate the shutdown plumbing so the server can be restarted.
        let (new_signal, new_watch) = drain::channel();
        *self.inner.drain_signal.write() = Some(new_signal);
        *self.inner.drain_watch.write() = Some(new_watch);
        *self.inner.cancellation_token.write() = CancellationToken::new();
    }
}
