// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Request/reply demo: serves the shared endpoints on an in-memory
//! transport and issues a batch of calls against them.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

use herald_rpc::{
    NoopSerializer, Request, RpcDispatcher, RpcServer, ServerConfig, Target, WireContext,
};
use herald_testing::{EchoEndpoint, MathEndpoint};
use herald_tracing::TracingConfiguration;
use herald_transport::MemTransport;

#[derive(Parser, Debug)]
pub struct Args {
    /// Number of add calls to issue.
    #[arg(short, long, value_name = "CALLS", required = false, default_value_t = 8)]
    calls: u32,

    /// Topic to serve and call on.
    #[arg(
        short,
        long,
        value_name = "TOPIC",
        required = false,
        default_value = "demo"
    )]
    topic: String,
}

impl Args {
    pub fn calls(&self) -> &u32 {
        &self.calls
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    TracingConfiguration::default()
        .with_log_level("debug".to_string())
        .setup_tracing_subscriber();

    let transport = MemTransport::new();
    let dispatcher = RpcDispatcher::new(
        vec![
            Arc::new(MathEndpoint::new()) as _,
            Arc::new(EchoEndpoint::new()) as _,
        ],
        NoopSerializer,
    );
    let server = RpcServer::with_config(dispatcher, ServerConfig::new().with_max_inflight(4));

    let handle = server
        .serve(transport.clone(), Target::new().with_topic(args.topic()))
        .await
        .expect("failed to start server");

    for i in 0..*args.calls() {
        let request = Request::new("add")
            .with_version("2.0")
            .with_arg("a", json!(i))
            .with_arg("b", json!(i + 1));
        match transport
            .call(None, args.topic(), WireContext::new(), request)
            .await
        {
            Ok(result) => info!(%result, "add returned"),
            Err(e) => warn!(error = %e, "add failed"),
        }
    }

    // A division by zero comes back as a remote failure.
    let request = Request::new("div")
        .with_version("2.0")
        .with_arg("a", json!(1))
        .with_arg("b", json!(0));
    if let Err(e) = transport
        .call(None, args.topic(), WireContext::new(), request)
        .await
    {
        info!(error = %e, "div by zero rejected");
    }

    // Casts return before the method runs; give the echo a moment.
    let request = Request::new("echo")
        .with_namespace("diag")
        .with_arg("payload", json!("ping"));
    transport
        .cast(None, args.topic(), WireContext::new(), request)
        .await
        .expect("cast failed");
    tokio::time::sleep(Duration::from_millis(50)).await;

    server.shutdown().await;
    handle.await.expect("server task failed");
}
