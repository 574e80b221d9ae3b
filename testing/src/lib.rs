// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Ready-made endpoints shared by the demo binaries.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use herald_rpc::{Endpoint, EndpointError, MethodTable, Target, WireContext};

/// Operands for the binary arithmetic methods.
#[derive(Debug, Deserialize)]
pub struct BinaryOp {
    pub a: i64,
    pub b: i64,
}

/// Arithmetic endpoint serving `add` and `div` at interface version 2.1.
/// Division by zero is an expected failure, relayed without error logs.
pub struct MathEndpoint {
    target: Target,
    methods: MethodTable<WireContext>,
}

impl MathEndpoint {
    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods.register("add", |_ctxt: Arc<WireContext>, op: BinaryOp| async move {
            Ok(json!(op.a + op.b))
        });
        methods.register("div", |_ctxt: Arc<WireContext>, op: BinaryOp| async move {
            if op.b == 0 {
                return Err(EndpointError::expected(
                    "DivisionByZero",
                    "cannot divide by zero",
                ));
            }
            Ok(json!(op.a / op.b))
        });

        MathEndpoint {
            target: Target::new().with_version("2.1"),
            methods,
        }
    }
}

impl Default for MathEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl Endpoint<WireContext> for MathEndpoint {
    fn target(&self) -> Target {
        self.target.clone()
    }

    fn methods(&self) -> &MethodTable<WireContext> {
        &self.methods
    }
}

/// Diagnostic endpoint in the `diag` namespace whose `echo` method
/// returns its arguments unchanged.
pub struct EchoEndpoint {
    target: Target,
    methods: MethodTable<WireContext>,
}

impl EchoEndpoint {
    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods.register("echo", |_ctxt: Arc<WireContext>, args: Value| async move {
            Ok(args)
        });

        EchoEndpoint {
            target: Target::new().with_namespace("diag"),
            methods,
        }
    }
}

impl Default for EchoEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl Endpoint<WireContext> for EchoEndpoint {
    fn target(&self) -> Target {
        self.target.clone()
    }

    fn methods(&self) -> &MethodTable<WireContext> {
        &self.methods
    }
}
