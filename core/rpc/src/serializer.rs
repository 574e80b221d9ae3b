// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

use herald_transport::WireContext;

use crate::errors::SerializerError;

/// Translation layer between wire values and application values, run
/// around every dispatch: once for the context, once per argument, once
/// for the result.
///
/// The context type is opaque to the dispatcher. It is produced once per
/// dispatch and shared with the method handler.
pub trait Serializer: Send + Sync {
    type Context: Send + Sync;

    /// Turn the wire context into a request context.
    fn deserialize_context(&self, ctxt: &WireContext) -> Result<Self::Context, SerializerError>;

    /// Turn one wire argument into its application form.
    fn deserialize_entity(
        &self,
        ctxt: &Self::Context,
        entity: Value,
    ) -> Result<Value, SerializerError>;

    /// Turn a method result into its wire form.
    fn serialize_entity(
        &self,
        ctxt: &Self::Context,
        entity: Value,
    ) -> Result<Value, SerializerError>;
}

/// Serializer that passes everything through unchanged; the request
/// context is the raw wire context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSerializer;

impl Serializer for NoopSerializer {
    type Context = WireContext;

    fn deserialize_context(&self, ctxt: &WireContext) -> Result<WireContext, SerializerError> {
        Ok(ctxt.clone())
    }

    fn deserialize_entity(
        &self,
        _ctxt: &WireContext,
        entity: Value,
    ) -> Result<Value, SerializerError> {
        Ok(entity)
    }

    fn serialize_entity(
        &self,
        _ctxt: &WireContext,
        entity: Value,
    ) -> Result<Value, SerializerError> {
        Ok(entity)
    }
}
