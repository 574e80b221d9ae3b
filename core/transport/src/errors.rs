// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::message::Failure;

/// Errors raised by a transport while binding, delivering, or replying.
#[derive(Error, Debug, PartialEq)]
pub enum TransportError {
    // Binding
    #[error("already listening on {0}")]
    AlreadyListening(String),

    // Delivery
    #[error("no route to {0}")]
    NoRoute(String),
    #[error("queue closed: {0}")]
    QueueClosed(String),

    // Reply path
    #[error("reply channel closed by caller")]
    ReplyClosed,
}

/// Errors surfaced to a caller issuing a call or a cast.
#[derive(Error, Debug, PartialEq)]
pub enum CallError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The serving side processed the call and replied with a failure.
    #[error("remote failure: {0}")]
    Remote(Failure),

    /// The call was delivered but dropped before a reply was produced.
    #[error("no reply received")]
    NoReply,
}
