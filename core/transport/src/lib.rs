// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod errors;
pub mod mem;
pub mod message;
pub mod traits;

pub use errors::{CallError, TransportError};
pub use mem::MemTransport;
pub use message::{Args, DEFAULT_VERSION, Failure, Reply, Request, WireContext};
pub use traits::{Incoming, Listener, Transport};
