// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Daemon wire protocol.
//!
//! Requests and responses are framed bincode messages over a Unix stream
//! socket. An open request that succeeds is answered with a status frame
//! followed by the opened descriptor as `SCM_RIGHTS` ancillary data.

pub mod client;
pub mod codec;
pub mod fd;
pub mod message;
pub mod open;

pub use codec::{ProtocolError, ProtocolResult};
pub use message::*;
