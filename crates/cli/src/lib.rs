// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod commands;

use anyhow::Context;
use std::os::unix::net::UnixStream;
use std::path::Path;

/// Default daemon socket.
pub const DEFAULT_SOCKET: &str = "/dev/socket/romswitchd";

pub fn connect(socket: &Path) -> anyhow::Result<UnixStream> {
    UnixStream::connect(socket).with_context(|| format!("Failed to connect to {:?}", socket))
}
