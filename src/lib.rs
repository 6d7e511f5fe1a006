// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! romswitch: privileged core of a multi-boot ROM switching daemon.
//!
//! Verifies ROM images against a persistent checksum store and flashes them
//! to block devices, and brokers file opens for unprivileged clients by
//! passing descriptors over a Unix socket.

pub mod config;
pub mod error;
pub mod digest;
pub mod checksums;
pub mod blockdev;
pub mod roms;
pub mod images;
pub mod permissions;
pub mod switcher;
pub mod protocol;

pub use checksums::{ChecksumLookup, ChecksumStore};
pub use config::SwitcherConfig;
pub use error::{PermissionError, SwitchError, SwitchResult};
pub use switcher::{SwitchRomResult, Switcher};

#[cfg(test)]
pub mod tests;
