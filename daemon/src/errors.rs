// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use romswitch::protocol::ProtocolError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Failed to read config {path:?}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },
    #[error("Invalid config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to bind socket {path:?}: {source}")]
    Bind { path: PathBuf, source: io::Error },
    #[error("Metrics exporter: {0}")]
    Metrics(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
