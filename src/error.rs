// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("Invalid ROM ID: {0}")]
    UnknownRom(String),
    #[error("{path}: failed to create directory: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: failed to read image: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: failed to write image: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to fix permissions: {0}")]
    Permissions(#[from] PermissionError),
}

#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("{path}: failed to chown: {source}")]
    Chown {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: failed to chmod: {source}")]
    Chmod {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: failed to set security label to {label}: {source}")]
    Label {
        path: PathBuf,
        label: String,
        #[source]
        source: io::Error,
    },
}

pub type SwitchResult<T> = std::result::Result<T, SwitchError>;
