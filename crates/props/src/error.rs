// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropsError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("{path}: failed to write properties: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid property file path: {0}")]
    InvalidPath(PathBuf),
}

pub type Result<T> = std::result::Result<T, PropsError>;
