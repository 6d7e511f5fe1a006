// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Android-style `key=value` property files.
//!
//! Property files are read wholesale into a [`Properties`] map and written
//! back wholesale. Writers go through a temporary sibling file and a rename
//! so a crash mid-write leaves either the old or the new contents on disk.

pub mod error;
pub mod properties;

pub use error::{PropsError, Result};
pub use properties::{load, parse, persist, serialize, PersistOptions, Properties};
