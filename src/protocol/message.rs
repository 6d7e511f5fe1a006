// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::switcher::SwitchRomResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Symbolic `open(2)` flag.
///
/// Sent by name rather than as a bitmask so peers can tell an unsupported
/// flag from a typo'd bit. Without `ReadWrite` or `WriteOnly` the file is
/// opened read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OpenFlag {
    Append,
    Create,
    Exclusive,
    ReadWrite,
    Truncate,
    WriteOnly,
}

impl OpenFlag {
    pub const ALL: [OpenFlag; 6] = [
        OpenFlag::Append,
        OpenFlag::Create,
        OpenFlag::Exclusive,
        OpenFlag::ReadWrite,
        OpenFlag::Truncate,
        OpenFlag::WriteOnly,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OpenFlag::Append => "append",
            OpenFlag::Create => "create",
            OpenFlag::Exclusive => "exclusive",
            OpenFlag::ReadWrite => "read_write",
            OpenFlag::Truncate => "truncate",
            OpenFlag::WriteOnly => "write_only",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }

    pub fn to_raw(self) -> libc::c_int {
        match self {
            OpenFlag::Append => libc::O_APPEND,
            OpenFlag::Create => libc::O_CREAT,
            OpenFlag::Exclusive => libc::O_EXCL,
            OpenFlag::ReadWrite => libc::O_RDWR,
            OpenFlag::Truncate => libc::O_TRUNC,
            OpenFlag::WriteOnly => libc::O_WRONLY,
        }
    }
}

impl fmt::Display for OpenFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown open flag: {0}")]
pub struct UnknownOpenFlag(pub String);

impl TryFrom<String> for OpenFlag {
    type Error = UnknownOpenFlag;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_name(&name).ok_or(UnknownOpenFlag(name))
    }
}

impl From<OpenFlag> for String {
    fn from(flag: OpenFlag) -> Self {
        flag.name().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    pub path: String,
    pub flags: Vec<OpenFlag>,
}

/// Status of an open request. The descriptor itself never travels in here;
/// on success it follows the response as ancillary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenResponse {
    pub success: bool,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRomRequest {
    pub rom_id: String,
    pub boot_block_dev: PathBuf,
    pub block_dev_dirs: Vec<PathBuf>,
    pub force_update_checksums: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRomResponse {
    pub result: SwitchRomResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetKernelRequest {
    pub rom_id: String,
    pub boot_block_dev: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetKernelResponse {
    pub success: bool,
}

/// Sent when a request could not be decoded at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    OpenFile(OpenRequest),
    SwitchRom(SwitchRomRequest),
    SetKernel(SetKernelRequest),
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::OpenFile(_) => "open_file",
            Request::SwitchRom(_) => "switch_rom",
            Request::SetKernel(_) => "set_kernel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    OpenFile(OpenResponse),
    SwitchRom(SwitchRomResponse),
    SetKernel(SetKernelResponse),
    Error(ErrorResponse),
}
