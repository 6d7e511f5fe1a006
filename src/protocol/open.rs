// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Privileged file open.
//!
//! The unprivileged peer states a path and symbolic flags; this side performs
//! the open. The peer never hands over a descriptor of its own.

use super::codec::{send_message, ProtocolResult};
use super::fd::send_fd;
use super::message::{OpenFlag, OpenRequest, OpenResponse, Response};
use std::ffi::{CStr, CString};
use std::io;
use std::os::fd::{AsFd, FromRawFd, OwnedFd};
use std::os::unix::net::UnixStream;

/// Permission bits for files created by an open request, before umask.
pub const CREATE_MODE: libc::c_uint = 0o666;

/// Fold symbolic flags into `open(2)` flags.
pub fn raw_flags(flags: &[OpenFlag]) -> libc::c_int {
    flags.iter().fold(libc::O_RDONLY, |acc, flag| acc | flag.to_raw())
}

pub fn open_with_flags(path: &str, flags: &[OpenFlag]) -> io::Result<OwnedFd> {
    let c_path = CString::new(path)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"))?;
    let oflag = raw_flags(flags) | libc::O_CLOEXEC;

    let fd = unsafe { libc::open(c_path.as_ptr(), oflag, CREATE_MODE) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// `strerror` text for an OS error, without Rust's `(os error N)` suffix.
pub fn os_error_message(err: &io::Error) -> String {
    let Some(code) = err.raw_os_error() else {
        return err.to_string();
    };

    let mut buf = [0 as libc::c_char; 256];
    let ret = unsafe { libc::strerror_r(code, buf.as_mut_ptr(), buf.len()) };
    if ret != 0 {
        return format!("Unknown error {}", code);
    }
    unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Perform the open and build the status response.
pub fn handle_open(req: &OpenRequest) -> (OpenResponse, Option<OwnedFd>) {
    match open_with_flags(&req.path, &req.flags) {
        Ok(fd) => {
            tracing::debug!("Opened {:?} with flags {:?}", req.path, req.flags);
            (
                OpenResponse {
                    success: true,
                    error_message: String::new(),
                },
                Some(fd),
            )
        }
        Err(e) => {
            tracing::warn!("{}: Failed to open file: {}", req.path, e);
            (
                OpenResponse {
                    success: false,
                    error_message: os_error_message(&e),
                },
                None,
            )
        }
    }
}

/// Answer an open request on `stream`.
///
/// The status frame goes first; on success the descriptor follows as
/// ancillary data. Our copy of the descriptor is closed afterwards.
pub fn serve_open(stream: &mut UnixStream, req: &OpenRequest) -> ProtocolResult<bool> {
    let (resp, fd) = handle_open(req);
    let success = resp.success;

    send_message(stream, &Response::OpenFile(resp))?;
    if let Some(fd) = fd {
        send_fd(stream, fd.as_fd())?;
    }
    Ok(success)
}
