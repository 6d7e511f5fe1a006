// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Requests from the unprivileged side.

use super::codec::{recv_message, send_message, ProtocolError, ProtocolResult};
use super::fd::recv_fd;
use super::message::{
    OpenFlag, OpenRequest, Request, Response, SetKernelRequest, SwitchRomRequest,
};
use crate::switcher::SwitchRomResult;
use std::fs::File;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

fn roundtrip(stream: &mut UnixStream, req: &Request) -> ProtocolResult<Response> {
    send_message(stream, req)?;
    let resp: Response = recv_message(stream)?;
    match resp {
        Response::Error(e) => Err(ProtocolError::Remote(e.message)),
        resp => Ok(resp),
    }
}

/// Ask the daemon to open `path` and return the descriptor it sends back.
pub fn request_open(stream: &mut UnixStream, path: &str, flags: &[OpenFlag]) -> ProtocolResult<File> {
    let req = Request::OpenFile(OpenRequest {
        path: path.to_string(),
        flags: flags.to_vec(),
    });

    match roundtrip(stream, &req)? {
        Response::OpenFile(resp) if resp.success => Ok(File::from(recv_fd(stream)?)),
        Response::OpenFile(resp) => Err(ProtocolError::Remote(resp.error_message)),
        _ => Err(ProtocolError::UnexpectedResponse),
    }
}

pub fn request_switch_rom(
    stream: &mut UnixStream,
    rom_id: &str,
    boot_block_dev: &Path,
    block_dev_dirs: &[PathBuf],
    force_update_checksums: bool,
) -> ProtocolResult<SwitchRomResult> {
    let req = Request::SwitchRom(SwitchRomRequest {
        rom_id: rom_id.to_string(),
        boot_block_dev: boot_block_dev.to_path_buf(),
        block_dev_dirs: block_dev_dirs.to_vec(),
        force_update_checksums,
    });

    match roundtrip(stream, &req)? {
        Response::SwitchRom(resp) => Ok(resp.result),
        _ => Err(ProtocolError::UnexpectedResponse),
    }
}

pub fn request_set_kernel(stream: &mut UnixStream, rom_id: &str, boot_block_dev: &Path) -> ProtocolResult<bool> {
    let req = Request::SetKernel(SetKernelRequest {
        rom_id: rom_id.to_string(),
        boot_block_dev: boot_block_dev.to_path_buf(),
    });

    match roundtrip(stream, &req)? {
        Response::SetKernel(resp) => Ok(resp.success),
        _ => Err(ProtocolError::UnexpectedResponse),
    }
}
