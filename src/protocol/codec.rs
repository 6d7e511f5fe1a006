// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Length-prefixed bincode frames.
//!
//! Format: `[len: u32 LE][payload: len bytes]`, payload encoded with
//! bincode's serde mode and standard config. Frames are read with exact-size
//! reads so a reader never consumes bytes that belong to the next frame or
//! to a descriptor-carrying message behind it.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Upper bound for a single frame payload.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

const HEADER_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Frame of {0} bytes exceeds limit of {MAX_FRAME_LEN}")]
    FrameTooLarge(usize),
    #[error("Connection closed by peer")]
    Closed,
    #[error("Daemon error: {0}")]
    Remote(String),
    #[error("Unexpected response type")]
    UnexpectedResponse,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> ProtocolResult<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    writer.write_u32::<LittleEndian>(payload.len() as u32)?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame. `Ok(None)` if the peer closed the stream between frames.
pub fn read_frame<R: Read>(reader: &mut R) -> ProtocolResult<Option<Vec<u8>>> {
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let len = LittleEndian::read_u32(&header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}

pub fn encode<T: Serialize>(msg: &T) -> ProtocolResult<Vec<u8>> {
    bincode::serde::encode_to_vec(msg, bincode::config::standard())
        .map_err(|e| ProtocolError::Encode(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> ProtocolResult<T> {
    let (msg, used) = bincode::serde::decode_from_slice(payload, bincode::config::standard())
        .map_err(|e| ProtocolError::Decode(e.to_string()))?;
    if used != payload.len() {
        return Err(ProtocolError::Decode(format!(
            "{} trailing bytes after message",
            payload.len() - used
        )));
    }
    Ok(msg)
}

pub fn send_message<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> ProtocolResult<()> {
    write_frame(writer, &encode(msg)?)
}

/// Receive one message, treating a closed stream as [`ProtocolError::Closed`].
pub fn recv_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> ProtocolResult<T> {
    let payload = read_frame(reader)?.ok_or(ProtocolError::Closed)?;
    decode(&payload)
}
