// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::protocol::client::{request_open, request_switch_rom};
use crate::protocol::codec::{
    decode, encode, read_frame, recv_message, send_message, write_frame, MAX_FRAME_LEN,
};
use crate::protocol::fd::{recv_fd, send_fd};
use crate::protocol::open::{os_error_message, raw_flags, serve_open};
use crate::protocol::{
    OpenFlag, OpenRequest, ProtocolError, Request, Response, SwitchRomRequest, SwitchRomResponse,
};
use crate::switcher::SwitchRomResult;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::thread;

/// Serve open requests on `stream` until the peer hangs up.
fn spawn_open_server(mut stream: UnixStream) -> thread::JoinHandle<usize> {
    thread::spawn(move || {
        let mut served = 0;
        loop {
            match recv_message::<_, Request>(&mut stream) {
                Ok(Request::OpenFile(req)) => {
                    serve_open(&mut stream, &req).unwrap();
                    served += 1;
                }
                Ok(other) => panic!("unexpected request {}", other.kind()),
                Err(ProtocolError::Closed) => return served,
                Err(e) => panic!("server error: {}", e),
            }
        }
    })
}

#[test]
fn test_frames_are_sequential() {
    let first = Request::SwitchRom(SwitchRomRequest {
        rom_id: "dual".into(),
        boot_block_dev: PathBuf::from("/dev/block/by-name/boot"),
        block_dev_dirs: vec![PathBuf::from("/dev/block/by-name")],
        force_update_checksums: true,
    });
    let second = Request::OpenFile(OpenRequest {
        path: "/data/local/tmp/x".into(),
        flags: vec![OpenFlag::ReadWrite, OpenFlag::Create],
    });

    let mut buf = Vec::new();
    send_message(&mut buf, &first).unwrap();
    send_message(&mut buf, &second).unwrap();

    let mut cursor = Cursor::new(buf);
    assert_eq!(recv_message::<_, Request>(&mut cursor).unwrap(), first);
    assert_eq!(recv_message::<_, Request>(&mut cursor).unwrap(), second);
    assert!(matches!(
        recv_message::<_, Request>(&mut cursor),
        Err(ProtocolError::Closed)
    ));
}

#[test]
fn test_oversized_frames_rejected() {
    let mut buf = Vec::new();
    let err = write_frame(&mut buf, &vec![0u8; MAX_FRAME_LEN + 1]).unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
    assert!(buf.is_empty());

    // A hostile length prefix is refused before allocating
    let header = ((MAX_FRAME_LEN as u32) + 1).to_le_bytes();
    let err = read_frame(&mut Cursor::new(header.to_vec())).unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(n) if n == MAX_FRAME_LEN + 1));
}

#[test]
fn test_truncated_frame_is_io_error() {
    let mut buf = Vec::new();
    write_frame(&mut buf, b"hello").unwrap();
    buf.truncate(buf.len() - 2);
    assert!(matches!(
        read_frame(&mut Cursor::new(buf)),
        Err(ProtocolError::Io(_))
    ));
}

#[test]
fn test_unknown_flag_name_fails_decode() {
    #[derive(serde::Serialize)]
    struct RawOpenRequest {
        path: String,
        flags: Vec<String>,
    }
    // Same shape as OpenRequest, with a flag name nobody knows
    let payload = encode(&RawOpenRequest {
        path: "/tmp/x".into(),
        flags: vec!["write_only".into(), "nofollow".into()],
    })
    .unwrap();

    assert!(matches!(decode::<OpenRequest>(&payload), Err(ProtocolError::Decode(_))));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut payload = encode(&Response::SwitchRom(SwitchRomResponse {
        result: SwitchRomResult::Succeeded,
    }))
    .unwrap();
    payload.push(0);
    assert!(matches!(decode::<Response>(&payload), Err(ProtocolError::Decode(_))));
}

#[test]
fn test_flag_names() {
    assert_eq!(OpenFlag::from_name("read_write"), Some(OpenFlag::ReadWrite));
    assert_eq!(OpenFlag::from_name("O_RDWR"), None);
    assert_eq!(OpenFlag::WriteOnly.to_string(), "write_only");
    assert_eq!(raw_flags(&[]), libc::O_RDONLY);
    assert_eq!(
        raw_flags(&[OpenFlag::WriteOnly, OpenFlag::Create, OpenFlag::Truncate]),
        libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC
    );
    assert_eq!(
        raw_flags(&[OpenFlag::ReadWrite, OpenFlag::Append, OpenFlag::Exclusive]),
        libc::O_RDWR | libc::O_APPEND | libc::O_EXCL
    );
}

#[test]
fn test_open_passes_usable_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.txt");
    let (mut client, server) = UnixStream::pair().unwrap();
    let handle = spawn_open_server(server);

    let mut file = request_open(
        &mut client,
        target.to_str().unwrap(),
        &[OpenFlag::WriteOnly, OpenFlag::Create, OpenFlag::Truncate],
    )
    .unwrap();
    file.write_all(b"written through a passed fd").unwrap();
    drop(file);

    let mut file = request_open(&mut client, target.to_str().unwrap(), &[OpenFlag::ReadWrite]).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    assert_eq!(content, "written through a passed fd");

    drop(client);
    assert_eq!(handle.join().unwrap(), 2);
}

#[test]
fn test_open_failure_sends_no_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let present = dir.path().join("present");
    std::fs::write(&present, b"ok").unwrap();
    let (mut client, server) = UnixStream::pair().unwrap();
    let handle = spawn_open_server(server);

    let err = request_open(&mut client, missing.to_str().unwrap(), &[OpenFlag::ReadWrite]).unwrap_err();
    match err {
        ProtocolError::Remote(msg) => assert_eq!(msg, "No such file or directory"),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!missing.exists());

    // The stream is still in sync: the next reply is a frame, not a stray fd byte
    let mut file = request_open(&mut client, present.to_str().unwrap(), &[]).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    assert_eq!(content, "ok");

    drop(client);
    assert_eq!(handle.join().unwrap(), 2);
}

#[test]
fn test_exclusive_create_reports_existing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taken");
    std::fs::write(&path, b"").unwrap();
    let (mut client, server) = UnixStream::pair().unwrap();
    let handle = spawn_open_server(server);

    let err = request_open(
        &mut client,
        path.to_str().unwrap(),
        &[OpenFlag::WriteOnly, OpenFlag::Create, OpenFlag::Exclusive],
    )
    .unwrap_err();
    assert!(matches!(err, ProtocolError::Remote(msg) if msg.contains("File exists")));

    drop(client);
    handle.join().unwrap();
}

#[test]
fn test_descriptor_survives_transfer() {
    let mut tmp = tempfile::tempfile().unwrap();
    tmp.write_all(b"shared offset").unwrap();
    let (left, right) = UnixStream::pair().unwrap();

    send_fd(&left, tmp.as_fd()).unwrap();
    let mut received = File::from(recv_fd(&right).unwrap());

    // Same open file description, so the offset is shared
    received.seek(SeekFrom::Start(7)).unwrap();
    let mut rest = String::new();
    tmp.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "offset");
}

#[test]
fn test_recv_fd_without_descriptor() {
    let (mut left, right) = UnixStream::pair().unwrap();
    left.write_all(&[0]).unwrap();
    let err = recv_fd(&right).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn test_error_response_surfaces_as_remote() {
    let (mut client, mut server) = UnixStream::pair().unwrap();
    let handle = thread::spawn(move || {
        let _: Request = recv_message(&mut server).unwrap();
        send_message(
            &mut server,
            &Response::Error(crate::protocol::ErrorResponse {
                message: "busy".into(),
            }),
        )
        .unwrap();
    });

    let err = request_switch_rom(&mut client, "dual", &PathBuf::from("/dev/boot"), &[], false).unwrap_err();
    assert!(matches!(err, ProtocolError::Remote(msg) if msg == "busy"));
    handle.join().unwrap();
}

#[test]
fn test_os_error_message_is_plain_strerror() {
    let err = std::io::Error::from_raw_os_error(libc::EEXIST);
    assert_eq!(os_error_message(&err), "File exists");

    let custom = std::io::Error::new(std::io::ErrorKind::InvalidInput, "path contains NUL byte");
    assert_eq!(os_error_message(&custom), "path contains NUL byte");
}
