// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use romswitch::protocol::client::request_open;
use romswitch::protocol::OpenFlag;
use std::io::{self, Write};
use std::path::Path;

/// clap value parser for `--flag`.
pub fn parse_flag(name: &str) -> Result<OpenFlag, String> {
    OpenFlag::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = OpenFlag::ALL.iter().map(|f| f.name()).collect();
        format!("unknown flag '{}', expected one of: {}", name, known.join(", "))
    })
}

/// Open `path` through the daemon. With `data`, write it to the file;
/// otherwise copy the file's contents to `out`.
pub fn run<W: Write>(
    socket: &Path,
    path: &str,
    flags: &[OpenFlag],
    data: Option<&str>,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut stream = crate::connect(socket)?;
    let mut file = request_open(&mut stream, path, flags)
        .with_context(|| format!("Daemon could not open {}", path))?;

    match data {
        Some(data) => {
            file.write_all(data.as_bytes())?;
            file.sync_all()?;
        }
        None => {
            io::copy(&mut file, out)?;
        }
    }
    Ok(())
}
