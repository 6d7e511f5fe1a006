// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use romswitch::protocol::client::request_switch_rom;
use romswitch::SwitchRomResult;
use std::path::{Path, PathBuf};

pub fn run(
    socket: &Path,
    rom_id: &str,
    boot_block_dev: &Path,
    block_dev_dirs: &[PathBuf],
    force: bool,
) -> anyhow::Result<()> {
    let mut stream = crate::connect(socket)?;
    let result = request_switch_rom(&mut stream, rom_id, boot_block_dev, block_dev_dirs, force)?;

    match result {
        SwitchRomResult::Succeeded => {
            println!("Switched to {}", rom_id);
            Ok(())
        }
        SwitchRomResult::ChecksumNotFound => anyhow::bail!(
            "No checksum recorded for one or more images of {}; rerun with --force to trust them",
            rom_id
        ),
        SwitchRomResult::ChecksumInvalid => {
            anyhow::bail!("Images of {} do not match their recorded checksums", rom_id)
        }
        SwitchRomResult::Failed => anyhow::bail!("Failed to switch to {}", rom_id),
    }
}
