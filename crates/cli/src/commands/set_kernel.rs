// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use romswitch::protocol::client::request_set_kernel;
use std::path::Path;

pub fn run(socket: &Path, rom_id: &str, boot_block_dev: &Path) -> anyhow::Result<()> {
    let mut stream = crate::connect(socket)?;
    if !request_set_kernel(&mut stream, rom_id, boot_block_dev)? {
        anyhow::bail!("Failed to set kernel for {}", rom_id);
    }
    println!("Kernel of {} updated from {:?}", rom_id, boot_block_dev);
    Ok(())
}
