// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::{Parser, Subcommand};
use romswitch::config::CHECKSUMS_PATH;
use romswitch::protocol::OpenFlag;
use romswitch_cli::commands::{checksums, open, roms, set_kernel, switch};
use romswitch_cli::DEFAULT_SOCKET;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "romswitch")]
#[command(about = "Client for the romswitchd multi-boot daemon", long_about = None)]
struct Cli {
    /// Daemon socket
    #[arg(long, short, global = true, default_value = DEFAULT_SOCKET)]
    socket: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a file through the daemon and print it, or write to it with --data.
    Open {
        path: String,

        /// Open flag (append, create, exclusive, read_write, truncate, write_only). Repeatable.
        #[arg(long = "flag", short = 'f', value_parser = open::parse_flag)]
        flags: Vec<OpenFlag>,

        /// Write this text instead of reading
        #[arg(long)]
        data: Option<String>,
    },
    /// Flash a ROM's boot and firmware images
    Switch {
        rom_id: String,

        /// Block device the boot image is written to
        #[arg(long)]
        boot_dev: PathBuf,

        /// Directory searched for firmware partitions. Repeatable.
        #[arg(long = "block-dev-dir")]
        block_dev_dirs: Vec<PathBuf>,

        /// Record the current image digests instead of checking them
        #[arg(long)]
        force: bool,
    },
    /// Save the running kernel as a ROM's boot image
    SetKernel {
        rom_id: String,

        #[arg(long)]
        boot_dev: PathBuf,
    },
    /// List installed ROMs
    Roms {
        /// Slot root to scan instead of the built-in ones. Repeatable.
        #[arg(long = "slot-root")]
        slot_roots: Vec<PathBuf>,
    },
    /// Show recorded image checksums
    Checksums {
        #[arg(long, default_value = CHECKSUMS_PATH)]
        path: PathBuf,

        /// Only show this ROM
        #[arg(long)]
        rom: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Open { path, flags, data } => {
            open::run(&cli.socket, &path, &flags, data.as_deref(), &mut std::io::stdout())
        }
        Commands::Switch {
            rom_id,
            boot_dev,
            block_dev_dirs,
            force,
        } => switch::run(&cli.socket, &rom_id, &boot_dev, &block_dev_dirs, force),
        Commands::SetKernel { rom_id, boot_dev } => set_kernel::run(&cli.socket, &rom_id, &boot_dev),
        Commands::Roms { slot_roots } => roms::run(&slot_roots),
        Commands::Checksums { path, rom } => checksums::run(&path, rom.as_deref()),
    }
}
