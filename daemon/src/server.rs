// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::config::DaemonConfig;
use crate::errors::DaemonError;
use romswitch::permissions::LinuxPermissions;
use romswitch::protocol::codec::{decode, read_frame, send_message};
use romswitch::protocol::open::serve_open;
use romswitch::protocol::{
    ErrorResponse, ProtocolError, ProtocolResult, Request, Response, SetKernelRequest, SetKernelResponse,
    SwitchRomRequest, SwitchRomResponse,
};
use romswitch::roms::InstalledRoms;
use romswitch::Switcher;
use std::future::Future;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::UnixListener;

/// Pause after a failed accept, so descriptor exhaustion doesn't spin.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub type SharedDaemon = Arc<Daemon>;

/// Request handler shared by all connections.
pub struct Daemon {
    switcher: Switcher,
    // SwitchRom and SetKernel both rewrite the checksum store
    flash_lock: Mutex<()>,
    idle_timeout: Option<Duration>,
}

impl Daemon {
    pub fn new(switcher: Switcher) -> Self {
        Self {
            switcher,
            flash_lock: Mutex::new(()),
            idle_timeout: None,
        }
    }

    pub fn from_config(cfg: &DaemonConfig) -> Self {
        let roms = Arc::new(InstalledRoms::new(cfg.rom_roots.iter().cloned()));
        Self::new(Switcher::new(cfg.switcher.clone(), roms, Arc::new(LinuxPermissions)))
            .with_idle_timeout(cfg.idle_timeout())
    }

    /// Close connections that send nothing for `timeout`. `None` waits forever.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    fn lock_flash(&self) -> MutexGuard<'_, ()> {
        self.flash_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle one request and write its reply.
    pub fn dispatch(&self, stream: &mut UnixStream, req: Request) -> ProtocolResult<()> {
        metrics::increment_counter!("romswitch_requests_total", "kind" => req.kind());

        match req {
            Request::OpenFile(req) => {
                let success = serve_open(stream, &req)?;
                metrics::increment_counter!(
                    "romswitch_open_file_total",
                    "success" => if success { "true" } else { "false" }
                );
                Ok(())
            }
            Request::SwitchRom(req) => {
                let resp = self.switch_rom(&req);
                send_message(stream, &Response::SwitchRom(resp))
            }
            Request::SetKernel(req) => {
                let resp = self.set_kernel(&req);
                send_message(stream, &Response::SetKernel(resp))
            }
        }
    }

    fn switch_rom(&self, req: &SwitchRomRequest) -> SwitchRomResponse {
        tracing::info!("Switch to ROM {} requested", req.rom_id);
        let result = {
            let _guard = self.lock_flash();
            self.switcher.switch_rom(
                &req.rom_id,
                &req.boot_block_dev,
                &req.block_dev_dirs,
                req.force_update_checksums,
            )
        };
        tracing::info!("Switch to ROM {} finished: {}", req.rom_id, result.as_str());
        metrics::increment_counter!("romswitch_switch_rom_total", "result" => result.as_str());
        SwitchRomResponse { result }
    }

    fn set_kernel(&self, req: &SetKernelRequest) -> SetKernelResponse {
        tracing::info!("Set kernel for ROM {} requested", req.rom_id);
        let outcome = {
            let _guard = self.lock_flash();
            self.switcher.set_kernel(&req.rom_id, &req.boot_block_dev)
        };
        let success = match outcome {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to set kernel for {}: {}", req.rom_id, e);
                false
            }
        };
        metrics::increment_counter!(
            "romswitch_set_kernel_total",
            "success" => if success { "true" } else { "false" }
        );
        SetKernelResponse { success }
    }
}

/// Serve requests on one connection until the peer hangs up or goes idle.
///
/// A frame that does not decode as a request gets an error reply and the
/// connection stays open. Transport errors end the connection.
pub fn handle_connection(daemon: &Daemon, mut stream: UnixStream) -> ProtocolResult<()> {
    stream.set_read_timeout(daemon.idle_timeout)?;
    stream.set_write_timeout(daemon.idle_timeout)?;

    loop {
        let payload = match read_frame(&mut stream) {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(ProtocolError::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                tracing::debug!("Closing idle connection");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match decode::<Request>(&payload) {
            Ok(req) => daemon.dispatch(&mut stream, req)?,
            Err(e) => {
                tracing::warn!("Rejecting malformed request: {}", e);
                send_message(
                    &mut stream,
                    &Response::Error(ErrorResponse {
                        message: e.to_string(),
                    }),
                )?;
            }
        }
    }
    tracing::debug!("Client disconnected");
    Ok(())
}

/// Bind the daemon socket, replacing a stale one left by a previous run.
pub fn bind(path: &Path, mode: u32) -> Result<UnixListener, DaemonError> {
    let bind_err = |source: std::io::Error| DaemonError::Bind {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(bind_err)?;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed stale socket {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(bind_err(e)),
    }

    let listener = UnixListener::bind(path).map_err(bind_err)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(bind_err)?;
    Ok(listener)
}

/// Source of client connections for [`serve`].
pub trait Acceptor {
    fn accept_stream(&self) -> impl Future<Output = io::Result<tokio::net::UnixStream>> + Send;
}

impl Acceptor for UnixListener {
    async fn accept_stream(&self) -> io::Result<tokio::net::UnixStream> {
        self.accept().await.map(|(stream, _)| stream)
    }
}

/// Accept connections forever, each served on a blocking worker thread.
///
/// A failed accept is logged and retried after [`ACCEPT_BACKOFF`].
pub async fn serve<A: Acceptor + Send + Sync>(acceptor: A, daemon: SharedDaemon) {
    loop {
        let stream = match acceptor.accept_stream().await.and_then(|s| s.into_std()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Failed to accept connection: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping connection: {}", e);
            continue;
        }

        let daemon = daemon.clone();
        tokio::task::spawn_blocking(move || {
            tracing::debug!("Client connected");
            if let Err(e) = handle_connection(&daemon, stream) {
                tracing::warn!("Connection ended with error: {}", e);
            }
        });
    }
}
