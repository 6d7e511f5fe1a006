// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::{PropsError, Result};
use rustc_hash::FxHashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Flat key/value view of a property file. Key order carries no meaning.
pub type Properties = FxHashMap<String, String>;

/// Ownership and mode applied to a freshly persisted property file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOptions {
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
    /// Mode for parent directories created on the way.
    pub dir_mode: u32,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            uid: 0,
            gid: 0,
            mode: 0o700,
            dir_mode: 0o755,
        }
    }
}

/// Parse property text.
///
/// Blank lines and lines starting with `#` are skipped. The key ends at the
/// first `=`; everything after it is the value, kept verbatim. Lines with no
/// `=` are ignored.
pub fn parse(text: &str) -> Properties {
    let mut props = Properties::default();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match trimmed.split_once('=') {
            Some((key, value)) => {
                props.insert(key.trim_end().to_string(), value.to_string());
            }
            None => {
                tracing::warn!("Ignoring property line {} without '=': {:?}", lineno + 1, line);
            }
        }
    }

    props
}

/// Read and parse the property file at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Properties> {
    let text = fs::read_to_string(path)?;
    Ok(parse(&text))
}

/// Render properties as text, sorted by key so output is reproducible.
pub fn serialize(props: &Properties) -> String {
    let mut entries: Vec<(&String, &String)> = props.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

fn tmp_path_for(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| PropsError::InvalidPath(path.to_path_buf()))?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

/// Replace the property file at `path` with `props`.
///
/// The new contents go to `<path>.tmp`, which is chowned, chmodded, synced
/// and then renamed over `path`. Failures to create parent directories or to
/// apply ownership and mode are logged and tolerated; failure to write or
/// rename is returned.
pub fn persist(path: impl AsRef<Path>, props: &Properties, opts: PersistOptions) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = tmp_path_for(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::DirBuilder::new()
                .recursive(true)
                .mode(opts.dir_mode)
                .create(parent)
            {
                tracing::warn!("{:?}: Failed to create parent directory: {}", parent, e);
            }
        }
    }

    match fs::remove_file(&tmp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("{:?}: Failed to remove stale file: {}", tmp_path, e),
    }

    let write_err = |source: io::Error| PropsError::Write {
        path: path.to_path_buf(),
        source,
    };

    {
        let mut file: File = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(opts.mode)
            .open(&tmp_path)
            .map_err(write_err)?;

        if let Err(e) = std::os::unix::fs::fchown(&file, Some(opts.uid), Some(opts.gid)) {
            tracing::warn!("{:?}: Failed to chown file: {}", tmp_path, e);
        }
        // The creation mode is filtered by the umask; set it explicitly.
        if let Err(e) = file.set_permissions(fs::Permissions::from_mode(opts.mode)) {
            tracing::warn!("{:?}: Failed to chmod file: {}", tmp_path, e);
        }

        file.write_all(serialize(props).as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
    }

    fs::rename(&tmp_path, path).map_err(write_err)?;
    Ok(())
}
