// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ownership, mode and security label normalization of the image storage.

use crate::config::{SwitcherConfig, IMAGE_DIR_MODE, NOMEDIA_FILE};
use crate::error::PermissionError;
use std::ffi::{CStr, CString};
use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use walkdir::WalkDir;

/// xattr holding the SELinux context of a path.
pub const SELINUX_XATTR: &CStr = c"security.selinux";

/// Filesystem primitives used by [`fix_permissions`].
///
/// Recursive operations never follow symlinks.
pub trait PermissionOps: Send + Sync {
    fn create_empty_file(&self, path: &Path) -> io::Result<()>;
    fn chown_recursive(&self, path: &Path, uid: u32, gid: u32) -> io::Result<()>;
    fn chmod_recursive(&self, path: &Path, mode: u32) -> io::Result<()>;
    fn get_label(&self, path: &Path) -> io::Result<String>;
    fn set_label_recursive(&self, path: &Path, label: &str) -> io::Result<()>;
}

/// [`PermissionOps`] on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPermissions;

/// Visit `path` and everything below it without following any symlink,
/// the root included.
fn walk(path: &Path, mut f: impl FnMut(&Path, fs::FileType) -> io::Result<()>) -> io::Result<()> {
    let walker = WalkDir::new(path).follow_links(false).follow_root_links(false);
    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        f(entry.path(), entry.file_type())?;
    }
    Ok(())
}

fn c_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"))
}

impl PermissionOps for LinuxPermissions {
    fn create_empty_file(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new().write(true).create(true).open(path).map(drop)
    }

    fn chown_recursive(&self, path: &Path, uid: u32, gid: u32) -> io::Result<()> {
        walk(path, |p, _| std::os::unix::fs::lchown(p, Some(uid), Some(gid)))
    }

    fn chmod_recursive(&self, path: &Path, mode: u32) -> io::Result<()> {
        walk(path, |p, file_type| {
            if file_type.is_symlink() {
                return Ok(());
            }
            fs::set_permissions(p, fs::Permissions::from_mode(mode))
        })
    }

    fn get_label(&self, path: &Path) -> io::Result<String> {
        let c_path = c_path(path)?;
        let name = SELINUX_XATTR;

        let size = unsafe { libc::lgetxattr(c_path.as_ptr(), name.as_ptr(), std::ptr::null_mut(), 0) };
        if size < 0 {
            return Err(io::Error::last_os_error());
        }

        let mut buf = vec![0u8; size as usize];
        let read = unsafe {
            libc::lgetxattr(
                c_path.as_ptr(),
                name.as_ptr(),
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
            )
        };
        if read < 0 {
            return Err(io::Error::last_os_error());
        }
        buf.truncate(read as usize);

        // Stored with a trailing NUL.
        while buf.last() == Some(&0) {
            buf.pop();
        }
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn set_label_recursive(&self, path: &Path, label: &str) -> io::Result<()> {
        let name = SELINUX_XATTR;
        let value = CString::new(label)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "label contains NUL byte"))?;
        let value = value.as_bytes_with_nul();

        walk(path, |p, _| {
            let c_path = c_path(p)?;
            let ret = unsafe {
                libc::lsetxattr(
                    c_path.as_ptr(),
                    name.as_ptr(),
                    value.as_ptr() as *const libc::c_void,
                    value.len(),
                    0,
                )
            };
            if ret < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        })
    }
}

/// Normalize the shared image storage so the app side can use it.
///
/// 1. Create `.nomedia` (failure logged only).
/// 2. Recursively chown to the media identity.
/// 3. Recursively chmod to `0775`.
/// 4. Recursively copy the security label of the reference path, if it has one.
///
/// Safe to run repeatedly.
pub fn fix_permissions(ops: &dyn PermissionOps, config: &SwitcherConfig) -> Result<(), PermissionError> {
    let root = config.multiboot_dir.as_path();

    if let Err(e) = ops.create_empty_file(&root.join(NOMEDIA_FILE)) {
        tracing::warn!("{:?}: Failed to create {}: {}", root, NOMEDIA_FILE, e);
    }

    ops.chown_recursive(root, config.media_uid, config.media_gid)
        .map_err(|source| {
            tracing::error!("Failed to chown {:?}: {}", root, source);
            PermissionError::Chown {
                path: root.to_path_buf(),
                source,
            }
        })?;

    ops.chmod_recursive(root, IMAGE_DIR_MODE).map_err(|source| {
        tracing::error!("Failed to chmod {:?}: {}", root, source);
        PermissionError::Chmod {
            path: root.to_path_buf(),
            source,
        }
    })?;

    let label = match ops.get_label(&config.label_reference) {
        Ok(label) => label,
        Err(e) => {
            tracing::debug!("{:?}: No security label to copy: {}", config.label_reference, e);
            return Ok(());
        }
    };

    ops.set_label_recursive(root, &label).map_err(|source| {
        tracing::error!("{:?}: Failed to set context to {}: {}", root, label, source);
        PermissionError::Label {
            path: root.to_path_buf(),
            label,
            source,
        }
    })
}
