use indicatif::ProgressBar;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ComposeError;
use crate::vfs::{Node, VirtualTree};

/// ENOSPC on Unix
const NO_SPACE_LEFT: i32 = 28;

fn is_disk_full(e: &io::Error) -> bool {
    e.raw_os_error() == Some(NO_SPACE_LEFT)
}

/// Create a directory and its parents
pub fn create_dir(path: &Path) -> Result<(), ComposeError> {
    fs::create_dir_all(path).map_err(|e| {
        if is_disk_full(&e) {
            return ComposeError::DiskFull {
                path: path.to_path_buf(),
            };
        }
        ComposeError::CreateDirFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Write a single file, creating its parent directory if needed
pub fn write_file(dst: &Path, content: &[u8]) -> Result<u64, ComposeError> {
    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            create_dir(parent)?;
        }
    }

    fs::write(dst, content).map_err(|e| {
        if is_disk_full(&e) {
            return ComposeError::DiskFull {
                path: dst.to_path_buf(),
            };
        }
        ComposeError::WriteFailed {
            path: dst.to_path_buf(),
            source: e,
        }
    })?;

    Ok(content.len() as u64)
}

/// Target location of a virtual path below `dst`
pub fn output_path(dst: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(dst.to_path_buf(), |path, part| path.join(part))
}

/// Write every entry of `tree` below `dst`, returns (files_written, bytes_written)
pub fn export_tree(
    tree: &VirtualTree,
    dst: &Path,
    shutdown: &AtomicBool,
    progress: Option<&ProgressBar>,
) -> Result<(u64, u64), ComposeError> {
    let mut files_written = 0u64;
    let mut bytes_written = 0u64;

    create_dir(dst)?;

    // Entries come parents first, so directories exist before their files
    for (relative, node) in tree.entries() {
        if shutdown.load(Ordering::Relaxed) {
            return Err(ComposeError::Cancelled);
        }

        let target = output_path(dst, relative);
        match node {
            Node::Dir => create_dir(&target)?,
            Node::File(content) => {
                bytes_written += write_file(&target, content)?;
                files_written += 1;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
            }
        }
    }

    Ok((files_written, bytes_written))
}
