// file: src/utils/fs.rs
// version: 1.0.0
// guid: 2f6c8a17-d3e9-4b50-97a4-c81e05f3b6d2

//! Local filesystem checks for staged artifacts

use std::path::Path;
use tracing::warn;

/// Whether a local path exists. Permission and other stat errors count as absent.
pub fn exists<P: AsRef<Path>>(path: P) -> bool {
    match std::fs::metadata(path.as_ref()) {
        Ok(_) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Cannot stat {}: {}", path.as_ref().display(), e);
            false
        }
    }
}
