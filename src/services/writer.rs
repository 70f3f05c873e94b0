use camino::Utf8Path;
use std::fs;
use std::io::{self, Write};
use tempfile::NamedTempFile;

/// Destination for rewritten file content.
///
/// Implementations must either replace the file completely or leave the
/// original untouched.
pub trait FileSink: Send + Sync {
    fn write(&self, path: &Utf8Path, content: &str) -> io::Result<()>;
}

/// Writes to a temp file in the target's directory, syncs it, then renames
/// it over the target. The temp file is removed if any step fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicFileSink;

impl FileSink for AtomicFileSink {
    fn write(&self, path: &Utf8Path, content: &str) -> io::Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;

        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(temp.path(), metadata.permissions())?;
        }

        temp.persist(path).map_err(|e| e.error)?;
        tracing::trace!("Replaced {}", path);
        Ok(())
    }
}
