//! Document store: reading and atomically replacing registry files
//!
//! Reads go through a single no-follow open so a symlink planted at the
//! document path is rejected without a check-then-open race. Writes land in
//! a temporary file beside the target and are renamed over it, so readers
//! observe either the old or the new document and never a partial one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::document::{RegistryDocument, StyledDocument};
use crate::error::{DocumentError, RegistryError, Result};
use crate::patterns::DEFAULT_FILE_MODE;

/// Open `path` for reading, refusing to follow a symlink at the final component
pub fn open_nofollow(path: &Path) -> std::result::Result<File, DocumentError> {
    let mut options = OpenOptions::new();
    options.read(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NOFOLLOW);
    }

    #[cfg(not(unix))]
    if fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink()) {
        return Err(DocumentError::SymlinkRejected {
            path: path.to_path_buf(),
        });
    }

    options.open(path).map_err(|source| {
        #[cfg(unix)]
        if source.raw_os_error() == Some(libc::ELOOP) {
            return DocumentError::SymlinkRejected {
                path: path.to_path_buf(),
            };
        }
        DocumentError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Read the whole document as UTF-8 text
pub fn read_text(path: &Path) -> std::result::Result<String, DocumentError> {
    let mut file = open_nofollow(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    String::from_utf8(bytes).map_err(|_| DocumentError::InvalidUtf8 {
        path: path.to_path_buf(),
    })
}

/// Load a document as plain data
pub fn load(path: &Path) -> std::result::Result<RegistryDocument, DocumentError> {
    let text = read_text(path)?;
    let document = RegistryDocument::parse(&text, path)?;
    debug!(path = %path.display(), "loaded registry document");
    Ok(document)
}

/// Load a document keeping its text for in-place edits
pub fn load_styled(path: &Path) -> std::result::Result<StyledDocument, DocumentError> {
    let text = read_text(path)?;
    let document = StyledDocument::parse(&text, path)?;
    debug!(path = %path.display(), "loaded registry document for editing");
    Ok(document)
}

/// Persist an edited document over `path`
pub fn save(path: &Path, document: &StyledDocument) -> Result<()> {
    write_atomic(path, document.render().as_bytes())
}

/// Replace `path` with `contents` via a temporary file and a rename
///
/// The permission bits of the file being replaced carry over to the new
/// file; a file that did not exist before gets `0644`. A symlink at `path`
/// is rejected.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    replace_with(path, contents, |temp, target| {
        temp.persist(target).map(|_| ()).map_err(|err| err.error)
    })
}

fn replace_with<F>(path: &Path, contents: &[u8], commit: F) -> Result<()>
where
    F: FnOnce(NamedTempFile, &Path) -> io::Result<()>,
{
    let save_error = |source: io::Error| RegistryError::Save {
        path: path.to_path_buf(),
        source,
    };

    let dir = parent_dir(path);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let mode = existing_mode(path)?.unwrap_or(DEFAULT_FILE_MODE);

    // Dropping the temp file on any early return removes it.
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(save_error)?;
    temp.as_file_mut().write_all(contents).map_err(save_error)?;
    set_mode(temp.path(), mode).map_err(save_error)?;
    temp.as_file().sync_all().map_err(save_error)?;

    commit(temp, path).map_err(save_error)?;
    sync_dir(&dir);

    debug!(path = %path.display(), bytes = contents.len(), mode = format!("{mode:o}"), "replaced file atomically");
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Permission bits of the file about to be replaced, if it exists
///
/// The file is opened without following symlinks, so a symlink planted at
/// the target is refused instead of being replaced.
fn existing_mode(path: &Path) -> Result<Option<u32>> {
    match open_nofollow(path) {
        Ok(file) => Ok(file.metadata().ok().and_then(|meta| permission_bits(&meta))),
        Err(err @ DocumentError::SymlinkRejected { .. }) => Err(err.into()),
        Err(_) => Ok(None),
    }
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    meta.is_file().then(|| meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn permission_bits(_meta: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Flush the directory entry of the rename; failures are not fatal
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Ok(handle) = File::open(dir) {
        if let Err(err) = handle.sync_all() {
            debug!(dir = %dir.display(), error = %err, "directory sync failed");
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}
