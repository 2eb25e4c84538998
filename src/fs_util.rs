use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::EnaError;

/// Write a file atomically: the content goes to a sibling temp file first and
/// is persisted into place, so a failed run never leaves a truncated output.
pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), EnaError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| EnaError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("ena-sub")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| EnaError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| EnaError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| EnaError::Filesystem(err.to_string()))?;
    Ok(())
}

/// Recursively list all files under `root`.
pub fn walk_files(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, EnaError> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries =
            fs::read_dir(dir.as_std_path()).map_err(|err| EnaError::Filesystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| EnaError::Filesystem(err.to_string()))?;
            let path = Utf8PathBuf::from_path_buf(entry.path())
                .map_err(|path| EnaError::Filesystem(format!("non-UTF-8 path: {}", path.display())))?;
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
