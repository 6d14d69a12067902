use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Directories never treated as part of a source tree.
pub const EXCLUDED_DIRECTORIES: [&str; 5] = [".git", ".vs", ".idea", "bin", "obj"];

/// Whether a relative path has a component on the exclusion list.
pub fn is_excluded(relative_path: &str) -> bool {
    relative_path
        .split('/')
        .any(|component| EXCLUDED_DIRECTORIES.contains(&component))
}

fn relative_to(root: &Path, path: &Path) -> io::Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

/// Every file under `root`, as `(full path, relative path)` pairs with
/// `/`-separated relative paths, in sorted order.
pub fn enumerate_files(root: &Path) -> io::Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_to(root, entry.path())?;
        files.push((entry.path().to_path_buf(), relative));
    }
    Ok(files)
}

/// Like [`enumerate_files`], but skips excluded directories entirely.
pub fn enumerate_source_files(root: &Path) -> io::Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter();
    for entry in walker.filter_entry(|e| {
        e.depth() == 0 || !EXCLUDED_DIRECTORIES.contains(&e.file_name().to_string_lossy().as_ref())
    }) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_to(root, entry.path())?;
        files.push((entry.path().to_path_buf(), relative));
    }
    Ok(files)
}

pub fn create_parent_directory(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Copy `from` to `to`, creating parent directories and overwriting any
/// existing file.
pub fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    create_parent_directory(to)?;
    fs::copy(from, to)?;
    Ok(())
}

pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove directories under `root` that contain no files, depth-first.
/// A directory survives if any descendant holds a file. The root itself
/// is never removed.
pub fn delete_empty_directories(root: &Path) -> io::Result<()> {
    if !root.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            remove_if_empty(&entry.path())?;
        }
    }
    Ok(())
}

fn remove_if_empty(dir: &Path) -> io::Result<bool> {
    let mut empty = true;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            empty &= remove_if_empty(&entry.path())?;
        } else {
            empty = false;
        }
    }
    if empty {
        fs::remove_dir(dir)?;
    }
    Ok(empty)
}
