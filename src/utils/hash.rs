use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Digest of a file's full byte content, used to decide whether a
/// binary file changed when its size did not.
pub fn file_digest(path: &Path) -> io::Result<String> {
    let data = fs::read(path)?;
    Ok(content_digest(&data))
}
