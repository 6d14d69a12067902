use std::fs;
use std::io;
use std::path::Path;

/// Split text into lines, normalizing `\r\n` and bare `\r` endings to `\n`.
/// A trailing newline does not produce an empty final line.
pub fn split_lines(content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }

    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = normalized.split('\n').map(String::from).collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Join lines back into file content. Non-empty sequences get a trailing
/// newline; an empty sequence is an empty file.
pub fn join_lines(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(split_lines(&content))
}

pub fn write_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    fs::write(path, join_lines(lines))
}
