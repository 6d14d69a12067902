use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// One line of a hunk body, tagged with its role in the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Removed(String),
    Added(String),
}

/// A single localized change: an anchor into each line sequence plus the
/// interleaved context/removed/added body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 0-based index into the original lines where the pattern begins.
    pub original_start: usize,
    /// 0-based index into the modified lines where the replacement begins.
    pub modified_start: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Number of original lines the hunk spans (context + removed).
    pub fn original_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Context(_) | HunkLine::Removed(_)))
            .count()
    }

    /// Number of modified lines the hunk produces (context + added).
    pub fn modified_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Context(_) | HunkLine::Added(_)))
            .count()
    }

    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            range_field(self.original_start, self.original_count()),
            range_field(self.modified_start, self.modified_count())
        )
    }
}

// 1-based in the text form, except that an empty range keeps the 0-based
// position (the line it would insert after), as in unified diffs.
fn range_field(start: usize, count: usize) -> String {
    let display_start = if count == 0 { start } else { start + 1 };
    format!("{},{}", display_start, count)
}

fn anchor_from(start: usize, count: usize) -> usize {
    if count == 0 { start } else { start.saturating_sub(1) }
}

/// A parsed patch document: the two path headers plus the ordered hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDocument {
    pub original_path: String,
    pub modified_path: String,
    pub hunks: Vec<Hunk>,
}

impl PatchDocument {
    pub fn new(
        original_path: impl Into<String>,
        modified_path: impl Into<String>,
        hunks: Vec<Hunk>,
    ) -> Self {
        PatchDocument {
            original_path: original_path.into(),
            modified_path: modified_path.into(),
            hunks,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("--- ");
        out.push_str(&self.original_path);
        out.push('\n');
        out.push_str("+++ ");
        out.push_str(&self.modified_path);
        out.push('\n');

        for hunk in &self.hunks {
            out.push_str(&hunk.header());
            out.push('\n');
            for line in &hunk.lines {
                let (prefix, text) = match line {
                    HunkLine::Context(text) => (' ', text),
                    HunkLine::Removed(text) => ('-', text),
                    HunkLine::Added(text) => ('+', text),
                };
                out.push(prefix);
                out.push_str(text);
                out.push('\n');
            }
        }
        out
    }

    pub fn parse(content: &str) -> Result<PatchDocument, ParseError> {
        let mut lines: Vec<&str> = content
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }

        if lines.len() < 2 {
            return Err(ParseError::new(1, "missing path headers"));
        }
        let original_path = lines[0]
            .strip_prefix("--- ")
            .ok_or_else(|| ParseError::new(1, "expected '--- ' header"))?;
        let modified_path = lines[1]
            .strip_prefix("+++ ")
            .ok_or_else(|| ParseError::new(2, "expected '+++ ' header"))?;

        let mut hunks = Vec::new();
        let mut index = 2;
        while index < lines.len() {
            let (old_start, old_count, new_start, new_count) = parse_hunk_header(lines[index])
                .ok_or_else(|| ParseError::new(index + 1, "malformed hunk header"))?;
            index += 1;

            let mut remaining_old = old_count;
            let mut remaining_new = new_count;
            let mut body = Vec::with_capacity(old_count + new_count);
            while remaining_old > 0 || remaining_new > 0 {
                let raw = *lines
                    .get(index)
                    .ok_or_else(|| ParseError::new(index + 1, "truncated hunk body"))?;
                if let Some(text) = raw.strip_prefix(' ') {
                    if remaining_old == 0 || remaining_new == 0 {
                        return Err(ParseError::new(index + 1, "context line overruns hunk counts"));
                    }
                    body.push(HunkLine::Context(text.to_string()));
                    remaining_old -= 1;
                    remaining_new -= 1;
                } else if let Some(text) = raw.strip_prefix('-') {
                    if remaining_old == 0 {
                        return Err(ParseError::new(index + 1, "removed line overruns hunk counts"));
                    }
                    body.push(HunkLine::Removed(text.to_string()));
                    remaining_old -= 1;
                } else if let Some(text) = raw.strip_prefix('+') {
                    if remaining_new == 0 {
                        return Err(ParseError::new(index + 1, "added line overruns hunk counts"));
                    }
                    body.push(HunkLine::Added(text.to_string()));
                    remaining_new -= 1;
                } else {
                    return Err(ParseError::new(index + 1, "unexpected line in hunk body"));
                }
                index += 1;
            }

            hunks.push(Hunk {
                original_start: anchor_from(old_start, old_count),
                modified_start: anchor_from(new_start, new_count),
                lines: body,
            });
        }

        Ok(PatchDocument::new(original_path, modified_path, hunks))
    }

    pub fn load(path: &Path) -> io::Result<PatchDocument> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_text())
    }
}

fn parse_hunk_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = line.strip_prefix("@@ -")?;
    let rest = rest.strip_suffix(" @@")?;
    let (old, new) = rest.split_once(" +")?;
    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;
    Some((old_start, old_count, new_start, new_count))
}

fn parse_range(field: &str) -> Option<(usize, usize)> {
    match field.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((field.parse().ok()?, 1)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        ParseError {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed patch document at line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn replace_b_document() -> PatchDocument {
        PatchDocument::new(
            "foo.txt",
            "foo.txt",
            vec![Hunk {
                original_start: 0,
                modified_start: 0,
                lines: vec![
                    HunkLine::Context("a".to_string()),
                    HunkLine::Removed("b".to_string()),
                    HunkLine::Added("B".to_string()),
                    HunkLine::Context("c".to_string()),
                ],
            }],
        )
    }

    #[test]
    fn serializes_headers_and_hunk() {
        let text = replace_b_document().to_text();
        assert_eq!(
            text,
            "--- foo.txt\n+++ foo.txt\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n"
        );
    }

    #[test]
    fn parse_roundtrips_serialization() {
        let document = replace_b_document();
        let parsed = PatchDocument::parse(&document.to_text()).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn roundtrips_multiple_hunks() {
        let document = PatchDocument::new(
            "src/a.txt",
            "src/a.txt",
            vec![
                Hunk {
                    original_start: 1,
                    modified_start: 1,
                    lines: vec![
                        HunkLine::Context("one".to_string()),
                        HunkLine::Added("one and a half".to_string()),
                        HunkLine::Context("two".to_string()),
                    ],
                },
                Hunk {
                    original_start: 9,
                    modified_start: 10,
                    lines: vec![
                        HunkLine::Removed("ten".to_string()),
                        HunkLine::Added("TEN".to_string()),
                    ],
                },
            ],
        );

        let parsed = PatchDocument::parse(&document.to_text()).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn roundtrips_empty_context_lines() {
        let document = PatchDocument::new(
            "a",
            "a",
            vec![Hunk {
                original_start: 0,
                modified_start: 0,
                lines: vec![
                    HunkLine::Context(String::new()),
                    HunkLine::Removed("x".to_string()),
                    HunkLine::Added("y".to_string()),
                ],
            }],
        );

        let parsed = PatchDocument::parse(&document.to_text()).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn roundtrips_insertion_into_empty_file() {
        let document = PatchDocument::new(
            "new.txt",
            "new.txt",
            vec![Hunk {
                original_start: 0,
                modified_start: 0,
                lines: vec![HunkLine::Added("only".to_string())],
            }],
        );

        let text = document.to_text();
        assert!(text.contains("@@ -0,0 +1,1 @@"));
        assert_eq!(PatchDocument::parse(&text).unwrap(), document);
    }

    #[test]
    fn header_counts_cover_context_and_changes() {
        let hunk = &replace_b_document().hunks[0];
        assert_eq!(hunk.original_count(), 3);
        assert_eq!(hunk.modified_count(), 3);
        assert_eq!(hunk.header(), "@@ -1,3 +1,3 @@");
    }

    #[test]
    fn rejects_missing_headers() {
        let result = PatchDocument::parse("@@ -1,1 +1,1 @@\n");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_hunk_header() {
        let result = PatchDocument::parse("--- a\n+++ a\n@@ nonsense @@\n");
        let err = result.unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn rejects_truncated_body() {
        let result = PatchDocument::parse("--- a\n+++ a\n@@ -1,2 +1,2 @@\n x\n");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_body_overrun() {
        let result = PatchDocument::parse("--- a\n+++ a\n@@ -1,1 +1,1 @@\n x\n-y\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_maps_parse_failure_to_invalid_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.patch");
        fs::write(&path, "not a patch").unwrap();

        let err = PatchDocument::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.patch");

        let document = replace_b_document();
        document.save(&path).unwrap();

        assert_eq!(PatchDocument::load(&path).unwrap(), document);
    }

    #[test]
    fn parse_tolerates_crlf_documents() {
        let text = "--- foo.txt\r\n+++ foo.txt\r\n@@ -1,1 +1,1 @@\r\n-a\r\n+b\r\n";
        let parsed = PatchDocument::parse(text).unwrap();
        assert_eq!(parsed.hunks.len(), 1);
        assert_eq!(
            parsed.hunks[0].lines,
            vec![
                HunkLine::Removed("a".to_string()),
                HunkLine::Added("b".to_string()),
            ]
        );
    }
}
