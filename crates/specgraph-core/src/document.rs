//! # Loaded Documents
//!
//! A [`Document`] is the raw text of one markdown file plus a precomputed
//! table of line-start offsets, so that any byte offset found by a scanner
//! can be turned into a 1-based line number with a binary search.

use crate::path::DocPath;

/// One markdown file, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Document {
    /// Repository-relative location.
    pub path: DocPath,
    /// Full file contents.
    pub raw_text: String,
    /// Byte offset of the first character of every line.
    pub line_offsets: Vec<usize>,
}

impl Document {
    /// Build a document, computing its line table.
    pub fn new(path: DocPath, raw_text: String) -> Self {
        let mut line_offsets = vec![0];
        line_offsets.extend(
            raw_text
                .char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| i + 1)
                .filter(|&i| i < raw_text.len()),
        );
        Self {
            path,
            raw_text,
            line_offsets,
        }
    }

    /// The 1-based line number containing `offset`.
    pub fn line_at(&self, offset: usize) -> usize {
        match self.line_offsets.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Number of lines in the document (a trailing newline does not start a new line).
    pub fn line_count(&self) -> usize {
        if self.raw_text.is_empty() {
            0
        } else {
            self.line_offsets.len()
        }
    }

    /// Iterate `(line_number, line_text)` pairs, 1-based, without line terminators.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.raw_text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new(DocPath::new("README.md").unwrap(), text.to_string())
    }

    #[test]
    fn line_at_maps_offsets() {
        let d = doc("# Title\nbody\n\nlast");
        assert_eq!(d.line_at(0), 1);
        assert_eq!(d.line_at(3), 1);
        assert_eq!(d.line_at(8), 2);
        assert_eq!(d.line_at(13), 3);
        assert_eq!(d.line_at(14), 4);
    }

    #[test]
    fn line_count_ignores_trailing_newline() {
        assert_eq!(doc("a\nb\n").line_count(), 2);
        assert_eq!(doc("a\nb").line_count(), 2);
        assert_eq!(doc("").line_count(), 0);
    }

    #[test]
    fn lines_are_one_based() {
        let d = doc("first\nsecond\r\nthird");
        let lines: Vec<_> = d.lines().collect();
        assert_eq!(lines, vec![(1, "first"), (2, "second"), (3, "third")]);
    }

    #[test]
    fn line_offsets_agree_with_lines() {
        let d = doc("x\nyy\nzzz\n");
        for (number, text) in d.lines() {
            let start = d.line_offsets[number - 1];
            assert!(d.raw_text[start..].starts_with(text));
            assert_eq!(d.line_at(start), number);
        }
    }
}
