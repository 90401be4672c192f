//! Source spans and line/column conversion
//!
//! Spans are half-open byte ranges into the source text. Every boundary that
//! talks in lines and columns (LSP, terminal output) goes through [`LineIndex`].
//! Columns are byte offsets within their line.

use serde::{Deserialize, Serialize};

/// Byte range in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at an offset
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Placeholder span for synthesized nodes
    pub fn dummy() -> Self {
        Self::new(0, 0)
    }

    /// Smallest span covering both spans
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a cursor offset lies within the span.
    ///
    /// The end is inclusive so that a cursor placed right after an
    /// identifier still hits it.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Zero-based line/column position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Precomputed line starts for offset/position conversion
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Number of lines (a trailing newline opens an empty last line)
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a line/column position, clamping past the end
    pub fn line_col(&self, offset: usize) -> LineCol {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        LineCol {
            line: line as u32,
            col: (offset - self.line_starts[line]) as u32,
        }
    }

    /// Convert a line/column position back to a byte offset.
    ///
    /// Columns past the end of the line clamp to the line end; lines past the
    /// end of the text yield `None`.
    pub fn offset(&self, pos: LineCol) -> Option<usize> {
        let line = pos.line as usize;
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        Some((start + pos.col as usize).min(end))
    }

    /// Byte range of a line, excluding its newline
    pub fn line_span(&self, line: u32) -> Option<Span> {
        let line = line as usize;
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        Some(Span::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_len() {
        let span = Span::new(4, 8).merge(Span::new(2, 5));
        assert_eq!(span, Span::new(2, 8));
        assert_eq!(span.len(), 6);
        assert!(Span::point(3).is_empty());
    }

    #[test]
    fn test_contains_offset_inclusive_end() {
        let span = Span::new(4, 7);
        assert!(span.contains_offset(4));
        assert!(span.contains_offset(7));
        assert!(!span.contains_offset(8));
        assert!(!span.contains_offset(3));
    }

    #[test]
    fn test_line_col_roundtrip_multiline() {
        let text = "int a;\nint b;\n\nint c;";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 4);

        let offset = text.find('c').unwrap();
        let pos = index.line_col(offset);
        assert_eq!(pos, LineCol { line: 3, col: 4 });
        assert_eq!(index.offset(pos), Some(offset));
    }

    #[test]
    fn test_offset_clamps_column() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset(LineCol { line: 0, col: 99 }), Some(2));
        assert_eq!(index.offset(LineCol { line: 5, col: 0 }), None);
    }

    #[test]
    fn test_line_span() {
        let index = LineIndex::new("int a;\n  b = 1;\n");
        assert_eq!(index.line_span(1), Some(Span::new(7, 15)));
        assert_eq!(index.line_span(2), Some(Span::new(16, 16)));
    }
}
