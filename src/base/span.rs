//! Source text positions and ranges.

use std::cmp::Ordering;
use std::fmt;

pub use text_size::TextRange;
pub use text_size::TextSize;

use super::FileId;

/// A line and column position in source text.
///
/// Both are 0-indexed; column counts UTF-8 bytes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// 1-indexed line number (for display).
    #[inline]
    pub const fn line_one_indexed(self) -> u32 {
        self.line + 1
    }

    /// 1-indexed column number (for display).
    #[inline]
    pub const fn col_one_indexed(self) -> u32 {
        self.col + 1
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.col_one_indexed())
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.col_one_indexed())
    }
}

/// Index for converting between byte offsets and line/column positions.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert a byte offset to a line/column position.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    /// Convert a line/column position to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let line_start = self.line_starts.get(line_col.line as usize)?;
        Some(*line_start + TextSize::from(line_col.col))
    }

    /// Total length of the indexed text.
    pub fn text_len(&self) -> TextSize {
        self.len
    }

    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }
}

/// A range inside one parsed file.
///
/// This is the session-wide position type: spans order first by file
/// (parse order) and then by offset, which is the order usages are reported
/// in.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Span {
    pub file: FileId,
    pub range: TextRange,
}

impl Span {
    #[inline]
    pub const fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }

    #[inline]
    pub fn start(self) -> TextSize {
        self.range.start()
    }

    #[inline]
    pub fn end(self) -> TextSize {
        self.range.end()
    }

    /// Whether `pos` lies inside the span, end inclusive.
    ///
    /// A cursor placed right after the last character of an identifier
    /// still selects it.
    pub fn contains_pos(self, pos: FilePos) -> bool {
        self.file == pos.file && self.range.start() <= pos.offset && pos.offset <= self.range.end()
    }

    pub fn start_pos(self) -> FilePos {
        FilePos::new(self.file, self.range.start())
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.file, self.range.start(), self.range.end()).cmp(&(
            other.file,
            other.range.start(),
            other.range.end(),
        ))
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.file, self.range)
    }
}

/// A single byte position inside one parsed file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct FilePos {
    pub file: FileId,
    pub offset: TextSize,
}

impl FilePos {
    #[inline]
    pub const fn new(file: FileId, offset: TextSize) -> Self {
        Self { file, offset }
    }
}
