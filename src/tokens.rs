//! Zero-copy normalized token stream used by the clone engine (C5).
//!
//! Distinct from the syntax tree the walker (C2) consumes: comments and
//! whitespace are dropped, and the stream is stored structure-of-arrays so
//! the clone detectors can scan millions of tokens without per-token
//! allocation. Text is never copied — each token indexes into the shared
//! per-file source buffer.

use std::sync::Arc;

use crate::util::fnv1a_hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Literal,
    Operator,
    Punctuation,
    Unknown,
    /// Marks the boundary between two concatenated per-file token streams.
    FileBoundary,
}

impl TokenKind {
    fn as_byte(self) -> u8 {
        match self {
            Self::Keyword => 0,
            Self::Identifier => 1,
            Self::Literal => 2,
            Self::Operator => 3,
            Self::Punctuation => 4,
            Self::Unknown => 5,
            Self::FileBoundary => 6,
        }
    }

    fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Keyword,
            1 => Self::Identifier,
            2 => Self::Literal,
            3 => Self::Operator,
            4 => Self::Punctuation,
            5 => Self::Unknown,
            _ => Self::FileBoundary,
        }
    }
}

/// A single raw token before it is appended to a [`TokenStream`].
#[derive(Debug, Clone, Copy)]
pub struct RawToken {
    pub kind: TokenKind,
    pub offset: u32,
    pub length: u32,
    pub line: u32,
    pub column: u32,
}

/// Structure-of-arrays token stream over one or more concatenated files.
#[derive(Debug, Default)]
pub struct TokenStream {
    kind_byte: Vec<u8>,
    offset: Vec<u32>,
    length: Vec<u32>,
    line: Vec<u32>,
    column: Vec<u32>,
    /// Index into `sources`/`file_names` for each token; meaningless for
    /// `FileBoundary` tokens (set to the preceding file's id).
    file_id: Vec<u32>,
    sources: Vec<Arc<str>>,
    file_names: Vec<String>,
}

impl TokenStream {
    pub fn builder() -> TokenStreamBuilder {
        TokenStreamBuilder::default()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.kind_byte.len()
    }

    #[inline]
    pub fn kind(&self, i: usize) -> TokenKind {
        TokenKind::from_byte(self.kind_byte[i])
    }

    #[inline]
    pub fn offset(&self, i: usize) -> u32 {
        self.offset[i]
    }

    #[inline]
    pub fn length(&self, i: usize) -> u32 {
        self.length[i]
    }

    #[inline]
    pub fn line(&self, i: usize) -> u32 {
        self.line[i]
    }

    #[inline]
    pub fn column(&self, i: usize) -> u32 {
        self.column[i]
    }

    pub fn file_name(&self, i: usize) -> &str {
        &self.file_names[self.file_id[i] as usize]
    }

    /// The token's text, or `""` for a `FileBoundary` marker.
    pub fn text(&self, i: usize) -> &str {
        if self.kind(i) == TokenKind::FileBoundary {
            return "";
        }
        let src = &self.sources[self.file_id[i] as usize];
        let start = self.offset[i] as usize;
        let end = start + self.length[i] as usize;
        &src[start..end]
    }

    /// 64-bit FNV-1a hash over token kind bytes and textual bytes in `range`.
    pub fn hash_range(&self, range: std::ops::Range<usize>) -> u64 {
        let mut buf = Vec::new();
        for i in range {
            buf.push(self.kind_byte[i]);
            buf.extend_from_slice(self.text(i).as_bytes());
        }
        fnv1a_hash(&buf)
    }

    /// Byte-exact comparison of two equal-length windows (kinds and text).
    /// Returns `false` immediately on length mismatch.
    pub fn ranges_equal(&self, a: std::ops::Range<usize>, b: std::ops::Range<usize>) -> bool {
        if a.len() != b.len() {
            return false;
        }
        a.zip(b).all(|(i, j)| {
            self.kind_byte[i] == self.kind_byte[j] && self.text(i) == self.text(j)
        })
    }

    /// Whether any index in `range` is a `FileBoundary` marker.
    pub fn range_crosses_boundary(&self, range: std::ops::Range<usize>) -> bool {
        range.clone().any(|i| self.kind(i) == TokenKind::FileBoundary)
    }

    /// Contiguous token index interval for `file_name` intersecting
    /// `[lo, hi]` (1-indexed, inclusive source lines).
    pub fn tokens_in_line_range(
        &self,
        file_name: &str,
        lo: usize,
        hi: usize,
    ) -> std::ops::Range<usize> {
        let Some(file_id) = self.file_names.iter().position(|f| f == file_name) else {
            return 0..0;
        };
        let file_id = file_id as u32;
        let mut start = None;
        let mut end = 0;
        for i in 0..self.count() {
            if self.file_id[i] != file_id || self.kind(i) == TokenKind::FileBoundary {
                continue;
            }
            let l = self.line[i] as usize;
            if l >= lo && l <= hi {
                if start.is_none() {
                    start = Some(i);
                }
                end = i + 1;
            }
        }
        start.map(|s| s..end).unwrap_or(0..0)
    }
}

/// Builds a [`TokenStream`] by appending one file's tokens at a time,
/// inserting a `FileBoundary` marker between files.
#[derive(Default)]
pub struct TokenStreamBuilder {
    stream: TokenStream,
}

impl TokenStreamBuilder {
    pub fn push_file(&mut self, file_name: impl Into<String>, source: Arc<str>, tokens: &[RawToken]) {
        if !self.stream.kind_byte.is_empty() {
            self.push_boundary();
        }
        let file_id = self.stream.sources.len() as u32;
        self.stream.file_names.push(file_name.into());
        self.stream.sources.push(source);

        for t in tokens {
            self.stream.kind_byte.push(t.kind.as_byte());
            self.stream.offset.push(t.offset);
            self.stream.length.push(t.length);
            self.stream.line.push(t.line);
            self.stream.column.push(t.column);
            self.stream.file_id.push(file_id);
        }
    }

    fn push_boundary(&mut self) {
        let last_file = *self.stream.file_id.last().unwrap_or(&0);
        self.stream.kind_byte.push(TokenKind::FileBoundary.as_byte());
        self.stream.offset.push(0);
        self.stream.length.push(0);
        self.stream.line.push(0);
        self.stream.column.push(0);
        self.stream.file_id.push(last_file);
    }

    pub fn build(self) -> TokenStream {
        self.stream
    }
}
