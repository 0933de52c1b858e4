//! Model block location with nesting-aware delimiter tracking
//!
//! A naive `model X {[^}]*}` pattern breaks as soon as a default value or a
//! comment contains a brace, so block spans are derived by walking the text
//! and tracking brace depth while skipping string literals and `//` comments.

use regex::Regex;
use thiserror::Error;

use crate::edit::Span;

/// Errors from block-boundary computation
#[derive(Error, Debug)]
pub enum StructureError {
    #[error("Unbalanced block delimiters near offset {offset}")]
    Imbalanced { offset: usize },
}

/// A named model block derived from the current buffer.
///
/// Blocks are views, not stored state: any edit to the buffer invalidates
/// previously computed blocks, so callers re-locate after every rewrite.
#[derive(Debug, Clone)]
pub struct Block {
    /// The model name as written in the header
    pub name: String,
    /// The whole block, `model Name {` through the closing `}`
    pub span: Span,
    /// The interior between the braces
    pub body: Span,
}

impl Block {
    /// The interior text of this block
    pub fn body_text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.body.start..self.body.end]
    }
}

/// Locate the block for `name`, or `None` if no such model exists.
///
/// The closing brace is found by depth tracking from the opening brace,
/// ignoring braces inside double-quoted strings and `//` comments.
pub fn find_block(source: &str, name: &str) -> Result<Option<Block>, StructureError> {
    let header = Regex::new(&format!(r"(?m)^model[ \t]+{}[ \t]*\{{", regex::escape(name)))
        .expect("valid header pattern");

    let m = match header.find(source) {
        Some(m) => m,
        None => return Ok(None),
    };

    // m ends on the opening brace
    let open = m.end() - 1;
    match scan_to_close(source, open) {
        Some(close) => Ok(Some(Block {
            name: name.to_string(),
            span: Span::new(m.start(), close + 1),
            body: Span::new(open + 1, close),
        })),
        None => Err(StructureError::Imbalanced { offset: m.start() }),
    }
}

/// Verify every block delimiter in the buffer is balanced.
///
/// Run after each rule so a rewrite that breaks block structure is caught
/// immediately instead of corrupting later, block-scoped rules.
pub fn check_balance(source: &str) -> Result<(), StructureError> {
    let mut depth: i64 = 0;
    let mut last_open = 0usize;

    for (offset, event) in DelimiterScan::new(source, 0) {
        match event {
            Delimiter::Open => {
                depth += 1;
                last_open = offset;
            }
            Delimiter::Close => {
                depth -= 1;
                if depth < 0 {
                    return Err(StructureError::Imbalanced { offset });
                }
            }
        }
    }

    if depth != 0 {
        return Err(StructureError::Imbalanced { offset: last_open });
    }

    Ok(())
}

/// Given the offset of an opening brace, return the offset of its match.
fn scan_to_close(source: &str, open: usize) -> Option<usize> {
    let mut depth: i64 = 0;

    for (offset, event) in DelimiterScan::new(source, open) {
        match event {
            Delimiter::Open => depth += 1,
            Delimiter::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset);
                }
            }
        }
    }

    None
}

enum Delimiter {
    Open,
    Close,
}

/// Iterator over significant braces, skipping strings and line comments
struct DelimiterScan<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DelimiterScan<'a> {
    fn new(source: &'a str, start: usize) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: start,
        }
    }
}

impl Iterator for DelimiterScan<'_> {
    type Item = (usize, Delimiter);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let i = self.pos;
            let c = self.bytes[i];
            self.pos += 1;

            match c {
                b'"' => {
                    // consume the string literal, honoring escapes
                    while self.pos < self.bytes.len() {
                        match self.bytes[self.pos] {
                            b'\\' => self.pos += 2,
                            b'"' => {
                                self.pos += 1;
                                break;
                            }
                            _ => self.pos += 1,
                        }
                    }
                }
                b'/' if self.bytes.get(self.pos) == Some(&b'/') => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                b'{' => return Some((i, Delimiter::Open)),
                b'}' => return Some((i, Delimiter::Close)),
                _ => {}
            }
        }

        None
    }
}
