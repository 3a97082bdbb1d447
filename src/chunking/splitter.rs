use super::{Chunk, ChunkingConfig};
use crate::error::Result;
use std::collections::VecDeque;
use tracing::debug;

/// Separators tried in order, from paragraph breaks down to single characters.
const SEPARATORS: &[&str] = &[
    "\n\n", // Paragraph break
    "\n",   // Line break
    " ",    // Word boundary
    "",     // Character by character
];

/// Recursive character splitter.
///
/// Text is split on the coarsest separator it contains. Pieces that still
/// exceed the window are split again with the finer separators, and small
/// pieces are merged back into windows of at most `chunk_size` characters
/// that share roughly `chunk_overlap` characters with their predecessor.
/// Separators stay attached to the start of the piece that follows them.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        })
    }

    /// Split `text` into ordered, trimmed chunks.
    ///
    /// Whitespace-only input yields no chunks. The same input always yields
    /// the same chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let pieces = self.split_recursive(text, SEPARATORS);

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut previous_offset: usize = 0;
        let mut previous_len: usize = 0;

        for (index, piece) in pieces.into_iter().enumerate() {
            let search_from = (previous_offset + previous_len).saturating_sub(self.chunk_overlap);
            let offset = find_from(text, &piece, search_from).unwrap_or(previous_offset);
            previous_offset = offset;
            previous_len = piece.chars().count();
            chunks.push(Chunk::new(index, piece, offset));
        }

        debug!(
            "Split {} characters into {} chunks",
            text.chars().count(),
            chunks.len()
        );
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, remaining) = choose_separator(text, separators);

        let mut chunks = Vec::new();
        let mut small = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }

        chunks
    }

    /// Merge small pieces into windows, carrying an overlap tail forward.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut windows = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                push_joined(&mut windows, &current);

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            current.push_back((piece, len));
            total += len;
        }

        push_joined(&mut windows, &current);
        windows
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_joined(windows: &mut Vec<String>, current: &VecDeque<(&str, usize)>) {
    let joined: String = current.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        windows.push(trimmed.to_string());
    }
}

/// The first separator present in `text`, and the finer separators after it.
/// The empty separator always matches.
fn choose_separator<'s>(text: &str, separators: &'s [&'s str]) -> (&'s str, &'s [&'s str]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (*separator, &[]);
        }
        if text.contains(separator) {
            return (*separator, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on `separator`, attaching each separator to the piece after it.
/// Empty pieces are dropped; the empty separator splits into characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (position, _) in text.match_indices(separator) {
        pieces.push(&text[start..position]);
        start = position;
    }
    pieces.push(&text[start..]);
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

/// Character offset of `needle` in `haystack`, searching from a character offset.
fn find_from(haystack: &str, needle: &str, from_char: usize) -> Option<usize> {
    let from_byte = haystack
        .char_indices()
        .nth(from_char)
        .map(|(i, _)| i)
        .unwrap_or(haystack.len());
    let byte = haystack[from_byte..].find(needle)? + from_byte;
    Some(char_len(&haystack[..byte]))
}
