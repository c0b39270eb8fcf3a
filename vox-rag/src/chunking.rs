//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text hierarchically: paragraphs, lines, sentence punctuation,
//! commas, words, and finally single characters. Sizes are measured in
//! characters, never bytes, so multi-byte text is never cut mid-codepoint.
//!
//! Chunkers return [`TextSpan`]s (byte ranges into the input) rather than
//! owned strings. Consecutive spans always touch or overlap, which makes the
//! split lossless: walking the spans in order and appending the part of each
//! span not yet covered reproduces the input exactly.

use std::collections::VecDeque;

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Boundary preference, best first. The empty separator is the character cut.
pub const DEFAULT_SEPARATORS: [&str; 8] = ["\n\n", "\n", ".", "!", "?", ",", " ", ""];

/// A byte range `[start, end)` into the text that was split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    /// Borrow the spanned text out of the string it was produced from.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    fn char_len(&self, text: &str) -> usize {
        self.slice(text).chars().count()
    }
}

/// A strategy for splitting text into chunk-sized spans.
pub trait Chunker: Send + Sync {
    /// Split `text` into ordered spans.
    ///
    /// Returns an empty `Vec` for empty text.
    fn split(&self, text: &str) -> Vec<TextSpan>;
}

/// Splits text recursively, preferring the coarsest boundary that fits.
///
/// The first separator of the ladder that occurs in the text is used to cut
/// it into pieces, each keeping its separator at the end. Pieces that fit are
/// merged greedily into windows of at most `chunk_size` characters; when a
/// window is emitted, the next one starts with as many trailing whole pieces
/// as fit in `chunk_overlap`. Pieces that are still too large are split again
/// with the remaining, finer separators.
///
/// # Example
///
/// ```rust
/// use vox_rag::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(10, 0);
/// let text = "aaaa bbbb cccc";
/// let parts: Vec<&str> = chunker.split(text).iter().map(|s| s.slice(text)).collect();
/// assert_eq!(parts, ["aaaa bbbb ", "cccc"]);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with the default separator ladder.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - maximum number of characters repeated between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the separator ladder.
    ///
    /// Without a trailing `""` entry, a piece with no remaining boundary is
    /// emitted whole even when it exceeds `chunk_size`.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    fn split_span(&self, text: &str, span: TextSpan, separators: &[String], out: &mut Vec<TextSpan>) {
        let slice = span.slice(text);

        // First separator present in the text wins; "" always matches.
        let (separator, remaining) = separators
            .iter()
            .position(|s| s.is_empty() || slice.contains(s.as_str()))
            .map(|i| (separators[i].as_str(), &separators[i + 1..]))
            .unwrap_or(("", &[][..]));

        let mut fitting: Vec<(TextSpan, usize)> = Vec::new();
        for piece in split_keeping_separator(slice, separator, span.start) {
            let len = piece.char_len(text);
            if len <= self.chunk_size {
                fitting.push((piece, len));
                continue;
            }

            if !fitting.is_empty() {
                self.merge(&fitting, out);
                fitting.clear();
            }
            if remaining.is_empty() {
                out.push(piece);
            } else {
                self.split_span(text, piece, remaining, out);
            }
        }

        if !fitting.is_empty() {
            self.merge(&fitting, out);
        }
    }

    /// Merge contiguous pieces into windows no larger than `chunk_size`.
    fn merge(&self, pieces: &[(TextSpan, usize)], out: &mut Vec<TextSpan>) {
        let mut window: VecDeque<(TextSpan, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &(piece, len) in pieces {
            if total + len > self.chunk_size && !window.is_empty() {
                out.push(window_span(&window));
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            out.push(window_span(&window));
        }
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str) -> Vec<TextSpan> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.split_span(text, TextSpan { start: 0, end: text.len() }, &self.separators, &mut out);
        out
    }
}

fn window_span(window: &VecDeque<(TextSpan, usize)>) -> TextSpan {
    match (window.front(), window.back()) {
        (Some((first, _)), Some((last, _))) => TextSpan { start: first.start, end: last.end },
        _ => TextSpan { start: 0, end: 0 },
    }
}

/// Split `slice` at `separator`, keeping the separator attached to the
/// preceding piece. Returned spans are offset by `base`. The empty separator
/// yields one span per character.
fn split_keeping_separator(slice: &str, separator: &str, base: usize) -> Vec<TextSpan> {
    if separator.is_empty() {
        return slice
            .char_indices()
            .map(|(i, c)| TextSpan { start: base + i, end: base + i + c.len_utf8() })
            .collect();
    }

    let mut result = Vec::new();
    let mut start = 0;
    while let Some(pos) = slice[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(TextSpan { start: base + start, end: base + end });
        start = end;
    }
    if start < slice.len() {
        result.push(TextSpan { start: base + start, end: base + slice.len() });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(chunker: &RecursiveChunker, text: &'a str) -> Vec<&'a str> {
        chunker.split(text).iter().map(|s| s.slice(text)).collect()
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(RecursiveChunker::default().split("").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let text = "The capital of France is Paris.";
        assert_eq!(parts(&RecursiveChunker::default(), text), [text]);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let chunker = RecursiveChunker::new(12, 0);
        assert_eq!(parts(&chunker, "para one.\n\npara two."), ["para one.\n\n", "para two."]);
    }

    #[test]
    fn falls_back_to_lines_then_words() {
        let chunker = RecursiveChunker::new(12, 0);
        let text = "first line\nsecond line here";
        assert_eq!(parts(&chunker, text), ["first line\n", "second line ", "here"]);
    }

    #[test]
    fn overlap_repeats_trailing_pieces() {
        let chunker = RecursiveChunker::new(10, 5);
        assert_eq!(parts(&chunker, "aaaa bbbb cccc"), ["aaaa bbbb ", "bbbb cccc"]);
    }

    #[test]
    fn unbroken_runs_are_cut_by_character() {
        let chunker = RecursiveChunker::new(4, 0);
        assert_eq!(parts(&chunker, "abcdefghij"), ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let chunker = RecursiveChunker::new(3, 0);
        let text = "héllo";
        let split = parts(&chunker, text);
        assert_eq!(split, ["hél", "lo"]);
        assert!(split.iter().all(|p| p.chars().count() <= 3));
    }

    #[test]
    fn custom_ladder_without_char_cut_keeps_indivisible_pieces() {
        let chunker = RecursiveChunker::new(4, 0).with_separators([" "]);
        assert_eq!(parts(&chunker, "ab abcdefgh"), ["ab ", "abcdefgh"]);
    }
}
