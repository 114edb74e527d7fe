/*!
 * Adaptive text segmentation.
 *
 * Splits extracted text into ordered chunks small enough for the chunk
 * endpoint. Paragraph boundaries are preserved where possible; paragraphs
 * that exceed the ceiling on their own are split into sentence-like units.
 * Lengths are counted in characters, not bytes.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Blank line: a newline, optional whitespace, another newline
static PARAGRAPH_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*\n").expect("valid paragraph regex")
});

/// A run of non-terminators ending in `.`, `!` or `?`, then whitespace or end of text
static SENTENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^.!?]+[.!?]+(?:\s|$)").expect("valid sentence regex")
});

/// Separator placed between paragraphs of one chunk, and between chunks on reassembly
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// One unit of work for the chunk translator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Position in the output sequence; the only reassembly key
    pub index: usize,
    /// Trimmed chunk text
    pub text: String,
    /// Length of `text` in characters
    pub char_length: usize,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let char_length = text.chars().count();
        Self { index, text, char_length }
    }
}

/// Size ceilings for small and large documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSizePolicy {
    /// Documents shorter than this (in characters) count as small
    #[serde(default = "default_small_document_threshold")]
    pub small_document_threshold: usize,

    /// Chunk ceiling for small documents
    #[serde(default = "default_small_document_chunk_size")]
    pub small_document_chunk_size: usize,

    /// Chunk ceiling for large documents
    #[serde(default = "default_large_document_chunk_size")]
    pub large_document_chunk_size: usize,
}

fn default_small_document_threshold() -> usize {
    2000
}

fn default_small_document_chunk_size() -> usize {
    1500
}

fn default_large_document_chunk_size() -> usize {
    300
}

impl Default for ChunkSizePolicy {
    fn default() -> Self {
        Self {
            small_document_threshold: default_small_document_threshold(),
            small_document_chunk_size: default_small_document_chunk_size(),
            large_document_chunk_size: default_large_document_chunk_size(),
        }
    }
}

impl ChunkSizePolicy {
    /// Chunk ceiling for a document of `text_length` characters
    pub fn ceiling_for(&self, text_length: usize) -> usize {
        if text_length < self.small_document_threshold {
            self.small_document_chunk_size
        } else {
            self.large_document_chunk_size
        }
    }
}

/// Running chunk buffer with its character count
#[derive(Default)]
struct ChunkBuffer {
    text: String,
    chars: usize,
}

impl ChunkBuffer {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn replace(&mut self, text: &str, chars: usize) {
        self.text.clear();
        self.text.push_str(text);
        self.chars = chars;
    }

    fn push(&mut self, text: &str, chars: usize) {
        self.text.push_str(text);
        self.chars += chars;
    }

    /// Move the trimmed buffer contents into `chunks`
    fn flush_into(&mut self, chunks: &mut Vec<String>) {
        let trimmed = self.text.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        self.text.clear();
        self.chars = 0;
    }
}

/// Splits text into bounded-size chunks
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    policy: ChunkSizePolicy,
}

impl Segmenter {
    pub fn new(policy: ChunkSizePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ChunkSizePolicy {
        &self.policy
    }

    /// Split `text` into ordered chunks; empty input yields no chunks
    pub fn segment(&self, text: &str) -> Vec<Chunk> {
        let max_size = self.policy.ceiling_for(text.chars().count());
        let separator_chars = PARAGRAPH_SEPARATOR.chars().count();

        let mut chunks: Vec<String> = Vec::new();
        let mut buffer = ChunkBuffer::default();

        for paragraph in PARAGRAPH_BREAK_REGEX.split(text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            let paragraph_chars = paragraph.chars().count();
            let joined_chars = if buffer.is_empty() {
                paragraph_chars
            } else {
                buffer.chars + separator_chars + paragraph_chars
            };

            if joined_chars <= max_size {
                if !buffer.is_empty() {
                    buffer.push(PARAGRAPH_SEPARATOR, separator_chars);
                }
                buffer.push(paragraph, paragraph_chars);
                continue;
            }

            buffer.flush_into(&mut chunks);

            if paragraph_chars <= max_size {
                buffer.replace(paragraph, paragraph_chars);
                continue;
            }

            for sentence in split_sentences(paragraph) {
                let sentence_chars = sentence.chars().count();
                if buffer.chars + sentence_chars > max_size {
                    buffer.flush_into(&mut chunks);
                    buffer.replace(sentence, sentence_chars);
                } else {
                    buffer.push(sentence, sentence_chars);
                }
            }
        }

        buffer.flush_into(&mut chunks);

        chunks
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::new(index, text))
            .collect()
    }
}

/// Split a paragraph into sentence-like units.
///
/// Every byte of the paragraph ends up in exactly one unit: text that the
/// sentence pattern skips is kept as a prefix of the next unit, and any tail
/// without a terminator becomes the last unit. Every unit except the last one
/// ends in whitespace, so a chunk boundary never falls inside a word.
pub fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;

    for found in SENTENCE_REGEX.find_iter(paragraph) {
        units.push(&paragraph[start..found.end()]);
        start = found.end();
    }

    if start < paragraph.len() {
        units.push(&paragraph[start..]);
    }

    units
}

/// Join chunk texts back into one document
pub fn reassemble<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    parts.into_iter().collect::<Vec<_>>().join(PARAGRAPH_SEPARATOR)
}
