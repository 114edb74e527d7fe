/*!
 * Property-style tests for chunking and reassembly
 */

use doctranslate::translation::segmenter::{PARAGRAPH_SEPARATOR, reassemble, split_sentences};
use doctranslate::translation::{ChunkSizePolicy, Segmenter};

use crate::common;

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

#[test]
fn test_segment_should_bound_every_chunk_for_large_documents() {
    let text = common::long_paragraph(120);
    assert!(text.chars().count() >= 5000);

    let chunks = Segmenter::new(ChunkSizePolicy::default()).segment(&text);

    assert!(chunks.len() >= 17);
    assert!(chunks.iter().all(|c| c.char_length <= 300));
    assert!(chunks.iter().all(|c| !c.text.is_empty()));
}

#[test]
fn test_segment_should_keep_every_word_in_order() {
    let paragraphs: Vec<String> = (0..30).map(|i| common::long_paragraph(i % 4 + 1)).collect();
    let text = paragraphs.join("\n\n   \n");

    let chunks = Segmenter::new(ChunkSizePolicy::default()).segment(&text);
    let rebuilt = reassemble(chunks.iter().map(|c| c.text.as_str()));

    assert_eq!(words(&rebuilt), words(&text));
}

#[test]
fn test_segment_should_number_chunks_contiguously() {
    let text = common::long_paragraph(80);
    let chunks = Segmenter::new(ChunkSizePolicy::default()).segment(&text);

    for (position, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, position);
        assert_eq!(chunk.char_length, chunk.text.chars().count());
    }
}

#[test]
fn test_segment_small_document_should_use_small_ceiling() {
    let text = vec!["Short paragraph."; 40].join("\n\n");
    assert!(text.chars().count() < 2000);

    let chunks = Segmenter::new(ChunkSizePolicy::default()).segment(&text);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, text);
}

#[test]
fn test_segment_should_count_characters_not_bytes() {
    // 3 bytes per character; 117 characters fit under a 150-character ceiling
    let policy = ChunkSizePolicy {
        small_document_threshold: 10_000,
        small_document_chunk_size: 150,
        large_document_chunk_size: 150,
    };
    let text = "日本語のテキスト。".repeat(13);

    let chunks = Segmenter::new(policy).segment(&text);
    assert_eq!(chunks.len(), 1);
}

#[test]
fn test_segment_should_include_separator_in_size_check() {
    let policy = ChunkSizePolicy {
        small_document_threshold: 10_000,
        small_document_chunk_size: 20,
        large_document_chunk_size: 20,
    };
    // 9 + 2 + 9 = 20 fits, one more character does not
    let fits = Segmenter::new(policy).segment("aaaaaaaaa\n\nbbbbbbbbb");
    let overflows = Segmenter::new(policy).segment("aaaaaaaaa\n\nbbbbbbbbbb");

    assert_eq!(fits.len(), 1);
    assert_eq!(overflows.len(), 2);
}

#[test]
fn test_segment_whitespace_only_should_yield_nothing() {
    assert!(Segmenter::new(ChunkSizePolicy::default()).segment(" \n\n \t\n").is_empty());
}

#[test]
fn test_split_sentences_should_keep_unterminated_tail() {
    let units = split_sentences("One. Two? Three");
    assert_eq!(units, vec!["One. ", "Two? ", "Three"]);
    assert_eq!(units.concat(), "One. Two? Three");
}

#[test]
fn test_reassemble_should_join_with_blank_line() {
    assert_eq!(reassemble(["a", "b", "c"]), format!("a{0}b{0}c", PARAGRAPH_SEPARATOR));
    assert_eq!(reassemble(Vec::<&str>::new()), "");
}
