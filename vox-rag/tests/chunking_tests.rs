//! Property tests for the recursive chunker and the document ingestor.

use std::sync::Arc;

use proptest::prelude::*;
use vox_rag::chunking::{Chunker, RecursiveChunker, TextSpan};
use vox_rag::document::{META_START_INDEX, SourceDocument, SourceType};
use vox_rag::ingest::DocumentIngestor;

/// Text drawn from a small alphabet rich in separators, plus some multi-byte
/// characters.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            8 => proptest::char::range('a', 'z'),
            3 => Just(' '),
            1 => Just('\n'),
            1 => Just('.'),
            1 => Just(','),
            1 => Just('!'),
            1 => Just('é'),
            1 => Just('日'),
        ],
        0..600,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Chunk size in `1..200` and an overlap strictly smaller than it.
fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..200).prop_flat_map(|size| (Just(size), 0..size))
}

/// Rebuild the input by appending the uncovered tail of each span.
fn reconstruct(text: &str, spans: &[TextSpan]) -> String {
    let mut out = String::new();
    let mut covered = 0;
    for span in spans {
        let from = covered.max(span.start);
        out.push_str(&text[from..span.end]);
        covered = covered.max(span.end);
    }
    out
}

mod prop_recursive_chunker {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn no_span_exceeds_chunk_size(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunker = RecursiveChunker::new(size, overlap);
            for span in chunker.split(&text) {
                let len = span.slice(&text).chars().count();
                prop_assert!(len <= size, "span of {} chars exceeds {}", len, size);
                prop_assert!(len > 0);
            }
        }

        #[test]
        fn spans_cover_the_text_without_gaps(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunker = RecursiveChunker::new(size, overlap);
            let spans = chunker.split(&text);

            if text.is_empty() {
                prop_assert!(spans.is_empty());
                return Ok(());
            }

            prop_assert_eq!(spans[0].start, 0);
            prop_assert_eq!(spans[spans.len() - 1].end, text.len());
            for pair in spans.windows(2) {
                prop_assert!(pair[1].start <= pair[0].end, "gap between {:?} and {:?}", pair[0], pair[1]);
                prop_assert!(pair[1].start > pair[0].start, "no progress at {:?}", pair[1]);
                prop_assert!(pair[1].end > pair[0].end);
            }
            prop_assert_eq!(reconstruct(&text, &spans), text);
        }

        #[test]
        fn zero_overlap_spans_only_touch(text in arb_text(), size in 1usize..200) {
            let chunker = RecursiveChunker::new(size, 0);
            let spans = chunker.split(&text);
            for pair in spans.windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].end);
            }
        }
    }
}

/// Whitespace-only runs must survive ingestion: placing every chunk at its
/// `start_index` rebuilds the page exactly.
mod prop_document_ingestor {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_rebuild_the_page(text in arb_text(), (size, overlap) in arb_sizes()) {
            let ingestor = DocumentIngestor::new(Arc::new(RecursiveChunker::new(size, overlap)));
            let document = SourceDocument::single_page("notes.txt", SourceType::Text, text.clone());
            let chunks = ingestor.ingest_document(&document);

            if text.trim().is_empty() {
                prop_assert!(chunks.is_empty());
                return Ok(());
            }

            let chars: Vec<char> = text.chars().collect();
            let mut rebuilt = String::new();
            let mut covered = 0usize;
            for chunk in &chunks {
                prop_assert!(!chunk.content.trim().is_empty());
                let start: usize = chunk.metadata[META_START_INDEX].parse().unwrap();
                let len = chunk.content.chars().count();
                prop_assert!(start <= covered, "gap before chunk at {}", start);

                let expected: String = chars[start..start + len].iter().collect();
                prop_assert_eq!(&chunk.content, &expected);

                if start + len > covered {
                    rebuilt.extend(&chars[covered..start + len]);
                    covered = start + len;
                }
            }
            prop_assert_eq!(rebuilt, text);
        }
    }
}

#[test]
fn default_chunker_keeps_short_document_whole() {
    let text = "The capital of France is Paris.";
    let spans = RecursiveChunker::default().split(text);
    assert_eq!(spans, vec![TextSpan { start: 0, end: text.len() }]);
}

#[test]
fn long_document_with_default_sizes_overlaps_neighbours() {
    let sentence = "Rust guarantees memory safety without a garbage collector. ";
    let text = sentence.repeat(60);
    let spans = RecursiveChunker::default().split(&text);

    assert!(spans.len() > 1);
    for pair in spans.windows(2) {
        let shared = pair[0].end.saturating_sub(pair[1].start);
        assert!(shared > 0, "default overlap should repeat text between chunks");
        assert!(text[pair[1].start..pair[0].end].chars().count() <= 200);
    }
}
