//! Document loading and chunking.
//!
//! [`load_document`] turns a file on disk into a [`SourceDocument`] (one entry
//! per page) and [`DocumentIngestor`] splits it into [`DocumentChunk`]s with
//! provenance metadata. Parsing is all-or-nothing: a document that fails to
//! load, or any page that fails to extract, yields an error and no chunks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::document::{
    DocumentChunk, META_CHUNK_INDEX, META_FILE_NAME, META_PAGE_NUMBER, META_SOURCE_TYPE,
    META_START_INDEX, META_TIMESTAMP, SourceDocument, SourcePage, SourceType,
};
use crate::error::{RagError, Result};

fn parse_error(file: &str, message: impl Into<String>) -> RagError {
    RagError::DocumentParse { file: file.to_string(), message: message.into() }
}

/// Load a document from disk, choosing the parser by file extension.
///
/// Supported: `.pdf` (requires the `pdf` feature), `.txt`/`.text`, and
/// `.md`/`.markdown`. Parsing runs on the blocking thread pool.
///
/// # Errors
///
/// Returns [`RagError::DocumentParse`] if the file cannot be read, is not
/// valid UTF-8 (text formats), is a corrupt PDF, or has an unsupported extension.
pub async fn load_document(
    path: impl AsRef<Path>,
    display_name: impl Into<String>,
) -> Result<SourceDocument> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let display_name = display_name.into();
    let name_for_join = display_name.clone();

    tokio::task::spawn_blocking(move || load_blocking(&path, display_name))
        .await
        .map_err(|e| parse_error(&name_for_join, format!("loader task failed: {e}")))?
}

fn load_blocking(path: &Path, display_name: String) -> Result<SourceDocument> {
    let extension =
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).unwrap_or_default();

    let document = match extension.as_str() {
        "pdf" => load_pdf(path, display_name)?,
        "txt" | "text" => load_text(path, display_name, SourceType::Text)?,
        "md" | "markdown" => load_text(path, display_name, SourceType::Markdown)?,
        "" => return Err(parse_error(&display_name, "unsupported document format (no extension)")),
        other => {
            return Err(parse_error(&display_name, format!("unsupported document format '.{other}'")));
        }
    };

    debug!(
        file_name = %document.display_name,
        source_type = %document.source_type,
        pages = document.pages.len(),
        "loaded document"
    );
    Ok(document)
}

fn load_text(path: &Path, display_name: String, source_type: SourceType) -> Result<SourceDocument> {
    let bytes = std::fs::read(path)
        .map_err(|e| parse_error(&display_name, format!("failed to read {}: {e}", path.display())))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| parse_error(&display_name, format!("not valid UTF-8: {e}")))?;
    Ok(SourceDocument::single_page(display_name, source_type, text))
}

#[cfg(feature = "pdf")]
fn load_pdf(path: &Path, display_name: String) -> Result<SourceDocument> {
    let pdf = lopdf::Document::load(path)
        .map_err(|e| parse_error(&display_name, format!("failed to load PDF: {e}")))?;
    if pdf.is_encrypted() {
        return Err(parse_error(&display_name, "encrypted PDFs are not supported"));
    }

    let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(parse_error(&display_name, "PDF has no pages"));
    }

    let pages = page_numbers
        .into_iter()
        .map(|number| {
            pdf.extract_text(&[number])
                .map(|text| SourcePage { number, text })
                .map_err(|e| parse_error(&display_name, format!("failed to extract page {number}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SourceDocument { display_name, source_type: SourceType::Pdf, pages })
}

#[cfg(not(feature = "pdf"))]
fn load_pdf(_path: &Path, display_name: String) -> Result<SourceDocument> {
    Err(parse_error(&display_name, "PDF support is not enabled (build with the `pdf` feature)"))
}

/// Splits parsed documents into chunks carrying provenance metadata.
///
/// Every chunk gets `file_name`, `page_number`, `source_type`, `chunk_index`,
/// `start_index`, and a `timestamp` shared by all chunks of one call.
/// Whitespace-only spans are merged into the neighbouring chunk.
#[derive(Clone)]
pub struct DocumentIngestor {
    chunker: Arc<dyn Chunker>,
}

impl Default for DocumentIngestor {
    fn default() -> Self {
        Self::new(Arc::new(RecursiveChunker::default()))
    }
}

impl DocumentIngestor {
    pub fn new(chunker: Arc<dyn Chunker>) -> Self {
        Self { chunker }
    }

    /// Load `path` and chunk it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DocumentParse`] if the document cannot be parsed.
    pub async fn ingest_file(
        &self,
        path: impl AsRef<Path>,
        display_name: impl Into<String>,
    ) -> Result<Vec<DocumentChunk>> {
        let document = load_document(path, display_name).await?;
        Ok(self.ingest_document(&document))
    }

    /// Chunk an already parsed document.
    pub fn ingest_document(&self, document: &SourceDocument) -> Vec<DocumentChunk> {
        let timestamp = Utc::now().to_rfc3339();
        let mut chunks: Vec<DocumentChunk> = Vec::new();

        for page in &document.pages {
            let first_on_page = chunks.len();
            let mut chunk_index = 0usize;
            let mut chars_before = 0usize;
            let mut counted_to = 0usize;
            // Byte end of the text already emitted for this page.
            let mut emitted_to = 0usize;
            // Leading whitespace waiting for the page's first real chunk.
            let mut pending: Option<(usize, usize)> = None;

            for span in self.chunker.split(&page.text) {
                chars_before += page.text[counted_to..span.start].chars().count();
                counted_to = span.start;

                // Whitespace-only spans are folded into a neighbour so the
                // page stays fully covered.
                if span.slice(&page.text).trim().is_empty() {
                    if chunks.len() > first_on_page {
                        if span.end > emitted_to {
                            if let Some(previous) = chunks.last_mut() {
                                previous.content.push_str(&page.text[emitted_to..span.end]);
                            }
                            emitted_to = span.end;
                        }
                    } else if pending.is_none() {
                        pending = Some((span.start, chars_before));
                    }
                    continue;
                }

                let (start, start_chars) = pending.take().unwrap_or((span.start, chars_before));
                let content = &page.text[start..span.end];
                emitted_to = span.end;

                let metadata = HashMap::from([
                    (META_FILE_NAME.to_string(), document.display_name.clone()),
                    (META_PAGE_NUMBER.to_string(), page.number.to_string()),
                    (META_TIMESTAMP.to_string(), timestamp.clone()),
                    (META_SOURCE_TYPE.to_string(), document.source_type.to_string()),
                    (META_CHUNK_INDEX.to_string(), chunk_index.to_string()),
                    (META_START_INDEX.to_string(), start_chars.to_string()),
                ]);
                chunks.push(DocumentChunk { content: content.to_string(), metadata });
                chunk_index += 1;
            }
        }

        info!(
            file_name = %document.display_name,
            pages = document.pages.len(),
            chunk_count = chunks.len(),
            "chunked document"
        );
        chunks
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn chunks_carry_page_metadata_and_shared_timestamp() {
        let ingestor = DocumentIngestor::new(Arc::new(RecursiveChunker::new(10, 0)));
        let document = SourceDocument {
            display_name: "guide.pdf".into(),
            source_type: SourceType::Pdf,
            pages: vec![
                SourcePage { number: 1, text: "aaaa bbbb cccc".into() },
                SourcePage { number: 2, text: "dddd".into() },
            ],
        };

        let chunks = ingestor.ingest_document(&document);
        assert_eq!(chunks.len(), 3);

        let timestamp = &chunks[0].metadata[META_TIMESTAMP];
        assert!(chunks.iter().all(|c| &c.metadata[META_TIMESTAMP] == timestamp));
        assert!(chunks.iter().all(|c| c.metadata[META_FILE_NAME] == "guide.pdf"));
        assert!(chunks.iter().all(|c| c.metadata[META_SOURCE_TYPE] == "pdf"));

        assert_eq!(chunks[1].content, "cccc");
        assert_eq!(chunks[1].metadata[META_PAGE_NUMBER], "1");
        assert_eq!(chunks[1].metadata[META_CHUNK_INDEX], "1");
        assert_eq!(chunks[1].metadata[META_START_INDEX], "10");
        assert_eq!(chunks[2].metadata[META_PAGE_NUMBER], "2");
        assert_eq!(chunks[2].metadata[META_CHUNK_INDEX], "0");
    }

    #[test]
    fn whitespace_only_spans_join_their_neighbours() {
        let ingestor = DocumentIngestor::new(Arc::new(RecursiveChunker::new(5, 0)));
        let text = "abc\n\n\n\n\n\n\n\ndef";
        let document = SourceDocument::single_page("notes.txt", SourceType::Text, text);

        let chunks = ingestor.ingest_document(&document);
        assert!(chunks.iter().all(|c| !c.content.trim().is_empty()));
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(joined, text);
        assert_eq!(chunks.last().map(|c| c.metadata[META_START_INDEX].as_str()), Some("9"));
    }

    #[test]
    fn leading_whitespace_belongs_to_the_first_chunk() {
        let ingestor = DocumentIngestor::new(Arc::new(RecursiveChunker::new(4, 0)));
        let document = SourceDocument::single_page("notes.txt", SourceType::Text, "\n\n\n\nabc");

        let chunks = ingestor.ingest_document(&document);
        assert_eq!(chunks[0].metadata[META_START_INDEX], "0");
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(joined, "\n\n\n\nabc");
    }

    #[tokio::test]
    async fn loads_text_files_as_a_single_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("france.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"The capital of France is Paris.")
            .unwrap();

        let document = load_document(&path, "france.txt").await.unwrap();
        assert_eq!(document.source_type, SourceType::Text);
        assert_eq!(document.pages.len(), 1);
        assert_eq!(document.pages[0].number, 1);
    }

    #[tokio::test]
    async fn markdown_extension_is_recognised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.MD");
        std::fs::write(&path, "# Title\n\nBody").unwrap();

        let document = load_document(&path, "README.MD").await.unwrap();
        assert_eq!(document.source_type, SourceType::Markdown);
    }

    #[tokio::test]
    async fn unsupported_extension_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pptx");
        std::fs::write(&path, b"binary").unwrap();

        let err = DocumentIngestor::default().ingest_file(&path, "slides.pptx").await.unwrap_err();
        assert!(matches!(err, RagError::DocumentParse { ref file, .. } if file == "slides.pptx"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();

        let err = load_document(&path, "broken.txt").await.unwrap_err();
        assert!(matches!(err, RagError::DocumentParse { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_a_parse_error() {
        let err = load_document("/definitely/not/here.txt", "here.txt").await.unwrap_err();
        assert!(matches!(err, RagError::DocumentParse { .. }));
    }

    #[cfg(feature = "pdf")]
    #[tokio::test]
    async fn corrupt_pdf_produces_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.pdf");
        std::fs::write(&path, b"%PDF-1.4 this is not really a pdf").unwrap();

        let result = DocumentIngestor::default().ingest_file(&path, "corrupt.pdf").await;
        assert!(matches!(result, Err(RagError::DocumentParse { .. })));
    }
}
