//! Document text extraction.
//!
//! The extractor is a collaborator seam: the pipeline only depends on the
//! `Extractor` trait, which turns a source file into page-level text. Two
//! implementations are built in: PDF (via `pdf-extract`) and plain
//! text/markdown. A document that a registered extractor claims but cannot
//! parse aborts the whole build.

use crate::types::Page;
use passage_core::{AppError, AppResult};
use std::path::Path;

/// Trait for document extractors.
pub trait Extractor: Send + Sync {
    /// Get the extractor name (e.g., "pdf", "text").
    fn name(&self) -> &str;

    /// Whether this extractor handles the given file.
    fn supports(&self, path: &Path) -> bool;

    /// Extract the ordered pages of a document.
    ///
    /// Fails with `AppError::UnreadableDocument` on a corrupt or
    /// unsupported file.
    fn extract(&self, path: &Path) -> AppResult<Vec<Page>>;
}

/// The default extractor set, in match order.
pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    vec![Box::new(PdfExtractor), Box::new(TextExtractor)]
}

/// Derive the stable document identifier from a source path.
pub fn document_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// PDF extractor; one `Page` per PDF page.
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(extension_of(path).as_deref(), Some("pdf"))
    }

    fn extract(&self, path: &Path) -> AppResult<Vec<Page>> {
        tracing::debug!("Extracting PDF {:?}", path);

        let page_texts =
            pdf_extract::extract_text_by_pages(path).map_err(|e| AppError::UnreadableDocument {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let doc_id = document_id(path);
        let pages = page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page {
                document_id: doc_id.clone(),
                page_index: i as u32,
                text,
            })
            .collect();

        Ok(pages)
    }
}

/// Plain text and markdown extractor.
///
/// Form-feed separated sections become pages; a file without form feeds is
/// a single page.
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn name(&self) -> &str {
        "text"
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(
            extension_of(path).as_deref(),
            Some("txt") | Some("md") | Some("markdown")
        )
    }

    fn extract(&self, path: &Path) -> AppResult<Vec<Page>> {
        tracing::debug!("Extracting text file {:?}", path);

        let raw = std::fs::read_to_string(path).map_err(|e| AppError::UnreadableDocument {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let doc_id = document_id(path);
        let pages = raw
            .split('\u{0c}')
            .enumerate()
            .map(|(i, text)| Page {
                document_id: doc_id.clone(),
                page_index: i as u32,
                text: text.to_string(),
            })
            .collect();

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_document_id_is_file_name() {
        assert_eq!(document_id(Path::new("/corpus/report.pdf")), "report.pdf");
        assert_eq!(document_id(Path::new("notes.md")), "notes.md");
    }

    #[test]
    fn test_supports_by_extension() {
        assert!(PdfExtractor.supports(Path::new("a.pdf")));
        assert!(PdfExtractor.supports(Path::new("a.PDF")));
        assert!(!PdfExtractor.supports(Path::new("a.txt")));

        assert!(TextExtractor.supports(Path::new("a.txt")));
        assert!(TextExtractor.supports(Path::new("a.md")));
        assert!(!TextExtractor.supports(Path::new("a.pdf")));
    }

    #[test]
    fn test_text_extractor_single_page() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Just one page of text.").unwrap();

        let pages = TextExtractor.extract(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].document_id, "doc.txt");
        assert_eq!(pages[0].page_index, 0);
        assert!(pages[0].text.contains("one page"));
    }

    #[test]
    fn test_text_extractor_form_feed_pages() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.txt");
        std::fs::write(&path, "first page\u{0c}second page\u{0c}third page").unwrap();

        let pages = TextExtractor.extract(&path).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].page_index, 1);
        assert_eq!(pages[2].text, "third page");
    }

    #[test]
    fn test_missing_file_is_unreadable_document() {
        let result = TextExtractor.extract(Path::new("/nonexistent/file.txt"));
        assert!(matches!(
            result,
            Err(AppError::UnreadableDocument { .. })
        ));
    }

    #[test]
    fn test_corrupt_pdf_is_unreadable_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let result = PdfExtractor.extract(&path);
        assert!(matches!(
            result,
            Err(AppError::UnreadableDocument { .. })
        ));
    }
}
