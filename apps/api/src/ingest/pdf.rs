//! PDF text extraction via the `pdf-extract` crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF extraction failed: {0}")]
    Extract(#[from] pdf_extract::OutputError),
}

/// Extracts page-level text from an in-memory PDF.
///
/// Pages are split on the form-feed separators the extractor emits between
/// pages; extractors that emit none yield a single page. Blank pages are
/// dropped. A corrupt or non-PDF buffer returns `Err`, which callers treat
/// as "zero documents extracted" rather than a request failure.
pub fn extract_pages(data: &[u8]) -> Result<Vec<String>, PdfError> {
    let text = pdf_extract::extract_text_from_mem(data)?;
    Ok(split_pages(&text))
}

fn split_pages(text: &str) -> Vec<String> {
    text.split('\u{c}')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_on_form_feed() {
        let text = "page one\u{c}page two\u{c}page three";
        let pages = split_pages(text);
        assert_eq!(pages, vec!["page one", "page two", "page three"]);
    }

    #[test]
    fn test_split_pages_without_separator_is_single_page() {
        let pages = split_pages("just one page of text");
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_split_pages_drops_blank_pages() {
        let text = "real content\u{c}   \u{c}\u{c}more content";
        let pages = split_pages(text);
        assert_eq!(pages, vec!["real content", "more content"]);
    }

    #[test]
    fn test_split_pages_empty_input_yields_no_pages() {
        assert!(split_pages("").is_empty());
        assert!(split_pages("  \n ").is_empty());
    }

    #[test]
    fn test_extract_pages_rejects_garbage_bytes() {
        let result = extract_pages(b"this is not a pdf at all");
        assert!(result.is_err());
    }
}
