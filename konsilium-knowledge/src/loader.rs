use std::path::Path;

use crate::errors::{KnowledgeError, KnowledgeResult};

/// A guideline document as sequential text with page boundaries.
///
/// Documents are pre-extracted text files with a form feed between pages,
/// the layout `pdftotext` produces. PDF extraction itself happens out of
/// band; the index only ever sees text.
#[derive(Debug, Clone)]
pub struct GuidelineDocument {
    pub source: String,
    pub pages: Vec<String>,
}

const PAGE_BREAK: char = '\u{0C}';

pub async fn load_document(path: &Path) -> KnowledgeResult<GuidelineDocument> {
    if !tokio::fs::try_exists(path).await? {
        return Err(KnowledgeError::DocumentNotFound(path.to_path_buf()));
    }
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(GuidelineDocument {
        source: path.display().to_string(),
        pages: split_pages(&raw),
    })
}

/// Split extracted text into pages on form feeds. A document without form
/// feeds is a single page; a trailing form feed does not create an empty
/// final page.
pub fn split_pages(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    let mut pages: Vec<String> = raw.split(PAGE_BREAK).map(str::to_string).collect();
    if pages.last().is_some_and(|page| page.is_empty()) {
        pages.pop();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_form_feed_is_one_page() {
        let pages = split_pages("hello world");
        assert_eq!(pages, vec!["hello world".to_string()]);
    }

    #[test]
    fn form_feeds_split_pages() {
        let pages = split_pages("one\u{0C}two\u{0C}three");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1], "two");
    }

    #[test]
    fn trailing_form_feed_is_dropped() {
        let pages = split_pages("one\u{0C}two\u{0C}");
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn empty_input_has_no_pages() {
        assert!(split_pages("").is_empty());
    }
}
