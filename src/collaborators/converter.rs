//! Markdown conversion port and its `htmd`-backed implementation.

use crate::collaborators::sanitizer::SanitizedDoc;
use crate::scheduler::errors::{Cause, ClassifiedError};
use htmd::HtmlToMarkdown;

#[derive(Clone, Debug)]
pub struct ConversionResult {
    pub markdown: String,
}

pub trait Converter {
    fn convert(&self, sanitized_doc: &SanitizedDoc) -> Result<ConversionResult, ClassifiedError>;
}

/// Hands the sanitized fragment straight to `htmd`'s default handler set.
/// Element-specific handlers (language inference, heading spacing, and so
/// on) are deliberately left to `htmd`'s defaults — this crate has no
/// content-quality heuristics of its own beyond the extractor's scoring.
pub struct HtmdConverter {
    inner: HtmlToMarkdown,
}

impl HtmdConverter {
    pub fn new() -> Self {
        Self {
            inner: HtmlToMarkdown::builder().build(),
        }
    }
}

impl Default for HtmdConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for HtmdConverter {
    fn convert(&self, sanitized_doc: &SanitizedDoc) -> Result<ConversionResult, ClassifiedError> {
        let markdown = self
            .inner
            .convert(&sanitized_doc.html)
            .map_err(|e| ClassifiedError::recoverable(Cause::ConversionFailure(e.to_string())))?;

        Ok(ConversionResult { markdown })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> SanitizedDoc {
        // `SanitizedDoc` only constructs through `Sanitizer::sanitize` in
        // production; tests reach in via the sanitizer to build one.
        use crate::collaborators::extractor::ContentNode;
        use crate::collaborators::sanitizer::{AllowListSanitizer, Sanitizer};
        AllowListSanitizer::new()
            .sanitize(&ContentNode { html: html.to_string() })
            .unwrap()
    }

    #[test]
    fn test_converts_paragraph() {
        let converter = HtmdConverter::new();
        let result = converter.convert(&doc("<p>Hello, world.</p>")).unwrap();
        assert!(result.markdown.contains("Hello, world."));
    }

    #[test]
    fn test_converts_heading_and_list() {
        let converter = HtmdConverter::new();
        let html = "<h1>Title</h1><ul><li>one</li><li>two</li></ul>";
        let result = converter.convert(&doc(html)).unwrap();
        assert!(result.markdown.contains("# Title"));
        assert!(result.markdown.contains("one"));
        assert!(result.markdown.contains("two"));
    }
}
