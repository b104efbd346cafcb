//! Final Markdown normalization pass.

use crate::collaborators::resolver::AssetfulMarkdownDoc;
use crate::scheduler::errors::ClassifiedError;

#[derive(Clone, Debug)]
pub struct NormalizedMarkdown {
    pub markdown: String,
}

pub trait Normalizer {
    fn normalize(&self, doc: &AssetfulMarkdownDoc) -> Result<NormalizedMarkdown, ClassifiedError>;
}

/// Collapses runs of 3+ blank lines to a single blank line, trims trailing
/// whitespace from every line, and ensures exactly one trailing newline.
pub struct MarkdownNormalizer;

impl MarkdownNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for MarkdownNormalizer {
    fn normalize(&self, doc: &AssetfulMarkdownDoc) -> Result<NormalizedMarkdown, ClassifiedError> {
        let trimmed_lines: Vec<&str> = doc.markdown.lines().map(str::trim_end).collect();

        let mut collapsed = Vec::with_capacity(trimmed_lines.len());
        let mut blank_run = 0;
        for line in trimmed_lines {
            if line.is_empty() {
                blank_run += 1;
                if blank_run <= 1 {
                    collapsed.push(line);
                }
            } else {
                blank_run = 0;
                collapsed.push(line);
            }
        }

        let mut markdown = collapsed.join("\n");
        while markdown.ends_with('\n') {
            markdown.pop();
        }
        markdown.push('\n');

        Ok(NormalizedMarkdown { markdown })
    }
}
