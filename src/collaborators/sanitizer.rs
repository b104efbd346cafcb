//! Allow-list HTML sanitization and discovered-link collection.

use crate::scheduler::errors::{Cause, ClassifiedError};
use lol_html::{HtmlRewriter, Settings, element};
use std::sync::{Arc, Mutex};

use crate::collaborators::extractor::ContentNode;

#[derive(Clone, Debug)]
pub struct SanitizedDoc {
    pub html: String,
    discovered_urls: Vec<String>,
}

impl SanitizedDoc {
    pub fn discovered_urls(&self) -> &[String] {
        &self.discovered_urls
    }
}

pub trait Sanitizer {
    fn sanitize(&self, content_node: &ContentNode) -> Result<SanitizedDoc, ClassifiedError>;
}

/// Streams the content node through `lol_html`, dropping `<script>`/
/// `<style>` elements and any `on*` event-handler attribute, and collecting
/// every `<a href>` target as a discovered link.
pub struct AllowListSanitizer;

impl AllowListSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AllowListSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

const EVENT_HANDLER_PREFIX: &str = "on";

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, content_node: &ContentNode) -> Result<SanitizedDoc, ClassifiedError> {
        let mut output = Vec::with_capacity(content_node.html.len());
        let discovered = Arc::new(Mutex::new(Vec::new()));

        {
            let discovered_for_handler = Arc::clone(&discovered);
            let mut rewriter = HtmlRewriter::new(
                Settings {
                    element_content_handlers: vec![
                        element!("script, style", |el| {
                            el.remove();
                            Ok(())
                        }),
                        element!("*", |el| {
                            let handler_attrs: Vec<String> = el
                                .attributes()
                                .iter()
                                .map(|a| a.name())
                                .filter(|name| name.starts_with(EVENT_HANDLER_PREFIX))
                                .collect();
                            for attr in handler_attrs {
                                el.remove_attribute(&attr);
                            }
                            Ok(())
                        }),
                        element!("a[href]", |el| {
                            if let Some(href) = el.get_attribute("href") {
                                discovered_for_handler
                                    .lock()
                                    .expect("discovered-links lock poisoned")
                                    .push(href);
                            }
                            Ok(())
                        }),
                    ],
                    ..Settings::default()
                },
                |c: &[u8]| output.extend_from_slice(c),
            );

            rewriter
                .write(content_node.html.as_bytes())
                .map_err(|_| ClassifiedError::fatal(Cause::SanitizeAmbiguousDom))?;
            rewriter
                .end()
                .map_err(|_| ClassifiedError::fatal(Cause::SanitizeAmbiguousDom))?;
        }

        let html = String::from_utf8(output)
            .map_err(|_| ClassifiedError::fatal(Cause::SanitizeAmbiguousDom))?;

        let discovered_urls = Arc::try_unwrap(discovered)
            .map(|m| m.into_inner().expect("discovered-links lock poisoned"))
            .unwrap_or_default();

        Ok(SanitizedDoc {
            html,
            discovered_urls,
        })
    }
}
