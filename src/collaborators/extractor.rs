//! HTML content-node extraction port and its scraper-backed heuristic.

use crate::scheduler::errors::{Cause, ClassifiedError};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Tunables forwarded verbatim from config; the scheduler never interprets
/// these, only the extractor's scoring function does.
#[derive(Clone, Copy, Debug)]
pub struct ExtractionTunables {
    pub body_specificity_bias: f64,
    pub link_density_threshold: f64,
    pub score_multiplier: f64,
    pub threshold: f64,
}

impl Default for ExtractionTunables {
    fn default() -> Self {
        Self {
            body_specificity_bias: 1.2,
            link_density_threshold: 0.5,
            score_multiplier: 1.0,
            threshold: 0.0,
        }
    }
}

/// The winning content container, retained as owned HTML so it outlives the
/// `scraper::Html` document it was selected from.
#[derive(Clone, Debug)]
pub struct ContentNode {
    pub html: String,
}

#[derive(Clone, Debug)]
pub struct ExtractionResult {
    pub content_node: ContentNode,
}

pub trait Extractor {
    fn extract(
        &self,
        content_type: Option<&str>,
        body: &str,
    ) -> Result<ExtractionResult, ClassifiedError>;
}

static CANDIDATE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "main",
        "article",
        "[role='main']",
        "#main-content",
        ".main-content",
        "#content",
        ".content",
        ".post-content",
        ".entry-content",
        "[itemprop='articleBody']",
        ".article-body",
        ".story-body",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("BUG: hardcoded CSS selector is invalid"))
    .collect()
});

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid"));

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("BUG: hardcoded CSS selector 'a' is invalid"));

/// Scores a candidate element by text length weighted down by link density,
/// per the config's tunables: a specificity bias rewards smaller, more
/// targeted containers over `<body>`, and a link-density threshold
/// disqualifies nav-heavy elements outright.
fn score_element(element: ElementRef, tunables: &ExtractionTunables, is_body: bool) -> f64 {
    let text_len = element.text().collect::<String>().trim().len() as f64;
    if text_len == 0.0 {
        return f64::NEG_INFINITY;
    }

    let link_text_len: f64 = element
        .select(&ANCHOR_SELECTOR)
        .map(|a| a.text().collect::<String>().len() as f64)
        .sum();
    let link_density = (link_text_len / text_len).min(1.0);

    if link_density > tunables.link_density_threshold {
        return f64::NEG_INFINITY;
    }

    let specificity = if is_body { 1.0 } else { tunables.body_specificity_bias };
    text_len * (1.0 - link_density) * specificity * tunables.score_multiplier
}

/// Picks the main content node using a simple, tunable link-density/text-
/// length heuristic over the teacher crate's priority-selector candidate
/// list, rather than taking the first selector match unconditionally.
pub struct HeuristicExtractor {
    tunables: ExtractionTunables,
}

impl HeuristicExtractor {
    pub fn new(tunables: ExtractionTunables) -> Self {
        Self { tunables }
    }
}

impl Extractor for HeuristicExtractor {
    fn extract(&self, content_type: Option<&str>, body: &str) -> Result<ExtractionResult, ClassifiedError> {
        if let Some(content_type) = content_type
            && !content_type.contains("html")
        {
            return Err(ClassifiedError::recoverable(Cause::ExtractionNotHtml));
        }

        let document = Html::parse_document(body);

        let mut best: Option<(f64, String)> = None;
        for selector in CANDIDATE_SELECTORS.iter() {
            for element in document.select(selector) {
                let score = score_element(element, &self.tunables, false);
                if score < self.tunables.threshold {
                    continue;
                }
                if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
                    best = Some((score, element.html()));
                }
            }
        }

        let html = match best {
            Some((_, html)) => html,
            None => {
                let body_element = document
                    .select(&BODY_SELECTOR)
                    .next()
                    .ok_or_else(|| ClassifiedError::recoverable(Cause::ExtractionEmpty))?;
                body_element.html()
            }
        };

        if html.trim().is_empty() {
            return Err(ClassifiedError::recoverable(Cause::ExtractionEmpty));
        }

        Ok(ExtractionResult {
            content_node: ContentNode { html },
        })
    }
}
