use std::sync::Arc;

use engine_logging::LogSink;
use pagescribe_core::ContentFormat;
use scraper::{Html, Selector};

use crate::convert::Converter;
use crate::fallback::visible_text;

/// Interstitial form served by the anti-bot challenge page.
pub const CHALLENGE_SELECTOR: &str = "#challenge-form";

/// Removed before the primary conversion.
const PRIMARY_STRIPPED: &[&str] = &["script", "style", "iframe", "noscript"];

const FALLBACK_NOTE: &str = "**Note: Markdown conversion failed, falling back to plain text**";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("anti-bot challenge detected, try again later")]
    ChallengeDetected,
    #[error("page body is empty")]
    EmptyDocument,
    #[error("markdown conversion failed ({primary}) and no visible text remained")]
    NothingVisible { primary: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub content: String,
    pub format: ContentFormat,
}

pub fn has_challenge(document: &Html) -> bool {
    Selector::parse(CHALLENGE_SELECTOR)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

/// Two-tier extractor: markdown conversion first, visible-text walk second.
pub struct PageExtractor {
    converter: Arc<dyn Converter>,
}

impl PageExtractor {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self { converter }
    }

    pub fn extract(&self, html: &str, log: &dyn LogSink) -> Result<ExtractedPage, ExtractError> {
        let mut document = Html::parse_document(html);
        if has_challenge(&document) {
            return Err(ExtractError::ChallengeDetected);
        }

        strip_tags(&mut document, PRIMARY_STRIPPED);
        let body_html = body_inner_html(&document);
        if body_html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }
        log.debug(&format!("converting {} bytes of body html", body_html.len()));

        let primary_err = match self.converter.to_markdown(&body_html) {
            Ok(markdown) => {
                log.debug(&format!("markdown conversion produced {} chars", markdown.len()));
                return Ok(ExtractedPage {
                    content: markdown,
                    format: ContentFormat::Markdown,
                });
            }
            Err(err) => err,
        };

        log.error(&format!("markdown conversion failed: {primary_err}"));
        log.info("falling back to visible text extraction");
        let text = visible_text(&document);
        if text.is_empty() {
            return Err(ExtractError::NothingVisible {
                primary: primary_err.to_string(),
            });
        }
        log.info(&format!("fallback extracted {} chars", text.len()));
        Ok(ExtractedPage {
            content: format!("{FALLBACK_NOTE}\n\n**Reason: {primary_err}**\n\n{text}"),
            format: ContentFormat::Text,
        })
    }
}

fn strip_tags(document: &mut Html, tags: &[&str]) {
    let Ok(selector) = Selector::parse(&tags.join(", ")) else {
        return;
    };
    let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn body_inner_html(document: &Html) -> String {
    Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|body| body.inner_html())
        .unwrap_or_else(|| document.root_element().html())
}
