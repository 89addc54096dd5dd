use std::sync::LazyLock;

use pagescribe_core::{remove_anchor, short_hash, WorkItem, WorkList};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::extract::has_challenge;

static NOVEL_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/n/([\w-]+)").expect("novel path pattern compiles"));

/// Where things live on the novel site's pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NovelSite {
    pub index_prefix: String,
    pub title_selector: String,
    pub chapter_list_selector: String,
    pub content_selector: String,
}

impl Default for NovelSite {
    fn default() -> Self {
        Self {
            index_prefix: "https://czbooks.net/n/".to_string(),
            title_selector: "span.title".to_string(),
            chapter_list_selector: "ul.nav.chapter-list".to_string(),
            content_selector: "div.content".to_string(),
        }
    }
}

impl NovelSite {
    pub fn accepts(&self, index_url: &str) -> bool {
        index_url.starts_with(&self.index_prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("anti-bot challenge on the index page, pass it in a browser first")]
    ChallengeDetected,
    #[error("expected element not found: {0}")]
    MissingElement(&'static str),
    #[error("invalid selector {0:?}")]
    InvalidSelector(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovelIndex {
    pub run_id: String,
    pub title: String,
    pub chapters: WorkList,
}

/// Path segment after `/n/`, or a short hash of the URL when there is none.
pub fn novel_id_from_url(index_url: &str) -> String {
    NOVEL_PATH
        .captures(index_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| short_hash(index_url))
}

pub fn build_chapter_list(
    index_html: &str,
    index_url: &str,
    site: &NovelSite,
) -> Result<NovelIndex, BuildError> {
    let document = Html::parse_document(index_html);
    if has_challenge(&document) {
        return Err(BuildError::ChallengeDetected);
    }

    let title = first_match(&document, &site.title_selector)?
        .map(element_text)
        .ok_or(BuildError::MissingElement("title"))?;
    let list = first_match(&document, &site.chapter_list_selector)?
        .ok_or(BuildError::MissingElement("chapter list"))?;

    let base = Url::parse(index_url).ok();
    let anchor = selector("a")?;
    let chapters = list
        .select(&anchor)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let url = resolve_url(href, base.as_ref())?;
            Some(WorkItem::new(remove_anchor(url.as_str()), element_text(a)))
        })
        .collect();

    Ok(NovelIndex {
        run_id: novel_id_from_url(index_url),
        title,
        chapters,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChapterError {
    #[error("anti-bot challenge detected, try again later")]
    ChallengeDetected,
    #[error("chapter content not found")]
    MissingContent,
    #[error("invalid selector {0:?}")]
    InvalidSelector(String),
}

/// Trimmed text of the chapter body. May be empty.
pub fn extract_chapter(html: &str, site: &NovelSite) -> Result<String, ChapterError> {
    let document = Html::parse_document(html);
    if has_challenge(&document) {
        return Err(ChapterError::ChallengeDetected);
    }
    let sel = Selector::parse(&site.content_selector)
        .map_err(|_| ChapterError::InvalidSelector(site.content_selector.clone()))?;
    document
        .select(&sel)
        .next()
        .map(element_text)
        .ok_or(ChapterError::MissingContent)
}

fn selector(css: &str) -> Result<Selector, BuildError> {
    Selector::parse(css).map_err(|_| BuildError::InvalidSelector(css.to_string()))
}

fn first_match<'a>(document: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>, BuildError> {
    let sel = selector(css)?;
    Ok(document.select(&sel).next())
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn resolve_url(reference: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}
