use std::sync::Arc;

use engine_logging::LogSink;
use pagescribe_core::{is_policy_status, ContentFormat, FetchOutcome, WorkItem};

use crate::extract::{ExtractError, PageExtractor};
use crate::fetch::PageSource;
use crate::novel::{extract_chapter, ChapterError, NovelSite};
use crate::LoadedPage;

/// Turns one work item into a classified outcome. Never panics, never errors:
/// every failure is folded into a [`FetchOutcome`] at the item boundary.
#[async_trait::async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch(&self, item: &WorkItem, log: &dyn LogSink) -> FetchOutcome;

    /// Called once when the run ends, whatever the reason.
    async fn finish(&self) {}
}

/// Novel chapters: plain text of the chapter body.
pub struct ChapterFetch {
    source: Arc<dyn PageSource>,
    site: NovelSite,
}

impl ChapterFetch {
    pub fn new(source: Arc<dyn PageSource>, site: NovelSite) -> Self {
        Self { source, site }
    }
}

/// Arbitrary pages: two-tier markdown/text extraction of the whole body.
pub struct PageFetch {
    source: Arc<dyn PageSource>,
    extractor: PageExtractor,
}

impl PageFetch {
    pub fn new(source: Arc<dyn PageSource>, extractor: PageExtractor) -> Self {
        Self { source, extractor }
    }
}

pub enum FetchStrategy {
    Chapter(ChapterFetch),
    Page(PageFetch),
}

impl FetchStrategy {
    fn source(&self) -> &dyn PageSource {
        match self {
            FetchStrategy::Chapter(chapter) => chapter.source.as_ref(),
            FetchStrategy::Page(page) => page.source.as_ref(),
        }
    }
}

#[async_trait::async_trait]
impl ItemFetcher for FetchStrategy {
    async fn fetch(&self, item: &WorkItem, log: &dyn LogSink) -> FetchOutcome {
        let page = match self.source().load(item.identity()).await {
            Ok(page) => page,
            Err(err) => {
                log.error(&format!("failed to load {}: {err}", item.identity()));
                return FetchOutcome::recorded_error(err.to_string());
            }
        };
        if let Some(skip) = check_status(&page, item, log) {
            return skip;
        }
        match self {
            FetchStrategy::Chapter(chapter) => chapter_outcome(&page, &chapter.site, item, log),
            FetchStrategy::Page(fetch) => page_outcome(&page, &fetch.extractor, log),
        }
    }

    async fn finish(&self) {
        self.source().close().await;
    }
}

fn check_status(page: &LoadedPage, item: &WorkItem, log: &dyn LogSink) -> Option<FetchOutcome> {
    let line = format!("HTTP status {} for {}", page.status, item.identity());
    if page.is_success() {
        log.info(&line);
        return None;
    }
    log.warn(&line);
    if is_policy_status(page.status) {
        log.warn(&format!(
            "status {} is excluded by policy, skipping {}",
            page.status,
            item.identity()
        ));
        return Some(FetchOutcome::SkippedByPolicy {
            status: page.status,
        });
    }
    None
}

fn chapter_outcome(
    page: &LoadedPage,
    site: &NovelSite,
    item: &WorkItem,
    log: &dyn LogSink,
) -> FetchOutcome {
    match extract_chapter(&page.html, site) {
        Ok(text) => FetchOutcome::success(text, ContentFormat::Text),
        Err(ChapterError::ChallengeDetected) => {
            FetchOutcome::fatal(ChapterError::ChallengeDetected.to_string())
        }
        Err(err) => {
            log.error(&format!("chapter {} failed: {err}", item.label()));
            FetchOutcome::recorded_error(format!("failed to fetch chapter content: {err}"))
        }
    }
}

fn page_outcome(page: &LoadedPage, extractor: &PageExtractor, log: &dyn LogSink) -> FetchOutcome {
    match extractor.extract(&page.html, log) {
        Ok(extracted) => FetchOutcome::success(extracted.content, extracted.format),
        Err(ExtractError::ChallengeDetected) => {
            FetchOutcome::fatal(ExtractError::ChallengeDetected.to_string())
        }
        Err(err) => {
            log.error(&format!("extraction failed: {err}"));
            FetchOutcome::recorded_error(err.to_string())
        }
    }
}
