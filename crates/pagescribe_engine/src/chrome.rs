use std::sync::atomic::{AtomicBool, Ordering};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use engine_logging::{engine_debug, engine_warn};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::fetch::{FetchSettings, PageSource};
use crate::{FailureKind, FetchError, FetchMetadata, LoadedPage};

/// Navigation status as the page itself saw it. Browsers that do not expose
/// `responseStatus` report 200.
const STATUS_SCRIPT: &str = r#"(() => {
    const nav = performance.getEntriesByType('navigation')[0];
    return nav && nav.responseStatus ? nav.responseStatus : 200;
})()"#;

struct Session {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

/// Loads every item in one reused Chromium tab, so cookies and challenge
/// clearances carry over between pages.
pub struct ChromeTabSource {
    settings: FetchSettings,
    session: Mutex<Option<Session>>,
    closed: AtomicBool,
}

fn browser_error(context: &str, err: impl std::fmt::Display) -> FetchError {
    FetchError::new(FailureKind::Browser, format!("{context}: {err}"))
}

impl ChromeTabSource {
    pub fn new(settings: FetchSettings) -> Self {
        Self {
            settings,
            session: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    async fn launch(&self) -> Result<Session, FetchError> {
        let config = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(|e| browser_error("browser config", e))?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            browser_error("failed to launch browser, is Chrome or Chromium installed", e)
        })?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_error("failed to open tab", e))?;
        if let Some(agent) = &self.settings.user_agent {
            page.set_user_agent(agent)
                .await
                .map_err(|e| browser_error("failed to set user agent", e))?;
        }
        engine_debug!("browser tab ready");
        Ok(Session {
            browser,
            page,
            handler,
        })
    }
}

#[async_trait::async_trait]
impl PageSource for ChromeTabSource {
    async fn load(&self, url: &str) -> Result<LoadedPage, FetchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FetchError::new(FailureKind::Browser, "browser already closed"));
        }
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            *guard = Some(self.launch().await?);
        }
        let Some(session) = guard.as_ref() else {
            return Err(FetchError::new(FailureKind::Browser, "no browser session"));
        };
        let page = &session.page;

        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(self.settings.request_timeout, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(FetchError::new(FailureKind::Network, err.to_string())),
            Err(_) => {
                return Err(FetchError::new(
                    FailureKind::Timeout,
                    format!("navigation to {url} timed out"),
                ))
            }
        }

        let status = page
            .evaluate(STATUS_SCRIPT)
            .await
            .map_err(|e| browser_error("status script failed", e))?
            .into_value::<u16>()
            .unwrap_or(200);
        let html = page
            .content()
            .await
            .map_err(|e| browser_error("failed to read document", e))?;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(LoadedPage {
            status,
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                redirect_count: 0,
                content_type: Some("text/html".to_string()),
                byte_len: html.len() as u64,
            },
            html,
        })
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(mut session) = self.session.lock().await.take() else {
            return;
        };
        if let Err(err) = session.page.close().await {
            engine_warn!("failed to close tab: {}", err);
        }
        if let Err(err) = session.browser.close().await {
            engine_warn!("failed to close browser: {}", err);
        }
        let _ = session.browser.wait().await;
        session.handler.abort();
    }
}
