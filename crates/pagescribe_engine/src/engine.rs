use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use engine_logging::{engine_info, FacadeSink, LogSink};
use pagescribe_core::{
    is_policy_status, parse_url_list, url_list_run_id, ArtifactKind, ControlMsg, RunPhase,
    RunPolicy, RunRequest, StatusMsg,
};

use crate::controller::{RunController, RunError, RunJob, RunSummary};
use crate::convert::{Converter, Html2MdConverter};
use crate::export::{ArtifactSink, DirectorySink};
use crate::extract::PageExtractor;
use crate::fetch::{FetchSettings, HttpPageSource, PageSource};
use crate::novel::{build_chapter_list, BuildError, NovelSite};
use crate::pacing::PacingWindow;
use crate::sink::{ChannelStatusSink, StatusSink};
use crate::store::{FileProgressStore, ProgressStore};
use crate::strategy::{ChapterFetch, FetchStrategy, PageFetch};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub site: NovelSite,
    pub novel_pacing: PacingWindow,
    pub url_pacing: PacingWindow,
    pub novel_policy: RunPolicy,
    pub url_policy: RunPolicy,
    pub store_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Load URL-list pages in a Chromium tab. Needs the `chrome` feature.
    pub use_chrome: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            site: NovelSite::default(),
            novel_pacing: PacingWindow::novel(),
            url_pacing: PacingWindow::url_list(),
            novel_policy: RunPolicy::novel(),
            url_policy: RunPolicy::url_list(),
            store_dir: PathBuf::from("progress"),
            output_dir: PathBuf::from("output"),
            use_chrome: false,
        }
    }
}

/// Turns requests into work lists and hands them to the run controller.
pub struct Engine {
    config: EngineConfig,
    controller: RunController,
    status: Arc<dyn StatusSink>,
    log: Arc<dyn LogSink>,
    converter: Arc<dyn Converter>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ProgressStore>,
        artifacts: Arc<dyn ArtifactSink>,
        status: Arc<dyn StatusSink>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        let controller = RunController::new(store, artifacts, status.clone(), log.clone());
        Self {
            config,
            controller,
            status,
            log,
            converter: Arc::new(Html2MdConverter),
        }
    }

    /// File-backed store and output directory from `config`, logging to the facade.
    pub fn from_config(config: EngineConfig, status: Arc<dyn StatusSink>) -> Self {
        let store = Arc::new(FileProgressStore::new(config.store_dir.clone()));
        let artifacts = Arc::new(DirectorySink::new(&config.output_dir));
        Self::new(config, store, artifacts, status, Arc::new(FacadeSink))
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn handle(&self, msg: ControlMsg) {
        match msg {
            ControlMsg::StartRun(request) => {
                if let Ok(summary) = self.start(request).await {
                    engine_info!(
                        "run {} finished: {} items, {} excluded",
                        summary.run_id,
                        summary.concluded,
                        summary.excluded
                    );
                }
            }
            ControlMsg::SavePartial { run_id } => {
                let _ = self.save_partial(&run_id).await;
            }
        }
    }

    pub async fn start(&self, request: RunRequest) -> Result<RunSummary, RunError> {
        let prepared = match request {
            RunRequest::Novel { index_url } => self.prepare_novel(&index_url).await,
            RunRequest::UrlList { text, run_id } => self.prepare_url_list(&text, run_id).await,
        };
        let (job, fetcher) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.log.error(&err.to_string());
                self.status.emit(StatusMsg::Error {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };
        self.controller.run(&job, &fetcher).await
    }

    pub async fn save_partial(&self, run_id: &str) -> Result<PathBuf, RunError> {
        self.controller.save_partial(run_id).await
    }

    pub fn phase(&self, run_id: &str) -> RunPhase {
        self.controller.phase(run_id)
    }

    async fn prepare_novel(&self, index_url: &str) -> Result<(RunJob, FetchStrategy), RunError> {
        let site = &self.config.site;
        if !site.accepts(index_url) {
            return Err(RunError::UnsupportedSource(format!(
                "{index_url} is not under {}",
                site.index_prefix
            )));
        }

        let source: Arc<dyn PageSource> = Arc::new(HttpPageSource::new(self.config.fetch.clone()));
        self.status.emit(StatusMsg::status(index_url, "Loading chapter list"));
        let page = source.load(index_url).await?;
        if is_policy_status(page.status) {
            return Err(RunError::PolicyStatus {
                identity: index_url.to_string(),
                status: page.status,
            });
        }
        if !page.is_success() {
            self.log
                .warn(&format!("index page answered with status {}", page.status));
        }

        let index = build_chapter_list(&page.html, &page.metadata.final_url, site).map_err(
            |err| match err {
                BuildError::ChallengeDetected => RunError::ChallengeDetected(err.to_string()),
                BuildError::MissingElement(what) => RunError::StructuralMissing(what.to_string()),
                BuildError::InvalidSelector(css) => RunError::StructuralMissing(css),
            },
        )?;
        self.log.info(&format!(
            "{} ({}): {} chapters",
            index.title,
            index.run_id,
            index.chapters.len()
        ));

        let job = RunJob {
            run_id: index.run_id,
            title: index.title,
            work_list: index.chapters,
            kind: ArtifactKind::Text,
            policy: self.config.novel_policy,
            pacing: self.config.novel_pacing,
        };
        let fetcher = FetchStrategy::Chapter(ChapterFetch::new(source, site.clone()));
        Ok((job, fetcher))
    }

    async fn prepare_url_list(
        &self,
        text: &str,
        run_id: Option<String>,
    ) -> Result<(RunJob, FetchStrategy), RunError> {
        let work_list = parse_url_list(text);
        if work_list.is_empty() {
            return Err(RunError::EmptyWorkList);
        }
        let run_id = run_id.unwrap_or_else(|| url_list_run_id(&work_list));
        self.log
            .info(&format!("{run_id}: {} URLs to process", work_list.len()));

        let job = RunJob {
            title: run_id.clone(),
            run_id,
            work_list,
            kind: ArtifactKind::XmlCollection,
            policy: self.config.url_policy,
            pacing: self.config.url_pacing,
        };
        let extractor = PageExtractor::new(self.converter.clone());
        let fetcher = FetchStrategy::Page(PageFetch::new(self.page_source(), extractor));
        Ok((job, fetcher))
    }

    #[cfg(feature = "chrome")]
    fn page_source(&self) -> Arc<dyn PageSource> {
        if self.config.use_chrome {
            return Arc::new(crate::chrome::ChromeTabSource::new(self.config.fetch.clone()));
        }
        Arc::new(HttpPageSource::new(self.config.fetch.clone()))
    }

    #[cfg(not(feature = "chrome"))]
    fn page_source(&self) -> Arc<dyn PageSource> {
        if self.config.use_chrome {
            engine_logging::engine_warn!("built without the chrome feature, loading pages over plain HTTP");
        }
        Arc::new(HttpPageSource::new(self.config.fetch.clone()))
    }
}

/// Runs an [`Engine`] on a background runtime. Control messages go in,
/// status messages come out, both over std channels.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<ControlMsg>,
    status_rx: mpsc::Receiver<StatusMsg>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> std::io::Result<Self> {
        Self::spawn(|status| Engine::from_config(config, status))
    }

    /// Build the engine with the handle's status sink, then start the worker thread.
    pub fn spawn(
        build: impl FnOnce(Arc<dyn StatusSink>) -> Engine,
    ) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ControlMsg>();
        let (status_tx, status_rx) = mpsc::channel();
        let engine = Arc::new(build(Arc::new(ChannelStatusSink::new(status_tx))));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("pagescribe-engine".to_string())
            .spawn(move || {
                let mut tasks = Vec::new();
                while let Ok(msg) = cmd_rx.recv() {
                    let engine = engine.clone();
                    tasks.push(runtime.spawn(async move { engine.handle(msg).await }));
                }
                // Let in-flight runs reach a checkpoint and release their locks.
                for task in tasks {
                    let _ = runtime.block_on(task);
                }
            })?;

        Ok(Self { cmd_tx, status_rx })
    }

    /// Returns false once the worker has gone away.
    pub fn send(&self, msg: ControlMsg) -> bool {
        self.cmd_tx.send(msg).is_ok()
    }

    pub fn try_recv(&self) -> Option<StatusMsg> {
        self.status_rx.try_recv().ok()
    }

    /// Blocks until the next status message. Every request ends with a
    /// `Complete`, `PartialComplete` or `Error`.
    pub fn recv(&self) -> Option<StatusMsg> {
        self.status_rx.recv().ok()
    }
}
