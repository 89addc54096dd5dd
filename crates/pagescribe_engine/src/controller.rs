use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use engine_logging::LogSink;
use pagescribe_core::{
    advance, decide, AbortCause, ArtifactKind, ItemDecision, PhaseEvent, RunPhase, RunPolicy,
    RunState, StatusMsg, WorkItem, WorkList,
};

use crate::export::{
    artifact_filename, initial_content, render_artifact, render_placeholder, render_section,
    ArtifactSink, ExportError,
};
use crate::pacing::{pace, PacingWindow};
use crate::sink::StatusSink;
use crate::store::{ProgressStore, StoreError};
use crate::strategy::ItemFetcher;
use crate::FetchError;

/// Everything the controller needs to know about one run.
#[derive(Debug, Clone)]
pub struct RunJob {
    pub run_id: String,
    pub title: String,
    pub work_list: WorkList,
    pub kind: ArtifactKind,
    pub policy: RunPolicy,
    pub pacing: PacingWindow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub artifact: PathBuf,
    /// Items concluded over the whole run, including earlier sessions.
    pub concluded: usize,
    pub excluded: usize,
    /// Cursor the run resumed from; zero for a fresh run.
    pub resumed_from: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("index page is missing an expected element: {0}")]
    StructuralMissing(String),
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("{0}")]
    ChallengeDetected(String),
    #[error("{identity}: {message}")]
    ExtractionFailed { identity: String, message: String },
    #[error("{identity} answered with status {status}")]
    PolicyStatus { identity: String, status: u16 },
    #[error("run {0} is already in progress")]
    AlreadyRunning(String),
    #[error("no saved progress for run {0}")]
    NothingToSave(String),
    #[error("the list holds no usable URLs")]
    EmptyWorkList,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Locked(run_id) => RunError::AlreadyRunning(run_id),
            StoreError::Unavailable(message) => RunError::Storage(message),
        }
    }
}

fn abort_error(item: &WorkItem, cause: AbortCause) -> RunError {
    match cause {
        AbortCause::Fatal { message } => RunError::ChallengeDetected(message),
        AbortCause::PolicyStatus { status } => RunError::PolicyStatus {
            identity: item.identity().to_string(),
            status,
        },
        AbortCause::ItemFailed { message } => RunError::ExtractionFailed {
            identity: item.identity().to_string(),
            message,
        },
    }
}

/// Drives one work list through fetch, checkpoint and export.
///
/// Items are processed strictly in order. After every concluded item the
/// checkpoint is rewritten, so an interrupted run resumes at the first item
/// that was not concluded. The checkpoint is cleared only once the artifact
/// has been written. `Complete` and `Error` are emitted only after the run
/// lock is released and the fetcher is finished.
pub struct RunController {
    store: Arc<dyn ProgressStore>,
    artifacts: Arc<dyn ArtifactSink>,
    status: Arc<dyn StatusSink>,
    log: Arc<dyn LogSink>,
    phases: Mutex<HashMap<String, RunPhase>>,
}

impl RunController {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        artifacts: Arc<dyn ArtifactSink>,
        status: Arc<dyn StatusSink>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            store,
            artifacts,
            status,
            log,
            phases: Mutex::new(HashMap::new()),
        }
    }

    /// Where the last run of `run_id` on this controller stands; `Idle` if it never ran.
    pub fn phase(&self, run_id: &str) -> RunPhase {
        self.phases
            .lock()
            .ok()
            .and_then(|phases| phases.get(run_id).cloned())
            .unwrap_or_default()
    }

    fn step(&self, run_id: &str, event: PhaseEvent) {
        if let Ok(mut phases) = self.phases.lock() {
            let phase = phases.remove(run_id).unwrap_or_default();
            let next = advance(phase, event);
            self.log.debug(&format!("{run_id}: {next:?}"));
            phases.insert(run_id.to_string(), next);
        }
    }

    pub async fn run(&self, job: &RunJob, fetcher: &dyn ItemFetcher) -> Result<RunSummary, RunError> {
        let result = match self.store.acquire(&job.run_id).await {
            Ok(()) => {
                let result = self.drive(job, fetcher).await;
                match &result {
                    Ok(_) => self.step(&job.run_id, PhaseEvent::Finished),
                    Err(err) => self.step(
                        &job.run_id,
                        PhaseEvent::Failed {
                            reason: err.to_string(),
                        },
                    ),
                }
                self.store.release(&job.run_id).await;
                result
            }
            Err(err) => Err(err.into()),
        };
        fetcher.finish().await;

        match &result {
            Ok(summary) => {
                self.log.info(&format!("wrote {}", summary.artifact.display()));
                self.status.emit(StatusMsg::Complete {
                    run_id: job.run_id.clone(),
                });
            }
            Err(err) => {
                self.log.error(&format!("run {} stopped: {err}", job.run_id));
                self.status.emit(StatusMsg::Error {
                    message: err.to_string(),
                });
            }
        }
        result
    }

    async fn drive(&self, job: &RunJob, fetcher: &dyn ItemFetcher) -> Result<RunSummary, RunError> {
        let total = job.work_list.len();
        let mut state = self.restore(job).await;
        let resumed_from = state.resume_cursor();

        self.step(
            &job.run_id,
            PhaseEvent::Started {
                cursor: resumed_from,
                total,
            },
        );
        if resumed_from > 0 {
            self.log.info(&format!(
                "resuming {} at item {} of {}",
                job.run_id,
                resumed_from + 1,
                total
            ));
        }

        for (index, item) in job.work_list.remaining(resumed_from) {
            self.status.emit(StatusMsg::progress(&job.run_id, index, total));
            self.status.emit(StatusMsg::status(
                &job.run_id,
                format!("Processing {}/{}: {}", index + 1, total, item.label()),
            ));

            let waited = pace(job.pacing).await;
            self.log
                .debug(&format!("waited {} ms before {}", waited.as_millis(), item.identity()));

            let outcome = fetcher.fetch(item, self.log.as_ref()).await;
            let now = Utc::now().timestamp_millis();
            match decide(outcome, job.policy) {
                ItemDecision::Append { content, format } => {
                    if content.trim().is_empty() {
                        self.log
                            .warn(&format!("{} produced no content", item.identity()));
                    }
                    let section = render_section(job.kind, index + 1, item, &content, format);
                    state.push_concluded(item.identity(), &section, now);
                }
                ItemDecision::Placeholder { message } => {
                    self.log
                        .warn(&format!("recording error for {}: {message}", item.identity()));
                    let section = render_placeholder(job.kind, index + 1, item, &message);
                    state.push_concluded(item.identity(), &section, now);
                }
                ItemDecision::Exclude { status } => {
                    self.log.info(&format!(
                        "leaving {} out of the artifact (status {status})",
                        item.identity()
                    ));
                    state.push_excluded(item.identity(), now);
                }
                ItemDecision::Abort(cause) => {
                    // A fatal page leaves the checkpoint as it was; other aborts
                    // persist what has been gathered so far.
                    if !matches!(cause, AbortCause::Fatal { .. }) {
                        self.checkpoint(&state).await;
                    }
                    return Err(abort_error(item, cause));
                }
            }
            self.checkpoint(&state).await;
            self.step(&job.run_id, PhaseEvent::ItemConcluded);
        }

        let body = render_artifact(job.kind, state.accumulated_content());
        let filename = artifact_filename(job.kind, state.title(), Utc::now(), false);
        let artifact = self.artifacts.save(&filename, &body)?;

        if let Err(err) = self.store.clear(&job.run_id).await {
            self.log
                .warn(&format!("could not clear checkpoint of {}: {err}", job.run_id));
        }

        Ok(RunSummary {
            run_id: job.run_id.clone(),
            artifact,
            concluded: state.completed_identities().len(),
            excluded: state.excluded_identities().len(),
            resumed_from,
        })
    }

    /// Prior progress when it still matches the work list, else a fresh state.
    async fn restore(&self, job: &RunJob) -> RunState {
        let fresh = || {
            RunState::new(
                job.run_id.clone(),
                job.title.clone(),
                initial_content(job.kind, &job.title),
                Utc::now().timestamp_millis(),
            )
            .with_kind(job.kind)
        };
        match self.store.load(&job.run_id).await {
            Ok(Some(state)) if state.is_prefix_of(&job.work_list) => state.with_kind(job.kind),
            Ok(Some(_)) => {
                self.log.warn(&format!(
                    "saved progress of {} does not match the current list, starting over",
                    job.run_id
                ));
                fresh()
            }
            Ok(None) => fresh(),
            Err(err) => {
                self.log
                    .warn(&format!("could not load progress of {}: {err}", job.run_id));
                fresh()
            }
        }
    }

    async fn checkpoint(&self, state: &RunState) {
        if let Err(err) = self.store.save(state.run_id(), state).await {
            self.log
                .warn(&format!("checkpoint of {} not saved: {err}", state.run_id()));
        }
    }

    /// Export whatever the checkpoint of `run_id` holds, in the shape the run
    /// was started with, leaving the checkpoint untouched.
    pub async fn save_partial(&self, run_id: &str) -> Result<PathBuf, RunError> {
        let result = self.export_partial(run_id).await;
        match &result {
            Ok(path) => {
                self.log.info(&format!("partial export written to {}", path.display()));
                self.status.emit(StatusMsg::PartialComplete {
                    run_id: run_id.to_string(),
                });
            }
            Err(err) => {
                self.log.error(&format!("partial export of {run_id} failed: {err}"));
                self.status.emit(StatusMsg::Error {
                    message: err.to_string(),
                });
            }
        }
        result
    }

    async fn export_partial(&self, run_id: &str) -> Result<PathBuf, RunError> {
        let state = match self.store.load(run_id).await? {
            Some(state) if !state.completed_identities().is_empty() => state,
            _ => return Err(RunError::NothingToSave(run_id.to_string())),
        };
        let kind = state.kind();
        let body = render_artifact(kind, state.accumulated_content());
        let filename = artifact_filename(kind, state.title(), Utc::now(), true);
        Ok(self.artifacts.save(&filename, &body)?)
    }
}
