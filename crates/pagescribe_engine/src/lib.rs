//! Pagescribe engine: page retrieval, extraction, checkpointed runs and export.
mod controller;
mod convert;
mod decode;
mod engine;
mod export;
mod extract;
mod fallback;
mod fetch;
mod filename;
mod novel;
mod pacing;
mod persist;
mod sink;
mod store;
mod strategy;
mod types;

#[cfg(feature = "chrome")]
mod chrome;

#[cfg(feature = "chrome")]
pub use chrome::ChromeTabSource;
pub use controller::{RunController, RunError, RunJob, RunSummary};
pub use convert::{ConvertError, Converter, Html2MdConverter};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use engine::{Engine, EngineConfig, EngineHandle};
pub use export::{
    artifact_filename, initial_content, render_artifact, render_placeholder, render_section,
    ArtifactSink, DirectorySink, ExportError,
};
pub use extract::{has_challenge, ExtractError, ExtractedPage, PageExtractor, CHALLENGE_SELECTOR};
pub use fallback::visible_text;
pub use fetch::{FetchSettings, HttpPageSource, PageSource};
pub use filename::sanitize_title;
pub use novel::{
    build_chapter_list, extract_chapter, novel_id_from_url, BuildError, ChapterError, NovelIndex,
    NovelSite,
};
pub use pacing::{pace, PacingWindow};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use sink::{ChannelStatusSink, StatusSink};
pub use store::{checkpoint_key, FileProgressStore, MemoryProgressStore, ProgressStore, StoreError};
pub use strategy::{ChapterFetch, FetchStrategy, ItemFetcher, PageFetch};
pub use types::{FailureKind, FetchError, FetchMetadata, LoadedPage};
