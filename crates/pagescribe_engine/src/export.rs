use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use pagescribe_core::{ArtifactKind, ContentFormat, WorkItem};

use crate::filename::sanitize_title;
use crate::persist::{AtomicFileWriter, PersistError};

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<documents>\n";
const XML_FOOTER: &str = "</documents>";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Checkpoint content a fresh run starts from.
pub fn initial_content(kind: ArtifactKind, title: &str) -> String {
    match kind {
        ArtifactKind::Text => format!("{title}\n\n"),
        ArtifactKind::XmlCollection => String::new(),
    }
}

/// Section appended for a successfully fetched item. `position` is 1-based.
pub fn render_section(
    kind: ArtifactKind,
    position: usize,
    item: &WorkItem,
    content: &str,
    format: ContentFormat,
) -> String {
    match kind {
        ArtifactKind::Text => format!("\n\n{}\n\n{}", item.label(), content),
        ArtifactKind::XmlCollection => format!(
            "  <document index=\"{position}\">\n    <source>{}</source>\n    <format>{}</format>\n    <document_content>\n{}\n    </document_content>\n  </document>\n",
            escape(item.identity()),
            format.as_str(),
            escape(content),
        ),
    }
}

/// Section recorded in place of an item that failed.
pub fn render_placeholder(
    kind: ArtifactKind,
    position: usize,
    item: &WorkItem,
    message: &str,
) -> String {
    match kind {
        ArtifactKind::Text => format!("\n\n{}\n\nError: {}", item.label(), message),
        ArtifactKind::XmlCollection => format!(
            "  <document index=\"{position}\">\n    <source>{}</source>\n    <format>{}</format>\n    <document_content>Error: {}</document_content>\n  </document>\n",
            escape(item.identity()),
            ContentFormat::Text.as_str(),
            escape(message),
        ),
    }
}

/// Complete file body from accumulated checkpoint content.
pub fn render_artifact(kind: ArtifactKind, accumulated: &str) -> String {
    match kind {
        ArtifactKind::Text => accumulated.to_string(),
        ArtifactKind::XmlCollection => format!("{XML_HEADER}{accumulated}{XML_FOOTER}"),
    }
}

pub fn artifact_filename(
    kind: ArtifactKind,
    title: &str,
    now: DateTime<Utc>,
    partial: bool,
) -> String {
    let suffix = if partial { "_partial" } else { "" };
    match kind {
        ArtifactKind::Text => format!("{}{suffix}.txt", sanitize_title(title)),
        ArtifactKind::XmlCollection => {
            let stamp = now
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .replace([':', '.'], "-");
            format!("webpage_contents_{stamp}{suffix}.xml")
        }
    }
}

/// Characters XML 1.0 allows in a document.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escapes markup and turns characters XML cannot carry, such as form feeds
/// from scraped pages, into spaces.
fn escape(raw: &str) -> String {
    if raw.chars().all(is_xml_char) {
        return html_escape::encode_text(raw).into_owned();
    }
    let cleaned: String = raw
        .chars()
        .map(|c| if is_xml_char(c) { c } else { ' ' })
        .collect();
    html_escape::encode_text(&cleaned).into_owned()
}

/// Where finished artifacts go.
pub trait ArtifactSink: Send + Sync {
    fn save(&self, filename: &str, content: &str) -> Result<PathBuf, ExportError>;
}

/// Writes artifacts atomically into one directory, created on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    writer: AtomicFileWriter,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir.as_ref().to_path_buf()),
        }
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, filename: &str, content: &str) -> Result<PathBuf, ExportError> {
        Ok(self.writer.write(filename, content)?)
    }
}
