use serde::{Deserialize, Serialize};

use crate::item::WorkList;
use crate::msg::ArtifactKind;

/// Durable checkpoint of one run.
///
/// `completed_identities` is always a prefix of the work list's identities;
/// its length is the resume cursor. Items excluded by policy are concluded
/// too, so they appear in both lists but contribute nothing to the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    run_id: String,
    title: String,
    /// Shape the run exports to. Checkpoints written before it was recorded read as text.
    #[serde(default)]
    artifact_kind: ArtifactKind,
    #[serde(rename = "downloadedIdentities")]
    completed_identities: Vec<String>,
    #[serde(default)]
    excluded_identities: Vec<String>,
    #[serde(rename = "content")]
    accumulated_content: String,
    last_update: i64,
}

impl RunState {
    pub fn new(
        run_id: impl Into<String>,
        title: impl Into<String>,
        initial_content: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            title: title.into(),
            artifact_kind: ArtifactKind::default(),
            completed_identities: Vec::new(),
            excluded_identities: Vec::new(),
            accumulated_content: initial_content.into(),
            last_update: now_ms,
        }
    }

    pub fn with_kind(mut self, kind: ArtifactKind) -> Self {
        self.artifact_kind = kind;
        self
    }

    pub fn kind(&self) -> ArtifactKind {
        self.artifact_kind
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn completed_identities(&self) -> &[String] {
        &self.completed_identities
    }

    pub fn excluded_identities(&self) -> &[String] {
        &self.excluded_identities
    }

    pub fn accumulated_content(&self) -> &str {
        &self.accumulated_content
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    pub fn resume_cursor(&self) -> usize {
        self.completed_identities.len()
    }

    /// True when the concluded identities are a prefix of `list`, in order.
    pub fn is_prefix_of(&self, list: &WorkList) -> bool {
        self.completed_identities.len() <= list.len()
            && self
                .completed_identities
                .iter()
                .zip(list.identities())
                .all(|(done, planned)| done == planned)
    }

    /// Conclude the next item, appending its rendered section (possibly empty).
    pub fn push_concluded(&mut self, identity: impl Into<String>, section: &str, now_ms: i64) {
        self.accumulated_content.push_str(section);
        self.completed_identities.push(identity.into());
        self.last_update = now_ms;
    }

    /// Conclude the next item without contributing content.
    pub fn push_excluded(&mut self, identity: impl Into<String>, now_ms: i64) {
        let identity = identity.into();
        self.excluded_identities.push(identity.clone());
        self.completed_identities.push(identity);
        self.last_update = now_ms;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
