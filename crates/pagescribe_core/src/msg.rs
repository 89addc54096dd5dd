use serde::{Deserialize, Serialize};

/// Shape of the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Title followed by every chapter, plain text.
    #[default]
    Text,
    /// `<documents>` bundle, one `<document>` per included item.
    XmlCollection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunRequest {
    /// Download every chapter listed on a novel index page.
    Novel { index_url: String },
    /// Scrape a pasted list of URLs. Without an explicit id one is derived from the list.
    UrlList {
        text: String,
        run_id: Option<String>,
    },
}

/// Inbound control messages from a front end to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMsg {
    StartRun(RunRequest),
    /// Export whatever is checkpointed without touching the run.
    SavePartial { run_id: String },
}

/// Outbound status messages from the run controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StatusMsg {
    Progress {
        value: u8,
        current: usize,
        total: usize,
        #[serde(rename = "runId")]
        run_id: String,
    },
    Status {
        text: String,
        #[serde(rename = "runId")]
        run_id: String,
    },
    Complete {
        #[serde(rename = "runId")]
        run_id: String,
    },
    PartialComplete {
        #[serde(rename = "runId")]
        run_id: String,
    },
    Error {
        message: String,
    },
}

impl StatusMsg {
    /// Progress before processing the item at `index` (0-based) of `total`.
    pub fn progress(run_id: &str, index: usize, total: usize) -> Self {
        let value = if total == 0 {
            100
        } else {
            (index.min(total) * 100 / total) as u8
        };
        StatusMsg::Progress {
            value,
            current: index + 1,
            total,
            run_id: run_id.to_string(),
        }
    }

    pub fn status(run_id: &str, text: impl Into<String>) -> Self {
        StatusMsg::Status {
            text: text.into(),
            run_id: run_id.to_string(),
        }
    }
}
