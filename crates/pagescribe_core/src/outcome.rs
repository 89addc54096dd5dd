use serde::{Deserialize, Serialize};

/// Statuses that mean "leave this item out" rather than "this item failed".
pub const POLICY_STATUSES: [u16; 2] = [404, 429];

pub fn is_policy_status(status: u16) -> bool {
    POLICY_STATUSES.contains(&status)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Markdown,
    Text,
}

impl ContentFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentFormat::Markdown => "markdown",
            ContentFormat::Text => "text",
        }
    }
}

/// Classified result of processing one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success {
        content: String,
        format: ContentFormat,
    },
    /// Blocked or missing; excluded from the artifact, no placeholder.
    SkippedByPolicy { status: u16 },
    /// Failed, but still worth a placeholder entry.
    RecordedError { message: String },
    /// Stops the whole run.
    FatalAbort { message: String },
}

impl FetchOutcome {
    pub fn success(content: impl Into<String>, format: ContentFormat) -> Self {
        FetchOutcome::Success {
            content: content.into(),
            format,
        }
    }

    pub fn recorded_error(message: impl Into<String>) -> Self {
        FetchOutcome::RecordedError {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        FetchOutcome::FatalAbort {
            message: message.into(),
        }
    }
}
