use serde::{Deserialize, Serialize};

use crate::outcome::{ContentFormat, FetchOutcome};

/// What a policy-status skip (404/429) does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnPolicySkip {
    #[default]
    ExcludeItem,
    AbortRun,
}

/// What an extraction or retrieval failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnItemError {
    #[default]
    RecordPlaceholder,
    AbortRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunPolicy {
    pub on_policy_skip: OnPolicySkip,
    pub on_item_error: OnItemError,
}

impl RunPolicy {
    /// Chapter downloads stop at the first missing chapter so the text stays contiguous.
    pub const fn novel() -> Self {
        Self {
            on_policy_skip: OnPolicySkip::AbortRun,
            on_item_error: OnItemError::AbortRun,
        }
    }

    pub const fn url_list() -> Self {
        Self {
            on_policy_skip: OnPolicySkip::ExcludeItem,
            on_item_error: OnItemError::RecordPlaceholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortCause {
    Fatal { message: String },
    PolicyStatus { status: u16 },
    ItemFailed { message: String },
}

/// What the run controller does with one item's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDecision {
    Append {
        content: String,
        format: ContentFormat,
    },
    Placeholder {
        message: String,
    },
    Exclude {
        status: u16,
    },
    Abort(AbortCause),
}

/// Pure classification of an outcome under a policy.
pub fn decide(outcome: FetchOutcome, policy: RunPolicy) -> ItemDecision {
    match outcome {
        FetchOutcome::Success { content, format } => ItemDecision::Append { content, format },
        FetchOutcome::SkippedByPolicy { status } => match policy.on_policy_skip {
            OnPolicySkip::ExcludeItem => ItemDecision::Exclude { status },
            OnPolicySkip::AbortRun => ItemDecision::Abort(AbortCause::PolicyStatus { status }),
        },
        FetchOutcome::RecordedError { message } => match policy.on_item_error {
            OnItemError::RecordPlaceholder => ItemDecision::Placeholder { message },
            OnItemError::AbortRun => ItemDecision::Abort(AbortCause::ItemFailed { message }),
        },
        FetchOutcome::FatalAbort { message } => ItemDecision::Abort(AbortCause::Fatal { message }),
    }
}
