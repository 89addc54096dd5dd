//! Pagescribe core: pure run model, item policies and message types.
//!
//! Nothing in this crate performs I/O. The engine crate drives these types
//! against the network, the progress store and the exporter.
mod item;
mod msg;
mod outcome;
mod phase;
mod policy;
mod state;
mod url_list;

pub use item::{short_hash, WorkItem, WorkList};
pub use msg::{ArtifactKind, ControlMsg, RunRequest, StatusMsg};
pub use outcome::{is_policy_status, ContentFormat, FetchOutcome, POLICY_STATUSES};
pub use phase::{advance, PhaseEvent, RunPhase};
pub use policy::{decide, AbortCause, ItemDecision, OnItemError, OnPolicySkip, RunPolicy};
pub use state::RunState;
pub use url_list::{extract_url, parse_url_list, remove_anchor, url_list_run_id};
