use std::sync::mpsc;

use pagescribe_core::StatusMsg;

/// Receives the status stream of runs and partial saves.
pub trait StatusSink: Send + Sync {
    fn emit(&self, msg: StatusMsg);
}

pub struct ChannelStatusSink {
    tx: mpsc::Sender<StatusMsg>,
}

impl ChannelStatusSink {
    pub fn new(tx: mpsc::Sender<StatusMsg>) -> Self {
        Self { tx }
    }
}

impl StatusSink for ChannelStatusSink {
    fn emit(&self, msg: StatusMsg) {
        // A front end that went away is not the run's problem.
        let _ = self.tx.send(msg);
    }
}
