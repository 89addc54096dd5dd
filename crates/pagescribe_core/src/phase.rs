/// Lifecycle of one run: `Idle -> Running -> {Completed, Aborted}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running {
        cursor: usize,
        total: usize,
    },
    Completed,
    Aborted {
        reason: String,
    },
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Aborted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Run (re)entered at `cursor` of `total` items.
    Started { cursor: usize, total: usize },
    ItemConcluded,
    Finished,
    Failed { reason: String },
}

/// Pure transition function. Events that do not apply leave the phase unchanged.
pub fn advance(phase: RunPhase, event: PhaseEvent) -> RunPhase {
    match (phase, event) {
        // A run in progress cannot be started twice.
        (phase @ RunPhase::Running { .. }, PhaseEvent::Started { .. }) => phase,
        (_, PhaseEvent::Started { cursor, total }) => RunPhase::Running {
            cursor: cursor.min(total),
            total,
        },
        (RunPhase::Running { cursor, total }, PhaseEvent::ItemConcluded) => RunPhase::Running {
            cursor: (cursor + 1).min(total),
            total,
        },
        (RunPhase::Running { .. }, PhaseEvent::Finished) => RunPhase::Completed,
        (RunPhase::Idle | RunPhase::Running { .. }, PhaseEvent::Failed { reason }) => {
            RunPhase::Aborted { reason }
        }
        (phase, _) => phase,
    }
}
