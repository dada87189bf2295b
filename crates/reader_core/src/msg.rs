#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A run with `total` jobs has been loaded and is about to be dispatched.
    RunStarted { total: usize },
    /// A job moved to a new non-terminal phase (including a re-queue for retry).
    JobPhase {
        job_id: crate::JobId,
        url: String,
        phase: crate::Phase,
        attempt: u32,
    },
    /// A job reached its terminal status.
    JobFinished {
        job_id: crate::JobId,
        url: String,
        outcome: crate::Outcome,
    },
    /// Refresh tick; drawing is coalesced onto ticks.
    Tick,
}
