#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The snapshot changed since the last tick and should be drawn again.
    Redraw,
    /// Every job of the run has reached a terminal status.
    RunComplete,
}
