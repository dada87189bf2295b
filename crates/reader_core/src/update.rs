use crate::{Effect, Msg, ProgressState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Event messages only mutate the snapshot and mark it dirty; drawing is
/// requested on `Tick`, so a burst of completions costs a single redraw.
pub fn update(mut state: ProgressState, msg: Msg) -> (ProgressState, Vec<Effect>) {
    let effects = match msg {
        Msg::RunStarted { total } => {
            state.start_run(total);
            if total == 0 {
                vec![Effect::RunComplete]
            } else {
                Vec::new()
            }
        }
        Msg::JobPhase {
            job_id,
            url,
            phase,
            attempt,
        } => {
            state.apply_phase(job_id, url, phase, attempt);
            Vec::new()
        }
        Msg::JobFinished {
            job_id,
            url,
            outcome,
        } => {
            let was_complete = state.is_complete();
            let applied = state.apply_finished(job_id, url, outcome);
            if applied && !was_complete && state.is_complete() {
                vec![Effect::RunComplete]
            } else {
                Vec::new()
            }
        }
        Msg::Tick => {
            if state.consume_dirty() {
                vec![Effect::Redraw]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}
