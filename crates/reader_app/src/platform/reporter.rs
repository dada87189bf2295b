//! Progress reporter task: the only owner of the progress snapshot.
//!
//! Engine events arrive on a channel, become [`Msg`]s, and go through the
//! pure `update`. Drawing happens on the refresh tick and only when the
//! snapshot changed.

use engine_logging::{engine_debug, engine_info};
use reader_core::{update, Effect, Msg, Outcome, Phase, ProgressState};
use reader_engine::{EngineEvent, JobStatus};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ui;
use super::ui::constants::REFRESH_INTERVAL;
use super::ui::terminal::TerminalView;

pub fn spawn_reporter(
    events: UnboundedReceiver<EngineEvent>,
    recent_capacity: usize,
    live_view: bool,
) -> JoinHandle<()> {
    let state = ProgressState::with_recent_capacity(recent_capacity);
    let surface = live_view.then(TerminalView::new);
    tokio::spawn(Reporter { state, surface }.run(events))
}

struct Reporter {
    state: ProgressState,
    surface: Option<TerminalView>,
}

impl Reporter {
    async fn run(mut self, mut events: UnboundedReceiver<EngineEvent>) {
        let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    if matches!(event, EngineEvent::RunFinished) {
                        break;
                    }
                    if let Some(msg) = to_msg(event) {
                        self.dispatch(msg);
                    }
                }
                _ = ticker.tick() => self.dispatch(Msg::Tick),
            }
        }

        self.dispatch(Msg::Tick);
        if let Some(surface) = self.surface.as_mut() {
            surface.finish();
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let finished_row = match &msg {
            Msg::JobFinished {
                job_id,
                url,
                outcome,
            } if self.surface.is_none() => Some(reader_core::RecentRowView {
                job_id: *job_id,
                url: url.clone(),
                outcome: outcome.clone(),
            }),
            _ => None,
        };

        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        if let Some(row) = finished_row {
            engine_info!(
                "[{}/{}] {}",
                self.state.processed(),
                self.state.total(),
                ui::render::finished_line(&row)
            );
        }

        for effect in effects {
            match effect {
                Effect::Redraw => {
                    if let Some(surface) = self.surface.as_mut() {
                        surface.apply(ui::render::render(&self.state.view()));
                    }
                }
                Effect::RunComplete => {
                    engine_debug!("all {} jobs reported", self.state.total());
                }
            }
        }
    }
}

/// Terminal statuses are reported by `JobFinished`; their status change is
/// not forwarded.
fn to_msg(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::RunStarted { total } => Some(Msg::RunStarted { total }),
        EngineEvent::StatusChanged {
            job_id,
            url,
            status,
            attempt,
        } => to_phase(status).map(|phase| Msg::JobPhase {
            job_id,
            url,
            phase,
            attempt,
        }),
        EngineEvent::JobFinished {
            job_id,
            url,
            result,
        } => Some(Msg::JobFinished {
            job_id,
            url,
            outcome: match result {
                Ok(path) => Outcome::Done {
                    path: path.display().to_string(),
                },
                Err(error) => Outcome::Failed {
                    reason: error.to_string(),
                },
            },
        }),
        EngineEvent::RunFinished => None,
    }
}

fn to_phase(status: JobStatus) -> Option<Phase> {
    match status {
        JobStatus::Pending => Some(Phase::Pending),
        JobStatus::Fetching => Some(Phase::Fetching),
        JobStatus::Extracting => Some(Phase::Extracting),
        JobStatus::Rendering => Some(Phase::Rendering),
        JobStatus::Done | JobStatus::Failed => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use reader_engine::{FailureKind, JobError};
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn maps_status_changes_to_phases() {
        let msg = to_msg(EngineEvent::StatusChanged {
            job_id: 3,
            url: "https://a.example".into(),
            status: JobStatus::Extracting,
            attempt: 1,
        });
        assert_eq!(
            msg,
            Some(Msg::JobPhase {
                job_id: 3,
                url: "https://a.example".into(),
                phase: Phase::Extracting,
                attempt: 1,
            })
        );

        let terminal = to_msg(EngineEvent::StatusChanged {
            job_id: 3,
            url: "https://a.example".into(),
            status: JobStatus::Done,
            attempt: 1,
        });
        assert_eq!(terminal, None);
    }

    #[test]
    fn maps_failures_to_reasons() {
        let msg = to_msg(EngineEvent::JobFinished {
            job_id: 1,
            url: "https://a.example".into(),
            result: Err(JobError::new(FailureKind::RenderTimeout, "")),
        });
        assert_eq!(
            msg,
            Some(Msg::JobFinished {
                job_id: 1,
                url: "https://a.example".into(),
                outcome: Outcome::Failed {
                    reason: FailureKind::RenderTimeout.to_string(),
                },
            })
        );
    }

    #[tokio::test]
    async fn reporter_drains_events_until_run_finished() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_reporter(rx, 4, false);

        tx.send(EngineEvent::RunStarted { total: 1 }).expect("send");
        tx.send(EngineEvent::JobFinished {
            job_id: 1,
            url: "https://a.example".into(),
            result: Ok(PathBuf::from("output/0001-a--deadbeef.pdf")),
        })
        .expect("send");
        tx.send(EngineEvent::RunFinished).expect("send");

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("reporter stops after RunFinished")
            .expect("reporter task does not panic");
    }
}
