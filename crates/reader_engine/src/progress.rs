use tokio::sync::mpsc::UnboundedSender;

use crate::types::EngineEvent;

/// Receives one event per job status transition. Implementations must not
/// block: workers call `emit` from inside the pipeline.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Forwards events to the reporter task. Events are dropped once the
/// receiving side has gone away.
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    tx: UnboundedSender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
