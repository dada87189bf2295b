//! Reader core: pure progress state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod url_source;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{JobId, Outcome, Phase, ProgressState, DEFAULT_RECENT_CAPACITY};
pub use update::update;
pub use url_source::parse_url_lines;
pub use view_model::{ActiveRowView, ProgressView, RecentRowView};
