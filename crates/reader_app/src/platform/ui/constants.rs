use std::time::Duration;

/// Redraw cadence of the live view; events in between coalesce into one frame.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);
pub const SPINNER_TICK: Duration = Duration::from_millis(80);

pub const GLYPH_OK: &str = "✓";
pub const GLYPH_FAIL: &str = "✗";
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Long URLs are cut so a row fits one terminal line.
pub const MAX_URL_CHARS: usize = 100;
