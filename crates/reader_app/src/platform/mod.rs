mod app;
mod config;
mod logging;
mod reporter;
mod ui;

pub use app::{install_browser, run_app};
