//! Browser abstraction used by the pipeline.
//!
//! A [`RenderBackend`] is launched once per run and hands out one
//! [`RenderSession`] (a browser tab) per job. Sessions are never shared.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{LoadOptions, PrintOptions};

/// Fully loaded page as seen by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomSnapshot {
    /// Final URL after redirects.
    pub url: String,
    /// Serialized DOM, scripts already executed.
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("could not open browser tab: {0}")]
    Session(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),
    #[error("print failed: {0}")]
    Print(String),
    #[error("browser connection closed")]
    Closed,
}

#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, BackendError>;

    /// Shuts down the engine. Safe to call more than once.
    async fn shutdown(&self) -> Result<(), BackendError>;
}

#[async_trait]
pub trait RenderSession: Send {
    /// Navigates to `url`, waits for DOM-ready (hard timeout) and then for
    /// network quiescence (soft, best effort).
    async fn load(&mut self, url: &str, options: &LoadOptions) -> Result<DomSnapshot, BackendError>;

    async fn print_to_pdf(
        &mut self,
        html: &str,
        options: &PrintOptions,
    ) -> Result<Vec<u8>, BackendError>;

    async fn close(self: Box<Self>) -> Result<(), BackendError>;
}
