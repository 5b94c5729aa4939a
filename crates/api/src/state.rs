use std::sync::Arc;

use poslyzer_core::FrameAnalyzer;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Frame analyzer wired to the configured landmark source.
    pub analyzer: Arc<FrameAnalyzer>,
}
