use std::str::FromStr;
use std::time::Duration;

use poslyzer_core::config::{EngineConfig, SamplingPolicy};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`; video analysis is slow).
    pub request_timeout_secs: u64,
    /// Largest accepted request body in bytes (default: 100 MiB).
    pub max_upload_bytes: usize,
    /// Base URL of the pose-estimation service.
    pub pose_service_url: String,
    /// Engine tunables.
    pub engine: EngineConfig,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 300,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            pose_service_url: "http://localhost:8500".into(),
            engine: EngineConfig::default(),
        }
    }
}

/// Parse `key` if set, else return `default`. Panics on an unparsable value.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} has an invalid value: '{raw}'")),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `MAX_UPLOAD_BYTES`     | `104857600`                |
    /// | `POSE_SERVICE_URL`     | `http://localhost:8500`    |
    /// | `MIN_VISIBILITY`       | `0.5`                      |
    /// | `FRAME_INTERVAL`       | `30`                       |
    /// | `TARGET_ANALYSIS_FPS`  | unset (overrides interval) |
    /// | `MAX_PARALLEL_FRAMES`  | `4`                        |
    /// | `DETECTION_TIMEOUT_MS` | `5000`                     |
    /// | `TOP_ISSUES`           | `5`                        |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let engine_defaults = defaults.engine;
        let sampling = match std::env::var("TARGET_ANALYSIS_FPS") {
            Ok(_) => SamplingPolicy::TargetRate(env_or("TARGET_ANALYSIS_FPS", 0.0)),
            Err(_) => SamplingPolicy::EveryNth(env_or(
                "FRAME_INTERVAL",
                poslyzer_core::config::DEFAULT_FRAME_INTERVAL,
            )),
        };
        let engine = EngineConfig {
            min_visibility: env_or("MIN_VISIBILITY", engine_defaults.min_visibility),
            sampling,
            top_issues: env_or("TOP_ISSUES", engine_defaults.top_issues),
            max_parallel_frames: env_or(
                "MAX_PARALLEL_FRAMES",
                engine_defaults.max_parallel_frames,
            ),
            detection_timeout: Duration::from_millis(env_or(
                "DETECTION_TIMEOUT_MS",
                engine_defaults.detection_timeout.as_millis() as u64,
            )),
            ..engine_defaults
        };

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            pose_service_url: std::env::var("POSE_SERVICE_URL")
                .unwrap_or(defaults.pose_service_url),
            engine,
        }
    }
}
