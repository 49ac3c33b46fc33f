use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned HTTP {status} for {endpoint}: {message}")]
    Status { endpoint: String, status: u16, message: String },
    #[error("backend is not healthy: {0}")]
    Unhealthy(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unreadable image header: {0}")]
    Image(#[from] image::ImageError),
    #[error("timed out after {0} ms reading image metadata")]
    Timeout(u64),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("script event {index} at t={t} ms runs backwards (previous t={previous} ms)")]
    ScriptOrder { index: usize, t: f64, previous: f64 },
    #[error(transparent)]
    Engine(#[from] canvas::engine::EngineError),
    #[error(transparent)]
    Wire(#[from] wire::WireError),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
