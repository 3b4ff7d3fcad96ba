use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeedtestError {
    #[error("http error: {0}")]
    Http(#[from] hyper::http::Error),
    #[error("connection error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("serialize/deserialize error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("probe request failed: {0}")]
    Probe(#[from] reqwest::Error),
    #[error("bad server URL: {0}")]
    BadUrl(#[from] url::ParseError),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("upload stream failed: {0}")]
    UploadStream(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, SpeedtestError>;
