use crate::config::ValidationError;
use crate::range::RangeError;
use crate::upstream::UpstreamError;
use hyper::StatusCode;
use std::io;

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    /// Status returned to the client when a request fails with this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Range(RangeError::Inconsistent) => StatusCode::RANGE_NOT_SATISFIABLE,
            ProxyError::Range(RangeError::InvalidParameter(_)) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(UpstreamError::InvalidTarget(..)) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(UpstreamError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(UpstreamError::Transport(..) | UpstreamError::Body(..)) => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::Io(_) | ProxyError::InvalidConfig(_) | ProxyError::HttpClient(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
