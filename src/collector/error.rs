use thiserror::Error;

/// Failures talking to the collector. Every variant is treated as transient:
/// callers mark the collector unreachable and carry on.
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Timeout, refused connection, or an undecodable body.
    #[error("collector request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("collector rejected {endpoint} with {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
}

impl CollectorError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
        }
    }
}

pub type CollectorResult<T> = std::result::Result<T, CollectorError>;
