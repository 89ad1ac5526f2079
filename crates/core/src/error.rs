#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to communicate with CDR: {0}")]
    Communication(reqwest::Error),
    #[error("failed to parse CDR response: {0}")]
    Parse(serde_json::Error),
    #[error("CDR session response did not contain a sessionId")]
    MissingSessionId,
    #[error("CDR rejected session request with HTTP {status}")]
    SessionRejected { status: u16 },
    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    #[error("openEHR error: {0}")]
    Openehr(#[from] openehr::OpenEhrError),
}

pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;
