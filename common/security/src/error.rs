use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("missing acting user identifier")]
    MissingActor,
    #[error("malformed identity header")]
    InvalidHeader,
    #[error("unauthorized - missing required role")]
    Forbidden,
}
