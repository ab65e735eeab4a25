use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Sale payload must be a JSON object, found [{found}]")]
    NotAnObject {
        found: String
    }
}

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Sales source unavailable: {0}")]
    Unavailable(String),
    #[error("Sales source returned an unreadable response: {0}")]
    InvalidResponse(String),
    #[error("Sales source did not answer within {0:?}")]
    Timeout(std::time::Duration)
}
