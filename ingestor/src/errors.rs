use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Telemetry store lock poisoned")]
    StatePoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
