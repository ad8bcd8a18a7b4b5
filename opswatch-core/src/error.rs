use thiserror::Error;

pub type OpswatchResult<T> = Result<T, OpswatchError>;

#[derive(Error, Debug)]
pub enum OpswatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No customer entry matches '{0}'")]
    CustomerNotFound(String),

    #[error("Unknown notification interval code '{0}'")]
    UnknownInterval(String),

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Feed item missing {0}")]
    MalformedItem(&'static str),

    #[error("Vendor error: {0}")]
    Vendor(String),

    #[error("{0}")]
    Other(String),
}
