use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    #[diagnostic(code(paysettle::validation))]
    ValidationError(String),

    #[error("Invalid state: {0}")]
    #[diagnostic(code(paysettle::invalid_state))]
    InvalidStateError(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(paysettle::not_found))]
    NotFoundError(String),

    #[error("Conflict: {0}")]
    #[diagnostic(code(paysettle::conflict))]
    ConflictError(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(paysettle::internal))]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    #[error("CSV error: {0}")]
    #[diagnostic(code(paysettle::csv))]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(paysettle::io))]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    #[diagnostic(code(paysettle::storage))]
    StorageError(#[from] rocksdb::Error),
}

impl PaymentError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into().into())
    }

    /// HTTP status the routing layer answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) | Self::InvalidStateError(_) => 400,
            Self::NotFoundError(_) => 404,
            Self::ConflictError(_) => 409,
            _ => 500,
        }
    }

    /// Business-rule failures are the caller's to fix; everything else is infrastructure.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidStateError(_)
                | Self::NotFoundError(_)
                | Self::ConflictError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
