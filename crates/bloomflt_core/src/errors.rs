use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloomError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persist: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("fold factor {factor} must be positive and divide the filter size ({size} bytes)")]
    InvalidFactor { factor: usize, size: u64 },

    #[error("filter must hold at least one byte")]
    EmptyFilter,

    #[error("unable to read header (read {0} bytes)")]
    ShortHeader(usize),

    #[error("invalid header {0:?}")]
    BadMagic([u8; 8]),

    #[error("truncated payload: expected {expected} bytes, got {got}")]
    Truncated { expected: u64, got: u64 },

    #[error("cannot allocate a {0}-byte filter")]
    TooLarge(u64),

    #[error("header declares an empty payload")]
    EmptyPayload,
}

impl BloomError {
    /// Caller passed a bad factor or size.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, BloomError::InvalidFactor { .. } | BloomError::EmptyFilter)
    }

    /// The byte stream is not a well-formed filter.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            BloomError::ShortHeader(_)
                | BloomError::BadMagic(_)
                | BloomError::Truncated { .. }
                | BloomError::EmptyPayload
        )
    }
}

pub type Result<T> = std::result::Result<T, BloomError>;
