//! Error types for streaming and type registration

/// Errors while streaming a value's fields in or out
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Input was not valid for the expected format
    #[error("malformed stream data: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Input parsed but violated a type-specific rule
    #[error("invalid field '{field}': {message}")]
    InvalidField {
        /// Offending field name
        field: String,
        /// What the field violated
        message: String,
    },
}

impl StreamError {
    /// Create invalid field error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors from the type registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No factory registered for type name
    #[error("unknown type name: '{type_name}'")]
    UnknownType {
        /// Name found in the envelope
        type_name: String,
    },

    /// Type name registered twice
    #[error("type name already registered: '{type_name}'")]
    DuplicateType {
        /// Name already taken
        type_name: String,
    },

    /// Resurrected object is not of the requested type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Type the caller asked for
        expected: String,
        /// Type the envelope named
        actual: String,
    },

    /// Envelope or payload could not be decoded
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
}

impl RegistryError {
    /// Create unknown type error
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Stream(StreamError::Malformed(err))
    }
}

/// Result type alias for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
