//! Error types for protonorm code generation.
//!
//! Everything that can go wrong while turning descriptors into source is an
//! [`Error`]. Failures of the generated routines at runtime are a separate
//! type, [`ValidationError`](crate::validate::ValidationError).

use thiserror::Error;

/// Result type alias for generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all generation-time operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The plugin request could not be decoded
    #[cfg(feature = "codegen")]
    #[error("failed to decode CodeGeneratorRequest: {0}")]
    RequestDecode(#[from] prost::DecodeError),

    /// Invalid protobuf wire format
    #[error("invalid protobuf wire format at offset {offset}: {details}")]
    InvalidWireFormat {
        /// Byte offset where the error occurred
        offset: usize,
        /// Detailed description of the issue
        details: String,
    },

    /// Failed to decode varint
    #[error("failed to decode varint at offset {offset}: buffer too small or invalid encoding")]
    VarintDecode {
        /// Byte offset where the error occurred
        offset: usize,
    },

    /// Invalid field number in the wire data
    #[error("invalid field number {number}: must be between 1 and {max}")]
    InvalidFieldNumber {
        /// The invalid field number
        number: u32,
        /// Maximum valid field number
        max: u32,
    },

    /// Failed to build a descriptor pool from the supplied files
    #[error("failed to build descriptor pool: {0}")]
    DescriptorBuild(String),

    /// A file asked for generation is not part of the descriptor set
    #[error("file '{name}' is not present in the descriptor set")]
    FileNotFound {
        /// Name of the missing proto file
        name: String,
    },

    /// Rules are attached to a field whose shape cannot carry them
    #[error("field '{field}' of message '{message}' has validation rules but its kind ({kind}) is not supported")]
    UnsupportedFieldKind {
        /// Fully-qualified message name
        message: String,
        /// Field name as declared in the schema
        field: String,
        /// Human-readable description of the field shape
        kind: String,
    },

    /// Rules are present but cannot be turned into a constraint
    #[error("invalid rules on field '{field}' of message '{message}': {details}")]
    InvalidConstraint {
        /// Fully-qualified message name
        message: String,
        /// Field name as declared in the schema
        field: String,
        /// What is wrong with the rules
        details: String,
    },

    /// Malformed plugin parameter
    #[error("invalid plugin parameter '{parameter}': {details}")]
    InvalidParameter {
        /// The offending `key=value` pair
        parameter: String,
        /// What is wrong with it
        details: String,
    },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new wire format error
    pub fn invalid_wire_format(offset: usize, details: impl Into<String>) -> Self {
        Self::InvalidWireFormat {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new varint decode error
    pub fn varint_decode(offset: usize) -> Self {
        Self::VarintDecode { offset }
    }

    /// Creates a new descriptor build error
    pub fn descriptor_build(msg: impl Into<String>) -> Self {
        Self::DescriptorBuild(msg.into())
    }

    /// Creates a new missing file error
    pub fn file_not_found(name: impl Into<String>) -> Self {
        Self::FileNotFound { name: name.into() }
    }

    /// Creates a new unsupported field kind error
    pub fn unsupported_field_kind(
        message: impl Into<String>,
        field: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self::UnsupportedFieldKind {
            message: message.into(),
            field: field.into(),
            kind: kind.into(),
        }
    }

    /// Creates a new invalid constraint error
    pub fn invalid_constraint(
        message: impl Into<String>,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::InvalidConstraint {
            message: message.into(),
            field: field.into(),
            details: details.into(),
        }
    }

    /// Creates a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            details: details.into(),
        }
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the error comes from the schema rather than from the
    /// request plumbing. Schema errors are the ones a user fixes in `.proto`.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFieldKind { .. } | Self::InvalidConstraint { .. }
        )
    }
}
