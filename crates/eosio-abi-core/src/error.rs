/// Error types for ABI resolution and the binary codec
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AbiError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    // Resolution errors
    #[error("Unknown primitive type: {0}")]
    UnknownPrimitiveType(String),

    #[error("Malformed type string: '{0}'")]
    MalformedTypeString(String),

    #[error("Cyclic inheritance: {0}")]
    CyclicInheritance(String),

    #[error("Alias '{alias}' targets unresolved type '{target}'")]
    UnresolvedAliasTarget { alias: String, target: String },

    #[error("Struct '{name}' extends unknown base '{base}'")]
    UnresolvedBase { name: String, base: String },

    #[error("Cyclic alias chain: {0}")]
    CyclicAlias(String),

    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String),

    #[error("Struct '{name}' declares field '{field}' more than once")]
    DuplicateField { name: String, field: String },

    // Codec errors
    #[error("Schema field mismatch at '{path}': {reason}")]
    SchemaFieldMismatch { path: String, reason: String },

    #[error("Truncated buffer: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Unknown struct: {0}")]
    UnknownStruct(String),

    #[error("Variant '{variant}' has no member with tag {tag}")]
    InvalidVariantTag { variant: String, tag: u32 },

    #[error("Invalid {type_name} value: {reason}")]
    InvalidValue { type_name: String, reason: String },

    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    // Contract lookups and input parsing
    #[error("Action '{0}' not found in ABI")]
    UnknownAction(String),

    #[error("Table '{0}' not found in ABI")]
    UnknownTable(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid ABI JSON: {0}")]
    InvalidJson(String),
}

impl AbiError {
    pub(crate) fn mismatch(path: &str, reason: impl Into<String>) -> Self {
        AbiError::SchemaFieldMismatch {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(type_name: &str, reason: impl Into<String>) -> Self {
        AbiError::InvalidValue {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach a field path to an error raised by a primitive codec
    pub(crate) fn at(self, path: &str) -> Self {
        match self {
            AbiError::SchemaFieldMismatch { reason, .. } => AbiError::SchemaFieldMismatch {
                path: path.to_string(),
                reason,
            },
            AbiError::InvalidValue { type_name, reason } => AbiError::InvalidValue {
                type_name,
                reason: format!("{} (at '{}')", reason, path),
            },
            other => other,
        }
    }
}

impl From<hex::FromHexError> for AbiError {
    fn from(e: hex::FromHexError) -> Self {
        AbiError::InvalidHex(e.to_string())
    }
}
