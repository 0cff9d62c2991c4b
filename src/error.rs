use thiserror::Error;

/// Invalid or unsupported input in either accepted schema shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown value '{value}' for field '{field}'")]
    UnknownEnum { field: String, value: String },

    #[error("Unknown action slot '{0}'")]
    UnknownSlot(String),

    #[error("Unknown axis direction '{direction}' in '{binding}'")]
    UnknownDirection { binding: String, direction: String },

    #[error("Binding '{binding}' references unresolvable key '{key}'")]
    UnresolvableKey { binding: String, key: String },

    #[error("Binding '{0}' has no key")]
    MissingKey(String),

    #[error("Binding '{binding}' has the wrong shape: {reason}")]
    WrongShape { binding: String, reason: String },

    #[error("Axes with usage '{usage}' need exactly one primary, found {primaries}")]
    AmbiguousAxisPriority { usage: String, primaries: usize },

    #[error("Metadata given for unbound name '{0}'")]
    MetaWithoutBinding(String),

    #[error("Invalid pair '{pair_id}': {reason}")]
    InvalidPair { pair_id: String, reason: String },

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Malformed input: {0}")]
    Malformed(String),
}

/// Placement could not satisfy the bounds post-condition after re-packing.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot place '{control}' in a {width}x{height} viewport: {reason}")]
pub struct GeometryInvariantError {
    pub control: String,
    pub width: f64,
    pub height: f64,
    pub reason: String,
}

/// Key name outside the fixed vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown key name '{0}'")]
pub struct ResolutionError(pub String);

#[derive(Error, Debug)]
pub enum TouchForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema Error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Geometry Error: {0}")]
    Geometry(#[from] GeometryInvariantError),

    #[error("Resolution Error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Configuration Error: {0}")]
    Config(String),
}

pub type TfResult<T> = Result<T, TouchForgeError>;
