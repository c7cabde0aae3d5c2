use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("consent mapping must contain at least one field")]
    EmptyMapping,
    #[error("duplicate target property in consent mapping: {0}")]
    DuplicateTarget(String),
    #[error("invalid consent mapping entry: '{0}' (expected source=target)")]
    InvalidMappingEntry(String),
    #[error("invalid run request: {0}")]
    InvalidRequest(String),
}
