use thiserror::Error;

/// A lookup in a [`crate::BiMap`] hit a value that has no counterpart.
///
/// `known` lists the keys of the direction that was queried, in insertion order,
/// so a configuration gap between the domain enums and a provider is visible
/// straight from the error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value {value} not found in mapping, known values: [{}]", .known.join(", "))]
pub struct MappingNotFoundError {
    pub value: String,
    pub known: Vec<String>,
}
