//! Cross-cutting error types for Harvest.
//!
//! Domain-specific errors (`DorkError`, `PortalError`, `HostError`) live in
//! their own crates. The binaries converge everything into `anyhow`.

use thiserror::Error;

/// Errors raised while building core types from host data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A lookup row is missing a column the type cannot live without.
    #[error("lookup row is missing required column '{column}'")]
    MissingColumn { column: &'static str },
}

/// Errors raised while rendering a query template against an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template names a placeholder the entity does not carry.
    #[error("placeholder '{0}' is not an attribute of the entity")]
    MissingPlaceholder(String),

    /// The template itself cannot be parsed.
    #[error("malformed template at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
}
