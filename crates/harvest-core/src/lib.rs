//! # harvest-core
//!
//! Core types shared by the Harvest connectors.
//!
//! This crate provides the foundational types used across all Harvest crates:
//! - Entities and query definitions loaded from host lookup tables
//! - The backend service selector and its parsing rules
//! - Result records (a tagged union over backend type) and their metadata
//! - Placeholder templates used to turn a query definition into a dork
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod records;
pub mod template;

pub use entities::{Entity, QueryDefinition, is_disabled_flag};
pub use enums::Service;
pub use errors::{CoreError, TemplateError};
pub use records::{
    CertificateRecord, CtLogEntry, CustomSearchItem, CustomSearchRecord, RecordMetadata,
    ResultRecord, Retrieved, WebEngine, WebSearchRecord,
};
