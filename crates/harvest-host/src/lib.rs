//! # harvest-host
//!
//! The host platform side of a connector:
//! - [`scheme`]: the `<scheme>` document printed on `--scheme`
//! - [`definition`]: `<input>` and `<items>` documents read from stdin
//! - [`event`]: the `<stream>` of events written to stdout
//! - [`service`]: splunkd REST calls (credential store, oneshot searches)
//! - [`script`]: the [`ModularInput`] trait and the mode dispatcher
//! - [`validate`], [`timestamp`]: stanza parameter checks and event time
//!   promotion

pub mod definition;
mod error;
pub mod event;
pub mod scheme;
pub mod script;
pub mod service;
pub mod timestamp;
pub mod validate;

pub use definition::{InputDefinition, Params, Stanza, ValidationDefinition};
pub use error::HostError;
pub use event::{Event, EventWriter};
pub use scheme::{Argument, DataType, Scheme};
pub use script::{Mode, ModularInput, run};
pub use service::HostService;
