//! # harvest-portal
//!
//! Client for the Check Point Harmony portal.
//!
//! [`PortalSession`] logs in once with an email and password and carries the
//! returned CSRF token on every later request. The threat-hunting query pulls
//! active-attack records for a lookback window.

mod error;
pub mod payloads;
pub mod session;
pub mod threat_hunting;

pub use error::PortalError;
pub use payloads::DateRange;
pub use session::PortalSession;
