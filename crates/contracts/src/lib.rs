//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace:
//! the decoded record handed over by the capture pipeline, the filter
//! modes and output formats a sink can be configured with, and the
//! configuration blueprint.
//!
//! This crate has no runtime dependencies; business crates depend on it,
//! never the other way around.

mod blueprint;
mod endpoint;
mod error;
mod filter_mode;
mod record;

pub use blueprint::*;
pub use endpoint::SyslogEndpoint;
pub use error::*;
pub use filter_mode::*;
pub use record::*;
