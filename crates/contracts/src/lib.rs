//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the service.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Model
//! - `Record` carries a payload and the `DestinationKey` it is routed by
//! - `RecordSink` is the durable append target a flush writes to

mod blueprint;
mod destination;
mod engine_config;
mod error;
mod record;
mod sink;

pub use blueprint::*;
pub use destination::DestinationKey;
pub use engine_config::*;
pub use error::*;
pub use record::Record;
pub use sink::*;
