//! Domain layer: request model, validated literals, and output records.
//!
//! Everything in this module is plain data. Parsing and validation happen
//! here so that the translator only ever sees well-formed values.

pub mod connection_id;
pub mod duration;
pub mod field_allow_list;
pub mod query_request;
pub mod record;

pub use connection_id::ConnectionId;
pub use duration::{DurationUnit, FluxDuration};
pub use field_allow_list::FieldAllowList;
pub use query_request::QueryRequest;
pub use record::Record;
