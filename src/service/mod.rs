//! Service layer: request translation.
//!
//! [`QueryTranslator`] turns a validated request into a windowed store
//! query, runs it through the [`crate::store::TelemetryStore`], and flattens
//! the result into [`crate::domain::Record`]s.

pub mod query_translator;

pub use query_translator::QueryTranslator;
