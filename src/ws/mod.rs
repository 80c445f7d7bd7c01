//! WebSocket layer: upgrade handling, per-connection loop, message types.
//!
//! Clients connect to `/` (or `/ws`), send query requests as JSON, and
//! receive one `bulk` response per successfully handled request.

pub mod connection;
pub mod handler;
pub mod messages;
