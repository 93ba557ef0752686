//! WebSocket layer: the inventory watch stream.
//!
//! `/api/v1/watch` carries server-to-client events only. Client frames
//! are read solely to notice the connection closing.

pub mod connection;
pub mod handler;
pub mod messages;
