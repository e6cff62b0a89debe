//! Blocking connection API (§4.F, §5 "Use case: synchronous query").

pub mod connection;

pub use connection::Connection;
