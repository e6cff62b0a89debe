//! Async connection API (§4.G, §5 "Use case: async streaming fan-out").

pub mod connection;

pub use connection::AsyncConnection;
