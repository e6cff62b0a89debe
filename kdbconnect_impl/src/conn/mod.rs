//! Connection parameters, handshake, transport, pooling, and retry
//! (§4.E-§4.I, §6 Connection-spec/Pool/Retry-policy API).

pub mod handshake;
pub mod params;
#[cfg(any(feature = "sync", feature = "async"))]
pub mod pool;
pub mod retry;
pub mod tcp_client;

pub use params::{ConnectParams, ConnectParamsBuilder, IntoConnectParams, Tls};
pub use retry::RetryPolicy;
