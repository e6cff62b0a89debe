//! Plain/TLS transport, sync and async (§4.F/§4.G, §5).
//!
//! Mirrors the teacher's `conn/tcp_client.rs` split: an enum over a
//! plain socket and a TLS-wrapped one, each exposing `reader()`/`writer()`
//! so the connection layer above can stay transport-agnostic.

#[cfg(feature = "sync")]
mod sync_plain;
#[cfg(feature = "sync")]
mod sync_tls;

#[cfg(feature = "async")]
mod async_plain;
#[cfg(feature = "async")]
mod async_tls;

#[cfg(feature = "sync")]
pub use sync_plain::SyncPlainTcpClient;
#[cfg(feature = "sync")]
pub use sync_tls::SyncTlsTcpClient;

#[cfg(feature = "async")]
pub use async_plain::AsyncPlainTcpClient;
#[cfg(feature = "async")]
pub use async_tls::AsyncTlsTcpClient;

use crate::conn::params::{ConnectParams, Tls};
use crate::error::{QError, QResult};

/// A buffered blocking tcp connection, with or without TLS (§4.F).
#[cfg(feature = "sync")]
#[derive(Debug)]
pub enum SyncTcpClient {
    Plain(SyncPlainTcpClient),
    Tls(SyncTlsTcpClient),
}

#[cfg(feature = "sync")]
impl SyncTcpClient {
    /// Connect, wrapping with TLS if the params request it (§4.F "open").
    pub fn try_new(params: &ConnectParams) -> QResult<Self> {
        match params.tls() {
            Tls::Off => Ok(Self::Plain(SyncPlainTcpClient::try_new(params)?)),
            Tls::On(cfg) => Ok(Self::Tls(SyncTlsTcpClient::try_new(params, cfg.clone())?)),
        }
    }

    pub fn reader(&mut self) -> &mut dyn std::io::Read {
        match self {
            Self::Plain(c) => c.reader(),
            Self::Tls(c) => c.reader(),
        }
    }

    pub fn writer(&mut self) -> &mut dyn std::io::Write {
        match self {
            Self::Plain(c) => c.writer(),
            Self::Tls(c) => c.writer(),
        }
    }

    pub fn s_type(&self) -> &'static str {
        match self {
            Self::Plain(_) => "Plain Sync TCP",
            Self::Tls(_) => "TLS Sync TCP",
        }
    }
}

/// A buffered async tcp connection, with or without TLS (§4.G).
#[cfg(feature = "async")]
#[derive(Debug)]
pub enum AsyncTcpClient {
    Plain(AsyncPlainTcpClient),
    Tls(AsyncTlsTcpClient),
}

#[cfg(feature = "async")]
impl AsyncTcpClient {
    pub async fn try_new(params: &ConnectParams) -> QResult<Self> {
        match params.tls() {
            Tls::Off => Ok(Self::Plain(AsyncPlainTcpClient::try_new(params).await?)),
            Tls::On(cfg) => Ok(Self::Tls(
                AsyncTlsTcpClient::try_new(params, cfg.clone()).await?,
            )),
        }
    }

    pub fn reader_mut(&mut self) -> &mut (dyn tokio::io::AsyncRead + Unpin + Send) {
        match self {
            Self::Plain(c) => c.reader_mut(),
            Self::Tls(c) => c.reader_mut(),
        }
    }

    pub fn writer_mut(&mut self) -> &mut (dyn tokio::io::AsyncWrite + Unpin + Send) {
        match self {
            Self::Plain(c) => c.writer_mut(),
            Self::Tls(c) => c.writer_mut(),
        }
    }

    pub async fn shutdown(&mut self) -> QResult<()> {
        use tokio::io::AsyncWriteExt;
        self.writer_mut().shutdown().await.map_err(QError::Io)
    }

    pub fn s_type(&self) -> &'static str {
        match self {
            Self::Plain(_) => "Plain Async TCP",
            Self::Tls(_) => "TLS Async TCP",
        }
    }
}
