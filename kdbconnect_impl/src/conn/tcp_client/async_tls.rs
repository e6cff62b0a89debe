//! TLS-wrapped async TCP transport (§4.G).

use std::sync::Arc;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::conn::params::ConnectParams;
use crate::error::{QError, QResult};

use super::async_plain::AsyncPlainTcpClient;

#[derive(Debug)]
pub struct AsyncTlsTcpClient {
    reader: ReadHalf<TlsStream<TcpStream>>,
    writer: WriteHalf<TlsStream<TcpStream>>,
}

impl AsyncTlsTcpClient {
    pub async fn try_new(params: &ConnectParams, config: Arc<rustls::ClientConfig>) -> QResult<Self> {
        let plain = AsyncPlainTcpClient::try_new(params).await?;
        let tcp_stream = plain.into_inner()?;

        let server_name = rustls::ServerName::try_from(params.host())
            .map_err(|_| QError::Tls(format!("invalid server name: {}", params.host())))?;
        let connector = TlsConnector::from(config);
        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| QError::Tls(e.to_string()))?;

        let (reader, writer) = tokio::io::split(tls_stream);
        Ok(Self { reader, writer })
    }

    pub fn reader_mut(&mut self) -> &mut ReadHalf<TlsStream<TcpStream>> {
        &mut self.reader
    }

    pub fn writer_mut(&mut self) -> &mut WriteHalf<TlsStream<TcpStream>> {
        &mut self.writer
    }
}
