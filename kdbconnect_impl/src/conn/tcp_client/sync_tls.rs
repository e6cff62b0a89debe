//! TLS-wrapped blocking TCP transport (§4.F).
//!
//! Grounded on the teacher's `sync_tls_tcp_client.rs`, adapted to the
//! `rustls` 0.21 API (`rustls::ServerName`, not the `pki_types` module
//! that newer rustls versions introduced).

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use rustls::{ClientConnection, StreamOwned};

use crate::conn::params::ConnectParams;
use crate::error::{QError, QResult};

use super::sync_plain::SyncPlainTcpClient;

#[derive(Debug)]
pub struct SyncTlsTcpClient {
    stream: StreamOwned<ClientConnection, TcpStream>,
}

impl SyncTlsTcpClient {
    pub fn try_new(params: &ConnectParams, config: Arc<rustls::ClientConfig>) -> QResult<Self> {
        let plain = SyncPlainTcpClient::try_new(params)?;
        let tcp_stream = plain.into_inner();

        let server_name = rustls::ServerName::try_from(params.host())
            .map_err(|_| QError::Tls(format!("invalid server name: {}", params.host())))?;
        let conn = ClientConnection::new(config, server_name)
            .map_err(|e| QError::Tls(e.to_string()))?;

        Ok(Self {
            stream: StreamOwned::new(conn, tcp_stream),
        })
    }

    pub fn reader(&mut self) -> &mut dyn Read {
        &mut self.stream
    }

    pub fn writer(&mut self) -> &mut dyn Write {
        &mut self.stream
    }
}
