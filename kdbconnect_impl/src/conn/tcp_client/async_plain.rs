//! Plain async TCP transport (§4.G).

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::conn::params::ConnectParams;
use crate::error::{QError, QResult};

#[derive(Debug)]
pub struct AsyncPlainTcpClient {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl AsyncPlainTcpClient {
    pub async fn try_new(params: &ConnectParams) -> QResult<Self> {
        let addr = params.addr();
        let connect = TcpStream::connect(&addr);
        let stream = match params.timeout() {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| QError::Connection {
                    addr: addr.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
                })?
                .map_err(|e| connection_error(&addr, e))?,
            None => connect.await.map_err(|e| connection_error(&addr, e))?,
        };
        stream
            .set_nodelay(true)
            .map_err(|e| connection_error(&addr, e))?;
        let (reader, writer) = stream.into_split();
        Ok(Self { reader, writer })
    }

    pub fn reader_mut(&mut self) -> &mut OwnedReadHalf {
        &mut self.reader
    }

    pub fn writer_mut(&mut self) -> &mut OwnedWriteHalf {
        &mut self.writer
    }

    /// Rejoin the split halves back into a single stream, e.g. to hand
    /// off to a TLS connector.
    pub fn into_inner(self) -> QResult<TcpStream> {
        self.reader
            .reunite(self.writer)
            .map_err(|e| QError::Tls(e.to_string()))
    }
}

fn connection_error(addr: &str, source: std::io::Error) -> QError {
    QError::Connection {
        addr: addr.to_string(),
        source,
    }
}
