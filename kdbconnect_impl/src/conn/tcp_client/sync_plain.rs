//! Plain blocking TCP transport (§4.F).

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::conn::params::ConnectParams;
use crate::error::{QError, QResult};

#[derive(Debug)]
pub struct SyncPlainTcpClient {
    stream: TcpStream,
}

impl SyncPlainTcpClient {
    pub fn try_new(params: &ConnectParams) -> QResult<Self> {
        let addr = params.addr();
        let stream = match params.timeout() {
            Some(timeout) => connect_with_timeout(&addr, timeout)?,
            None => TcpStream::connect(&addr).map_err(|e| connection_error(&addr, e))?,
        };
        stream
            .set_nodelay(true)
            .map_err(|e| connection_error(&addr, e))?;
        if let Some(timeout) = params.timeout() {
            stream
                .set_read_timeout(Some(timeout))
                .map_err(|e| connection_error(&addr, e))?;
        }
        Ok(Self { stream })
    }

    pub fn reader(&mut self) -> &mut dyn Read {
        &mut self.stream
    }

    pub fn writer(&mut self) -> &mut dyn Write {
        &mut self.stream
    }

    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

fn connect_with_timeout(addr: &str, timeout: Duration) -> QResult<TcpStream> {
    use std::net::ToSocketAddrs;
    let socket_addr = addr
        .to_socket_addrs()
        .map_err(|e| connection_error(addr, e))?
        .next()
        .ok_or_else(|| QError::Connection {
            addr: addr.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved"),
        })?;
    TcpStream::connect_timeout(&socket_addr, timeout).map_err(|e| connection_error(addr, e))
}

fn connection_error(addr: &str, source: std::io::Error) -> QError {
    QError::Connection {
        addr: addr.to_string(),
        source,
    }
}
