//! A cooperative (tokio) connection to the server (§4.G, §5).
//!
//! Grounded on `connection/async_conn.py::AsyncConnection`. Unlike the
//! sync side, the reference's async `receive()` already decompresses —
//! this module keeps that behavior, now matched by the sync transport.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use log::{debug, trace};

use crate::conn::handshake::{build_handshake, parse_handshake_response, DEFAULT_CAPABILITY};
use crate::conn::params::ConnectParams;
use crate::conn::tcp_client::AsyncTcpClient;
use crate::error::{QError, QResult};
use crate::value::Value;
use crate::wire::{self, Deserializer, MsgType, Serializer, HEADER_SIZE};

/// A single async IPC connection (§4.G "AsyncConnection" API).
#[derive(Debug)]
pub struct AsyncConnection {
    params: ConnectParams,
    client: AsyncTcpClient,
    open: bool,
    ser: Serializer,
}

impl AsyncConnection {
    /// # Errors
    /// See [`crate::sync::connection::Connection::open`] — identical
    /// failure modes, driven through tokio instead of blocking I/O.
    pub async fn open(params: ConnectParams) -> QResult<Self> {
        debug!("connecting to {params}");
        let mut client = AsyncTcpClient::try_new(&params).await?;
        Self::handshake(&mut client, &params).await?;
        debug!("connected to {params} via {}", client.s_type());
        Ok(Self {
            params,
            client,
            open: true,
            ser: Serializer::new(),
        })
    }

    async fn handshake(client: &mut AsyncTcpClient, params: &ConnectParams) -> QResult<()> {
        let addr = params.addr();
        let request = build_handshake(params.username(), params.password(), DEFAULT_CAPABILITY);
        client
            .writer_mut()
            .write_all(&request)
            .await
            .map_err(|e| QError::Connection {
                addr: addr.clone(),
                source: e,
            })?;

        let mut reply = [0u8; 1];
        let n = client
            .reader_mut()
            .read(&mut reply)
            .await
            .map_err(|e| QError::Connection {
                addr: addr.clone(),
                source: e,
            })?;
        let body: &[u8] = if n == 0 { &[] } else { &reply };
        parse_handshake_response(body, &addr)?;
        Ok(())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub async fn ping(&mut self) -> bool {
        self.query("1b", &[]).await.is_ok()
    }

    pub async fn close(&mut self) {
        self.open = false;
        let _ = self.client.shutdown().await;
    }

    async fn send(&mut self, value: &Value, msg_type: MsgType) -> QResult<()> {
        if !self.open {
            return Err(QError::ConnectionClosed {
                addr: self.params.addr(),
            });
        }
        let msg = self.ser.serialize_message(value, msg_type as u8)?;
        trace!("sending {} bytes", msg.len());
        self.client
            .writer_mut()
            .write_all(&msg)
            .await
            .map_err(|e| {
                self.open = false;
                QError::Connection {
                    addr: self.params.addr(),
                    source: e,
                }
            })?;
        Ok(())
    }

    async fn recv_exact(&mut self, n: usize) -> QResult<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = self
                .client
                .reader_mut()
                .read(&mut buf[filled..])
                .await
                .map_err(|e| {
                    self.open = false;
                    QError::Connection {
                        addr: self.params.addr(),
                        source: e,
                    }
                })?;
            if read == 0 {
                self.open = false;
                return Err(QError::ConnectionClosed {
                    addr: self.params.addr(),
                });
            }
            filled += read;
        }
        Ok(buf)
    }

    async fn receive(&mut self) -> QResult<Value> {
        let header_bytes = self.recv_exact(HEADER_SIZE).await?;
        let header = wire::unpack_header(&header_bytes)?;
        let remaining = header.total_length as usize - HEADER_SIZE;
        let body = self.recv_exact(remaining).await?;

        let mut raw = header_bytes;
        raw.extend_from_slice(&body);
        let raw = if header.compressed {
            wire::decompress(&raw)?
        } else {
            raw
        };
        let (_msg_type, value) = Deserializer::deserialize_message(&raw)?;
        trace!("received {} bytes", raw.len());
        Ok(value)
    }

    /// # Errors
    /// Transport errors, or `QError::Remote` if the server replies
    /// with an error atom.
    pub async fn send_and_receive(&mut self, value: &Value) -> QResult<Value> {
        self.send(value, MsgType::Sync).await?;
        let response = self.receive().await?;
        if let Value::Error(msg) = response {
            return Err(QError::Remote(msg));
        }
        Ok(response)
    }

    /// # Errors
    /// See [`Self::send_and_receive`].
    pub async fn query(&mut self, expr: &str, args: &[Value]) -> QResult<Value> {
        let request = if args.is_empty() {
            Value::Symbol(expr.to_string())
        } else {
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Value::Symbol(expr.to_string()));
            items.extend_from_slice(args);
            Value::List(items)
        };
        self.send_and_receive(&request).await
    }

    /// Listen for one asynchronous server-push message (§4.S
    /// subscription listener). A push frame is `msg_type == 0` and its
    /// body is `(function_name; table_name; payload)` or
    /// `(table_name; payload)`.
    ///
    /// # Errors
    /// Transport errors while waiting for the next frame.
    pub async fn listen_once(&mut self) -> QResult<Value> {
        self.receive().await
    }
}
