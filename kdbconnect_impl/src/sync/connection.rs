//! A blocking connection to the server (§4.F, §5).
//!
//! Grounded on `connection/sync_conn.py::SyncConnection`, but corrected:
//! the reference's sync path never decompresses an inbound message
//! (only its async counterpart does) — SPEC_FULL.md calls this out as
//! a defect in the reference, not a semantics to preserve, so both
//! transports decompress here.

use std::io::{Read, Write};

use log::{debug, trace};

use crate::conn::handshake::{build_handshake, parse_handshake_response, DEFAULT_CAPABILITY};
use crate::conn::params::ConnectParams;
use crate::conn::tcp_client::SyncTcpClient;
use crate::error::{QError, QResult};
use crate::value::Value;
use crate::wire::{self, Deserializer, MsgType, Serializer, HEADER_SIZE};

/// A single blocking IPC connection (§4.F "Connection" API).
#[derive(Debug)]
pub struct Connection {
    params: ConnectParams,
    client: SyncTcpClient,
    open: bool,
    ser: Serializer,
}

impl Connection {
    /// Open a TCP (optionally TLS) connection and complete the
    /// handshake. Closes the socket and returns an error on any
    /// failure along the way, rather than leaving a half-open state.
    ///
    /// # Errors
    /// `QError::Connection`/`QError::Tls` if the transport can't be
    /// established; `QError::Authentication`/`QError::Handshake` if
    /// the server rejects the handshake.
    pub fn open(params: ConnectParams) -> QResult<Self> {
        debug!("connecting to {params}");
        let mut client = SyncTcpClient::try_new(&params)?;
        Self::handshake(&mut client, &params)?;
        debug!("connected to {params} via {}", client.s_type());
        Ok(Self {
            params,
            client,
            open: true,
            ser: Serializer::new(),
        })
    }

    fn handshake(client: &mut SyncTcpClient, params: &ConnectParams) -> QResult<()> {
        let addr = params.addr();
        let request = build_handshake(params.username(), params.password(), DEFAULT_CAPABILITY);
        client
            .writer()
            .write_all(&request)
            .map_err(|e| QError::Connection {
                addr: addr.clone(),
                source: e,
            })?;

        let mut reply = [0u8; 1];
        let n = client
            .reader()
            .read(&mut reply)
            .map_err(|e| QError::Connection {
                addr: addr.clone(),
                source: e,
            })?;
        let body: &[u8] = if n == 0 { &[] } else { &reply };
        parse_handshake_response(body, &addr)?;
        Ok(())
    }

    /// Whether the underlying socket is believed to still be usable.
    /// Cheap and local: does not round-trip to the server.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Attempt a no-op round trip to confirm liveness (§4.H pool
    /// health-check).
    pub fn ping(&mut self) -> bool {
        self.query("1b", &[]).is_ok()
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    fn send(&mut self, value: &Value, msg_type: MsgType) -> QResult<()> {
        if !self.open {
            return Err(QError::ConnectionClosed {
                addr: self.params.addr(),
            });
        }
        let msg = self.ser.serialize_message(value, msg_type as u8)?;
        trace!("sending {} bytes", msg.len());
        self.client.writer().write_all(&msg).map_err(|e| {
            self.open = false;
            QError::Connection {
                addr: self.params.addr(),
                source: e,
            }
        })?;
        Ok(())
    }

    fn recv_exact(&mut self, n: usize) -> QResult<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = self
                .client
                .reader()
                .read(&mut buf[filled..])
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

    fn receive(&mut self) -> QResult<Value> {
        let header_bytes = self.recv_exact(HEADER_SIZE)?;
        let header = wire::unpack_header(&header_bytes)?;
        let remaining = header.total_length as usize - HEADER_SIZE;
        let body = self.recv_exact(remaining)?;

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

    /// Send a value and wait for the server's response (§4.F "query").
    ///
    /// # Errors
    /// Transport errors, or `QError::Remote` if the server replies
    /// with an error atom.
    pub fn send_and_receive(&mut self, value: &Value) -> QResult<Value> {
        self.send(value, MsgType::Sync)?;
        let response = self.receive()?;
        if let Value::Error(msg) = response {
            return Err(QError::Remote(msg));
        }
        Ok(response)
    }

    /// Evaluate a q expression, with optional positional arguments
    /// (`(expr;arg1;arg2;...)` when any are given, matching
    /// `SyncConnection.query`).
    ///
    /// # Errors
    /// See [`Self::send_and_receive`].
    pub fn query(&mut self, expr: &str, args: &[Value]) -> QResult<Value> {
        let request = if args.is_empty() {
            Value::Symbol(expr.to_string())
        } else {
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Value::Symbol(expr.to_string()));
            items.extend_from_slice(args);
            Value::List(items)
        };
        self.send_and_receive(&request)
    }

    /// Block for one asynchronous server-push message (§4.S
    /// subscription listener). A push frame is `msg_type == 0` and its
    /// body is `(function_name; table_name; payload)` or
    /// `(table_name; payload)`.
    ///
    /// # Errors
    /// Transport errors while waiting for the next frame.
    pub fn listen_once(&mut self) -> QResult<Value> {
        self.receive()
    }
}
