// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use log::*;

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Args;
use crate::error::ConnectionError;

/// Everything a single connection needs to know. Built once and shared by every connection
/// thread.
#[derive(Debug, Clone)]
pub struct Plan {
    pub host: String,
    pub port: u16,
    pub payload: Vec<u8>,
    pub recv_size: usize,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

impl From<&Args> for Plan {
    fn from(args: &Args) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            payload: args.payload.clone().into_bytes(),
            recv_size: args.recv_size,
            connect_timeout: args.connect_timeout(),
            read_timeout: args.read_timeout(),
        }
    }
}

/// The text one receive produced. Empty if the peer hung up without sending anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    text: String,
}

impl Response {
    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A reply that is not valid UTF-8, including one cut mid-character by the receive bound, is an
/// error rather than a response.
impl TryFrom<Vec<u8>> for Response {
    type Error = ConnectionError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        let text = String::from_utf8(bytes).map_err(|e| ConnectionError::Decode(e.utf8_error()))?;
        Ok(Self { text })
    }
}

/// Connect, send the payload, receive once and close.
pub fn run_connection(plan: &Plan) -> Result<Response, ConnectionError> {
    let mut stream = connect(plan)?;

    stream
        .set_read_timeout(plan.read_timeout)
        .map_err(ConnectionError::Configure)?;

    stream
        .write_all(&plan.payload)
        .map_err(ConnectionError::Send)?;
    trace!("Sent {} bytes", plan.payload.len());

    let mut buf = vec![0; plan.recv_size];
    let n_read = stream.read(&mut buf).map_err(ConnectionError::Receive)?;
    buf.truncate(n_read);
    trace!("Received {n_read} bytes");

    // The stream is closed when it goes out of scope.
    Response::try_from(buf)
}

fn connect(plan: &Plan) -> Result<TcpStream, ConnectionError> {
    let addrs: Vec<SocketAddr> = (plan.host.as_str(), plan.port)
        .to_socket_addrs()
        .map_err(|source| ConnectionError::Resolve {
            host: plan.host.clone(),
            port: plan.port,
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ConnectionError::NoAddress {
            host: plan.host.clone(),
            port: plan.port,
        });
    }

    connect_any(&addrs, plan.connect_timeout).map_err(ConnectionError::Connect)
}

/// Try `addrs` in order; the first that accepts wins, otherwise the last error is returned.
fn connect_any(addrs: &[SocketAddr], timeout: Option<Duration>) -> io::Result<TcpStream> {
    let mut last_err = io::Error::new(io::ErrorKind::InvalidInput, "no addresses to connect to");
    for addr in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout),
            None => TcpStream::connect(addr),
        };

        match attempt {
            Ok(stream) => {
                debug!("Connected to {addr}");
                return Ok(stream);
            }
            Err(e) => {
                debug!("Connecting to {addr} failed: {e}");
                last_err = e;
            }
        }
    }

    Err(last_err)
}
