// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use std::io;

/// Why a single connection did not complete its exchange.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("could not resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("{host}:{port} did not resolve to any address")]
    NoAddress { host: String, port: u16 },

    #[error("connect failed: {0}")]
    Connect(io::Error),

    #[error("could not set socket options: {0}")]
    Configure(io::Error),

    #[error("send failed: {0}")]
    Send(io::Error),

    #[error("receive failed: {0}")]
    Receive(io::Error),

    #[error("could not decode response: {0}")]
    Decode(std::str::Utf8Error),

    #[error("could not spawn connection thread: {0}")]
    Spawn(io::Error),

    #[error("connection thread panicked")]
    Panicked,
}
