// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use clap::Parser;

use std::time::Duration;

/// One local address can hold at most this many connections to a single host and port.
pub const MAX_CONNECTIONS: i64 = 65_535;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Open many TCP connections at once and print the replies")]
pub struct Args {
    #[arg(long, default_value = "localhost")]
    pub host: String,

    #[arg(short, long, default_value_t = 4242)]
    pub port: u16,

    #[arg(
        short,
        long,
        default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(..=MAX_CONNECTIONS)
    )]
    pub num_connections: u32,

    #[arg(long, default_value = "Hello from client!")]
    pub payload: String,

    /// Upper bound on the bytes taken from a single receive.
    #[arg(long, default_value_t = 1024)]
    pub recv_size: usize,

    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout_ms: Option<u64>,

    /// Without this a receive blocks until the peer sends something or hangs up.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout_ms: Option<u64>,

    /// Exit with a failure status if any connection failed.
    #[arg(long)]
    pub strict: bool,
}

impl Args {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}
