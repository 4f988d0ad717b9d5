// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use clap::Parser;

use std::io;

use tcp_stress::chat::ChatServer;

#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, default_value_t = 4242)]
    port: u16,

    #[arg(long, default_value_t = 1024)]
    buf_size: usize,
}

fn main() -> io::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let server = ChatServer::bind((args.host.as_str(), args.port), args.buf_size)?;
    println!("Listening on {}", server.local_addr()?);

    server.run()
}
