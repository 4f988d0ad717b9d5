// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use clap::Parser;
use log::*;

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

#[derive(Parser)]
struct Args {
    #[arg(long, default_value_t = 1024)]
    buf_size: usize,

    #[arg(short, long, default_value_t = 0)]
    port: u16,
}

fn main() -> io::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let listener = TcpListener::bind(format!("127.0.0.1:{}", args.port))?;
    println!("Listening on {}", listener.local_addr()?);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let buf_size = args.buf_size;
                thread::spawn(move || handle_client(stream, buf_size));
            }
            Err(e) => warn!("accept failed: {e}"),
        }
    }

    Ok(())
}

fn handle_client(mut stream: TcpStream, buf_size: usize) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown peer".to_string());
    trace!("Accepted {peer}");

    let mut buf = vec![0; buf_size];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => {
                trace!("Closing connection from {peer}");
                return;
            }
            Ok(n) => {
                if let Err(e) = stream.write_all(&buf[..n]) {
                    debug!("Send to {peer} failed: {e}");
                    return;
                }
            }
            Err(e) => {
                debug!("Receive from {peer} failed: {e}");
                return;
            }
        }
    }
}
