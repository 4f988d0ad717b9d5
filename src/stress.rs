// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use clap::Parser;
use log::*;

use std::process::ExitCode;
use std::sync::Arc;

use tcp_stress::{Args, Plan, fanout, limits};

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let wanted = limits::fd_limit_for(args.num_connections as usize);
    match limits::raise_fd_limit(wanted) {
        Ok(limit) if limit < wanted => {
            warn!(
                "File descriptor limit is {limit}; some of the {} connections may fail",
                args.num_connections
            );
        }
        Ok(limit) => debug!("File descriptor limit is {limit}"),
        Err(e) => warn!("Could not raise file descriptor limit: {e}"),
    }

    info!(
        "Opening {} connections to {}:{}",
        args.num_connections, args.host, args.port
    );

    let report = fanout::run(Arc::new(Plan::from(&args)), args.num_connections as usize);
    println!("{report}");

    if args.strict && report.failed() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
