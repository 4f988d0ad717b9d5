// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

//! Open a batch of TCP connections at once, push a payload down each one and print whatever
//! comes back.

#[cfg(unix)]
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod fanout;
pub mod limits;

pub use client::{Plan, Response, run_connection};
pub use config::Args;
pub use error::ConnectionError;
pub use fanout::Report;
