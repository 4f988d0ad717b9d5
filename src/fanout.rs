// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use log::*;

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::client::{Plan, Response, run_connection};
use crate::error::ConnectionError;

pub type Outcome = Result<Response, ConnectionError>;

/// What happened to every connection in one run, indexed by connection number.
#[derive(Debug)]
pub struct Report {
    outcomes: Vec<Outcome>,
    elapsed: Duration,
}

impl Report {
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} of {} connections succeeded, {} failed, in {:.2?}",
            self.succeeded(),
            self.attempted(),
            self.failed(),
            self.elapsed
        )
    }
}

/// Run `num_connections` connections at once, one thread each, and wait for all of them.
///
/// Each thread prints its own result line as soon as its exchange is over, so output order
/// follows completion order. A connection whose thread could not be spawned, or whose thread
/// panicked, counts as failed without holding up the others.
pub fn run(plan: Arc<Plan>, num_connections: usize) -> Report {
    run_jobs(num_connections, move |_| run_connection(&plan))
}

fn run_jobs<F>(num_connections: usize, job: F) -> Report
where
    F: Fn(usize) -> Outcome + Send + Sync + 'static,
{
    let start = Instant::now();
    let job = Arc::new(job);

    let join_handles: Vec<_> = (0..num_connections)
        .map(|i| {
            let job = Arc::clone(&job);
            thread::Builder::new()
                .name(format!("conn-{i}"))
                .spawn(move || {
                    let outcome = job(i);
                    print_outcome(&outcome);
                    outcome
                })
        })
        .collect();

    let outcomes = join_handles
        .into_iter()
        .enumerate()
        .map(|(i, handle)| {
            let outcome = match handle {
                Ok(handle) => match handle.join() {
                    Ok(outcome) => return outcome,
                    Err(_) => {
                        error!("Connection {i} panicked");
                        Err(ConnectionError::Panicked)
                    }
                },
                Err(e) => {
                    warn!("Could not spawn thread for connection {i}: {e}");
                    Err(ConnectionError::Spawn(e))
                }
            };
            print_outcome(&outcome);
            outcome
        })
        .collect();

    Report {
        outcomes,
        elapsed: start.elapsed(),
    }
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Ok(response) => println!("Received response: {}", response.text()),
        Err(e) => println!("Error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Echo server that lives for the rest of the test process.
    fn spawn_echo_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                thread::spawn(move || {
                    let mut buf = [0; 1024];
                    while let Ok(n) = stream.read(&mut buf) {
                        if n == 0 || stream.write_all(&buf[..n]).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        port
    }

    fn plan_for(port: u16) -> Arc<Plan> {
        Arc::new(Plan {
            host: "127.0.0.1".to_string(),
            port,
            payload: b"Hello from client!".to_vec(),
            recv_size: 1024,
            connect_timeout: Some(Duration::from_secs(5)),
            read_timeout: Some(Duration::from_secs(5)),
        })
    }

    #[test]
    fn every_connection_gets_its_echo() {
        let port = spawn_echo_server();

        let report = run(plan_for(port), 32);

        assert_eq!(report.attempted(), 32);
        assert_eq!(report.succeeded(), 32);
        assert_eq!(report.failed(), 0);
        for outcome in report.outcomes() {
            assert_eq!(outcome.as_ref().unwrap().text(), "Hello from client!");
        }
    }

    #[test]
    fn failures_are_counted_not_fatal() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let report = run(plan_for(port), 4);

        assert_eq!(report.attempted(), 4);
        assert_eq!(report.failed(), 4);
        assert!(
            report
                .outcomes()
                .iter()
                .all(|o| matches!(o, Err(ConnectionError::Connect(_))))
        );
    }

    #[test]
    fn zero_connections() {
        let report = run(plan_for(1), 0);

        assert_eq!(report.attempted(), 0);
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn panicking_connection_counts_as_failed() {
        let report = run_jobs(3, |i| {
            if i == 1 {
                panic!("connection {i} blew up");
            }
            Response::try_from(format!("reply {i}").into_bytes())
        });

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.outcomes()[1], Err(ConnectionError::Panicked)));
        assert_eq!(report.outcomes()[0].as_ref().unwrap().text(), "reply 0");
        assert_eq!(report.outcomes()[2].as_ref().unwrap().text(), "reply 2");
    }

    #[test]
    fn summary_line() {
        let report = Report {
            outcomes: vec![
                Ok(Response::try_from(b"Hello from client!".to_vec()).unwrap()),
                Err(ConnectionError::Panicked),
            ],
            elapsed: Duration::from_millis(1500),
        };

        assert_eq!(
            report.to_string(),
            "1 of 2 connections succeeded, 1 failed, in 1.50s"
        );
    }
}
