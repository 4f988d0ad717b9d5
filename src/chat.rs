// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

//! A single-threaded chat relay driven by `poll(2)`.
//!
//! Every client starts out as `Anon_<fd>`. Each line a client sends is relayed to every other
//! client as `<name>: <line>`, except for the commands `/name <new name>`, `/quit` and
//! `/shutdown`.

use log::*;

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::os::fd::{AsRawFd, RawFd};

/// What a client asked for with one line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Shutdown,
    Quit,
    Rename(&'a str),
    Say(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line {
            "/shutdown" => Self::Shutdown,
            "/quit" => Self::Quit,
            _ => match line.strip_prefix("/name ") {
                Some(name) if !name.trim().is_empty() => Self::Rename(name.trim()),
                _ => Self::Say(line),
            },
        }
    }
}

/// Split one receive into the lines it carries, dropping line endings and blank lines.
pub fn lines(chunk: &str) -> impl Iterator<Item = &str> {
    chunk
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
}

struct Client {
    stream: TcpStream,
    name: String,
}

impl Client {
    fn fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }
}

enum Control {
    Continue,
    Shutdown,
}

pub struct ChatServer {
    listener: TcpListener,
    clients: Vec<Client>,
    buf: Vec<u8>,
}

impl ChatServer {
    pub fn bind<A: ToSocketAddrs>(addr: A, buf_size: usize) -> io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr)?,
            clients: Vec::new(),
            buf: vec![0; buf_size],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until a client sends `/shutdown`.
    pub fn run(mut self) -> io::Result<()> {
        loop {
            let mut pollfds: Vec<libc::pollfd> = std::iter::once(self.listener.as_raw_fd())
                .chain(self.clients.iter().map(Client::fd))
                .map(|fd| libc::pollfd {
                    fd,
                    events: libc::POLLIN,
                    revents: 0,
                })
                .collect();

            // SAFETY: `pollfds` is a live, correctly sized array of pollfd structs.
            let ready = unsafe {
                libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, -1)
            };
            if ready < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            if pollfds[0].revents & libc::POLLIN != 0 {
                self.accept();
            }

            // Clients accepted above are not in `pollfds` yet; they are polled next round.
            let mut hung_up = Vec::new();
            for (index, pollfd) in pollfds[1..].iter().enumerate() {
                let readable = libc::POLLIN | libc::POLLHUP | libc::POLLERR;
                if pollfd.revents & readable == 0 || hung_up.contains(&index) {
                    continue;
                }

                if let Control::Shutdown = self.handle_client(index, &mut hung_up) {
                    self.shutdown();
                    return Ok(());
                }
            }

            self.remove_clients(hung_up);
        }
    }

    fn accept(&mut self) {
        match self.listener.accept() {
            Ok((stream, addr)) => {
                println!("New connection from {}", addr.ip());
                let name = format!("Anon_{}", stream.as_raw_fd());
                println!("<{name} joined the channel>");
                self.clients.push(Client { stream, name });
            }
            Err(e) => warn!("accept failed: {e}"),
        }
    }

    fn handle_client(&mut self, index: usize, hung_up: &mut Vec<usize>) -> Control {
        let fd = self.clients[index].fd();
        let n_read = match self.clients[index].stream.read(&mut self.buf) {
            Ok(0) => {
                hang_up(fd, index, hung_up);
                return Control::Continue;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("recv on socket {fd} failed: {e}");
                hang_up(fd, index, hung_up);
                return Control::Continue;
            }
        };

        let chunk = String::from_utf8_lossy(&self.buf[..n_read]).into_owned();
        for line in lines(&chunk) {
            match Command::parse(line) {
                Command::Shutdown => return Control::Shutdown,
                Command::Quit => {
                    hang_up(fd, index, hung_up);
                    break;
                }
                Command::Rename(name) => {
                    let client = &mut self.clients[index];
                    println!("<{} became {name}>", client.name);
                    client.name = name.to_string();
                }
                Command::Say(text) => self.broadcast(index, text, hung_up),
            }
        }

        Control::Continue
    }

    /// Send `text` from client `from` to every other client still connected.
    fn broadcast(&mut self, from: usize, text: &str, hung_up: &mut Vec<usize>) {
        let msg = format!("{}: {text}\n", self.clients[from].name);

        for (index, client) in self.clients.iter_mut().enumerate() {
            if index == from || hung_up.contains(&index) {
                continue;
            }
            if let Err(e) = client.stream.write_all(msg.as_bytes()) {
                warn!("send to {} failed: {e}", client.name);
                hang_up(client.fd(), index, hung_up);
            }
        }

        print!("{msg}");
    }

    fn remove_clients(&mut self, mut hung_up: Vec<usize>) {
        hung_up.sort_unstable();
        hung_up.dedup();

        // Highest index first so swap_remove never moves a client that is still to be removed.
        for index in hung_up.into_iter().rev() {
            let client = self.clients.swap_remove(index);
            trace!("Closing socket {}", client.fd());
            println!("Client disconnected");
        }
    }

    fn shutdown(&mut self) {
        println!("Server shutting down...");
        self.clients.clear();
    }
}

fn hang_up(fd: RawFd, index: usize, hung_up: &mut Vec<usize>) {
    if !hung_up.contains(&index) {
        println!("server: socket {fd} hung up");
        hung_up.push(index);
    }
}
