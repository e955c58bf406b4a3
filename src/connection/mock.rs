//-
// Copyright (c) 2026, the mailbiff authors
//
// This file is part of mailbiff.
//
// Mailbiff is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public  License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mailbiff is distributed in the hope  that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// mailbiff. If not, see <http://www.gnu.org/licenses/>.

//! A scripted protocol peer for tests.
//!
//! The server accepts exactly one connection on an ephemeral local port,
//! sends the greeting, then walks its script: for each entry it reads one
//! command line and answers with the scripted reply. When the script runs
//! out, it hangs up. The command lines it saw are handed back through
//! `received()`.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use super::Endpoint;

pub struct MockServer {
    port: u16,
    handle: thread::JoinHandle<Vec<String>>,
}

impl MockServer {
    pub fn start(greeting: &str, replies: &[&str]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let greeting = greeting.to_owned();
        let replies = replies
            .iter()
            .map(|&r| r.to_owned())
            .collect::<Vec<String>>();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .write_all(format!("{}\r\n", greeting).as_bytes())
                .unwrap();

            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut received = Vec::new();
            for reply in replies {
                let mut line = String::new();
                if 0 == reader.read_line(&mut line).unwrap_or(0) {
                    break;
                }
                received
                    .push(line.trim_end_matches(['\r', '\n'].as_ref()).to_owned());
                stream
                    .write_all(format!("{}\r\n", reply).as_bytes())
                    .unwrap();
            }
            received
        });

        MockServer { port, handle }
    }

    /// An endpoint pointing at this server, with a short timeout so broken
    /// tests fail rather than hang.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            hostname: "127.0.0.1".to_owned(),
            port: self.port,
            timeout_secs: 5,
        }
    }

    /// An endpoint nothing will ever answer on.
    ///
    /// The listener is kept bound for the rest of the process so no
    /// concurrently started server can take the port, but nothing accepts
    /// or speaks on it; a client either fails to connect or times out
    /// waiting for a greeting that never comes.
    pub fn dead_endpoint() -> Endpoint {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::mem::forget(listener);
        Endpoint {
            hostname: "127.0.0.1".to_owned(),
            port,
            timeout_secs: 1,
        }
    }

    /// Wait for the peer to finish and return the command lines it read.
    pub fn received(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}
