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

//! The POP3 server connection.
//!
//! Commands are strictly sequential: one CRLF-terminated command line out,
//! one reply line back, never pipelined. A reply is successful iff its first
//! character is `+`; that single-character check is the only discriminator
//! the protocol gives us.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use super::{AuthMethod, Endpoint, PasswordFormat, ServerConnection};
use crate::support::error::Error;

const PROTOCOL: &str = "pop3";

/// A blocking POP3 client connection.
///
/// Moves from closed to open on `open()` and to authenticated on a
/// successful `login()`. `close()` returns it to closed from any state. The
/// socket is forced closed when the value is dropped.
pub struct Pop3Connection {
    endpoint: Endpoint,
    /// The socket, present only while the connection is open. Replies are
    /// read through the buffer; commands are written straight to the
    /// underlying stream.
    socket: Option<BufReader<TcpStream>>,
    authenticated: bool,
    /// The greeting line the server sent on connect. APOP authentication
    /// derives its challenge from this, so it is retained.
    server_greeting: Option<String>,
}

impl Pop3Connection {
    pub fn new(endpoint: Endpoint) -> Self {
        Pop3Connection {
            endpoint,
            socket: None,
            authenticated: false,
            server_greeting: None,
        }
    }

    /// The greeting the server sent when the connection was opened, if any.
    pub fn server_greeting(&self) -> Option<&str> {
        self.server_greeting.as_deref()
    }

    fn error(reason: impl Into<String>) -> Error {
        Error::Connection {
            protocol: PROTOCOL,
            reason: reason.into(),
        }
    }

    fn io_error(&self, doing: &str, e: io::Error) -> Error {
        Self::error(format!("{} ({}): {}", doing, self.endpoint, e))
    }

    /// Issue `command` and return the single reply line, stripped of its
    /// terminator.
    ///
    /// If the connection is closed, it is opened first. The command's CRLF
    /// terminator is appended if absent.
    pub fn command(&mut self, command: &str) -> Result<String, Error> {
        if self.socket.is_none() {
            self.open()?;
        }

        let socket = match self.socket.as_mut() {
            Some(socket) => socket,
            None => return Err(Self::error("connection to server lost")),
        };

        let mut line = command.to_owned();
        if !line.ends_with("\r\n") {
            line.push_str("\r\n");
        }

        if let Err(e) = socket.get_ref().write_all(line.as_bytes()) {
            let e = self.io_error("write failed", e);
            self.close();
            return Err(e);
        }

        let mut reply = String::new();
        match socket.read_line(&mut reply) {
            Ok(0) => {
                self.close();
                Err(Self::error(format!(
                    "server closed the connection ({})",
                    self.endpoint
                )))
            },
            Ok(_) => Ok(reply.trim_end_matches(['\r', '\n'].as_ref())
                .to_owned()),
            Err(e) => {
                let e = self.io_error("read failed", e);
                self.close();
                Err(e)
            },
        }
    }
}

/// Whether a reply line indicates success.
fn successful_reply(reply: &str) -> bool {
    reply.starts_with('+')
}

impl ServerConnection for Pop3Connection {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn open(&mut self) -> Result<(), Error> {
        if self.socket.is_some() {
            return Ok(());
        }

        let timeout = Duration::from_secs(self.endpoint.timeout_secs);

        // connect_timeout needs concrete addresses, so resolve by hand.
        let addr = (self.endpoint.hostname.as_str(), self.endpoint.port)
            .to_socket_addrs()
            .map_err(|e| self.io_error("name resolution failed", e))?
            .next()
            .ok_or_else(|| {
                Self::error(format!(
                    "no addresses found for {}",
                    self.endpoint.hostname
                ))
            })?;

        let stream = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|e| self.io_error("connect failed", e))?;
        stream
            .set_read_timeout(Some(timeout))
            .and_then(|_| stream.set_write_timeout(Some(timeout)))
            .map_err(|e| self.io_error("setting timeouts failed", e))?;

        let mut socket = BufReader::new(stream);
        let mut greeting = String::new();
        match socket.read_line(&mut greeting) {
            Ok(0) => {
                return Err(Self::error(format!(
                    "server closed the connection before greeting ({})",
                    self.endpoint
                )))
            },
            Ok(_) => (),
            Err(e) => return Err(self.io_error("reading greeting failed", e)),
        }

        let greeting = greeting.trim_end_matches(['\r', '\n'].as_ref());
        debug!("{}: connected, greeting {:?}", self.endpoint, greeting);
        self.server_greeting = Some(greeting.to_owned());
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        // Dropping the stream closes the socket.
        if self.socket.take().is_some() {
            self.authenticated = false;
            debug!("{}: connection closed", self.endpoint);
        }
    }

    fn is_alive(&mut self) -> bool {
        self.command("NOOP").is_ok()
    }

    fn login(
        &mut self,
        username: &str,
        password: &str,
        method: AuthMethod,
        password_format: PasswordFormat,
    ) -> Result<(), Error> {
        match method {
            AuthMethod::Plain => (),
            unimplemented => {
                return Err(Error::UnsupportedAuth {
                    protocol: PROTOCOL,
                    method: unimplemented,
                })
            },
        }

        // Validate the method/format pairing before any network traffic.
        if PasswordFormat::Plain != password_format {
            return Err(Error::Defect(format!(
                "password format '{}' used with plain authentication",
                password_format
            )));
        }

        let reply = self.command(&format!("USER {}", username))?;
        if !successful_reply(&reply) {
            return Err(Self::error(format!(
                "server reports unknown username '{}'",
                username
            )));
        }

        let reply = self.command(&format!("PASS {}", password))?;
        if !successful_reply(&reply) {
            return Err(Self::error("server reports invalid password"));
        }

        self.authenticated = true;
        debug!("{}: authenticated as '{}'", self.endpoint, username);
        Ok(())
    }

    fn message_count(&mut self) -> Result<u32, Error> {
        if !self.authenticated {
            return Err(Error::Defect(
                "message_count called before login".to_owned(),
            ));
        }

        let reply = self.command("STAT")?;
        if !successful_reply(&reply) {
            return Err(Self::error(format!(
                "bad response '{}' to STAT command",
                reply
            )));
        }

        // The reply is `+OK <count> <total size>`; the count is all we need.
        reply
            .split_whitespace()
            .nth(1)
            .and_then(|count| count.parse::<u32>().ok())
            .ok_or_else(|| {
                Self::error(format!("bad response '{}' to STAT command", reply))
            })
    }
}

impl Drop for Pop3Connection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod test {
    use super::super::mock::MockServer;
    use super::*;

    #[test]
    fn open_reads_greeting_and_close_is_idempotent() {
        let server = MockServer::start("+OK mock ready", &[]);
        let mut cxn = Pop3Connection::new(server.endpoint());

        cxn.open().unwrap();
        assert_eq!(Some("+OK mock ready"), cxn.server_greeting());

        cxn.close();
        cxn.close();
    }

    #[test]
    fn open_fails_when_nothing_answers() {
        let mut cxn = Pop3Connection::new(MockServer::dead_endpoint());
        assert_matches!(Err(Error::Connection { .. }), cxn.open());
    }

    #[test]
    fn dead_endpoint_stays_dead_while_other_servers_start() {
        // The dead port must remain unanswered even when another server
        // binds an ephemeral port afterwards.
        let dead = MockServer::dead_endpoint();
        let _server = MockServer::start("+OK mock ready", &[]);

        let mut cxn = Pop3Connection::new(dead);
        assert_matches!(Err(Error::Connection { .. }), cxn.open());
    }

    #[test]
    fn command_lazily_opens_and_round_trips() {
        let server = MockServer::start("+OK mock ready", &["+OK nothing"]);
        let mut cxn = Pop3Connection::new(server.endpoint());

        // No explicit open().
        let reply = cxn.command("NOOP").unwrap();
        assert_eq!("+OK nothing", reply);
        cxn.close();
        assert_eq!(vec!["NOOP".to_owned()], server.received());
    }

    #[test]
    fn is_alive_true_while_server_answers() {
        let server = MockServer::start("+OK mock ready", &["+OK"]);
        let mut cxn = Pop3Connection::new(server.endpoint());
        assert!(cxn.is_alive());
    }

    #[test]
    fn is_alive_false_after_server_goes_away() {
        let server = MockServer::start("+OK mock ready", &["+OK"]);
        let mut cxn = Pop3Connection::new(server.endpoint());
        assert!(cxn.is_alive());
        // The mock's script is exhausted, so it hangs up; the next probe
        // must report death rather than fail.
        assert!(!cxn.is_alive());
    }

    #[test]
    fn login_plain_success() {
        let server =
            MockServer::start("+OK mock ready", &["+OK user", "+OK logged in"]);
        let mut cxn = Pop3Connection::new(server.endpoint());

        cxn.login("fred", "hunter2", AuthMethod::Plain, PasswordFormat::Plain)
            .unwrap();
        cxn.close();
        assert_eq!(
            vec!["USER fred".to_owned(), "PASS hunter2".to_owned()],
            server.received()
        );
    }

    #[test]
    fn login_rejects_unknown_username() {
        let server = MockServer::start("+OK mock ready", &["-ERR who?"]);
        let mut cxn = Pop3Connection::new(server.endpoint());

        assert_matches!(
            Err(Error::Connection { .. }),
            cxn.login(
                "nobody",
                "pw",
                AuthMethod::Plain,
                PasswordFormat::Plain
            )
        );
    }

    #[test]
    fn login_rejects_invalid_password() {
        let server =
            MockServer::start("+OK mock ready", &["+OK user", "-ERR denied"]);
        let mut cxn = Pop3Connection::new(server.endpoint());

        assert_matches!(
            Err(Error::Connection { .. }),
            cxn.login("fred", "wrong", AuthMethod::Plain, PasswordFormat::Plain)
        );
    }

    #[test]
    fn login_validates_password_format_before_io() {
        // Nothing answers on the endpoint; a format defect must be
        // reported before any I/O is attempted.
        let mut cxn = Pop3Connection::new(MockServer::dead_endpoint());
        assert_matches!(
            Err(Error::Defect(..)),
            cxn.login("fred", "pw", AuthMethod::Plain, PasswordFormat::Hashed)
        );
    }

    #[test]
    fn challenge_response_methods_are_unsupported() {
        for &method in &[
            AuthMethod::Apop,
            AuthMethod::CramMd5,
            AuthMethod::DigestMd5,
            AuthMethod::Ntlm,
        ] {
            let mut cxn = Pop3Connection::new(MockServer::dead_endpoint());
            assert_matches!(
                Err(Error::UnsupportedAuth { .. }),
                cxn.login("fred", "pw", method, PasswordFormat::Plain)
            );
        }
    }

    #[test]
    fn message_count_parses_stat_reply() {
        let server = MockServer::start(
            "+OK mock ready",
            &["+OK", "+OK", "+OK 123 12300"],
        );
        let mut cxn = Pop3Connection::new(server.endpoint());

        cxn.login("fred", "pw", AuthMethod::Plain, PasswordFormat::Plain)
            .unwrap();
        assert_eq!(123, cxn.message_count().unwrap());
    }

    #[test]
    fn message_count_before_login_is_a_defect() {
        let server = MockServer::start("+OK mock ready", &[]);
        let mut cxn = Pop3Connection::new(server.endpoint());
        cxn.open().unwrap();
        assert_matches!(Err(Error::Defect(..)), cxn.message_count());
    }

    #[test]
    fn message_count_rejects_negative_reply() {
        let server = MockServer::start(
            "+OK mock ready",
            &["+OK", "+OK", "-ERR no stats for you"],
        );
        let mut cxn = Pop3Connection::new(server.endpoint());

        cxn.login("fred", "pw", AuthMethod::Plain, PasswordFormat::Plain)
            .unwrap();
        assert_matches!(Err(Error::Connection { .. }), cxn.message_count());
    }

    #[test]
    fn message_count_rejects_malformed_reply() {
        let server = MockServer::start(
            "+OK mock ready",
            &["+OK", "+OK", "+OK notanumber 12300"],
        );
        let mut cxn = Pop3Connection::new(server.endpoint());

        cxn.login("fred", "pw", AuthMethod::Plain, PasswordFormat::Plain)
            .unwrap();
        assert_matches!(Err(Error::Connection { .. }), cxn.message_count());
    }
}
