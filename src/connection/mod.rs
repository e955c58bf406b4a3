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

//! Server connections.
//!
//! A `ServerConnection` owns exactly one blocking socket and moves through
//! three states: closed, open, and authenticated. Which operations are legal
//! depends on the state; violating that is a caller defect, not a transport
//! error. Connections are created through `ConnectionFactory`, an explicit
//! value passed to whoever needs one, so new protocols can be added without
//! touching the mailbox logic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::support::error::Error;

#[cfg(test)]
pub mod mock;
pub mod pop3;

/// Identifies a remote mail server. Immutable once a connection is open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub hostname: String,
    pub port: u16,
    /// Socket timeout in seconds, enforced at the transport layer so a hung
    /// peer surfaces as a connection error rather than an indefinite block.
    pub timeout_secs: u64,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// The wire protocol spoken to a mail server.
///
/// POP3 is the only implemented protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Pop3,
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::Pop3
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Protocol::Pop3 => write!(f, "pop3"),
        }
    }
}

/// How a client proves its identity to the server.
///
/// Only `Plain` (USER/PASS) is implemented; the challenge-response methods
/// are recognised extension points which fail with `Error::UnsupportedAuth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    #[serde(rename = "plain")]
    Plain,
    #[serde(rename = "APOP")]
    Apop,
    #[serde(rename = "CRAM-MD5")]
    CramMd5,
    #[serde(rename = "DIGEST-MD5")]
    DigestMd5,
    #[serde(rename = "NTLM")]
    Ntlm,
}

impl Default for AuthMethod {
    fn default() -> Self {
        AuthMethod::Plain
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AuthMethod::Plain => write!(f, "plain"),
            AuthMethod::Apop => write!(f, "APOP"),
            AuthMethod::CramMd5 => write!(f, "CRAM-MD5"),
            AuthMethod::DigestMd5 => write!(f, "DIGEST-MD5"),
            AuthMethod::Ntlm => write!(f, "NTLM"),
        }
    }
}

/// The form the password supplied to `login` is in.
///
/// The method/format pairing is validated before any network traffic; plain
/// USER/PASS authentication accepts only `Plain`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordFormat {
    Plain,
    Hashed,
}

impl Default for PasswordFormat {
    fn default() -> Self {
        PasswordFormat::Plain
    }
}

impl fmt::Display for PasswordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PasswordFormat::Plain => write!(f, "plain"),
            PasswordFormat::Hashed => write!(f, "hashed"),
        }
    }
}

/// A client connection to a mail server.
pub trait ServerConnection {
    /// The endpoint this connection talks to.
    fn endpoint(&self) -> &Endpoint;

    /// Establish the socket and consume the server greeting.
    ///
    /// A no-op if the connection is already open.
    fn open(&mut self) -> Result<(), Error>;

    /// Close the connection. Legal in any state and idempotent.
    fn close(&mut self);

    /// Probe the connection with a no-op command.
    ///
    /// True iff the probe completed without a transport error. Never fails
    /// itself.
    fn is_alive(&mut self) -> bool;

    /// Authenticate with the given details, dispatching on `method`.
    fn login(
        &mut self,
        username: &str,
        password: &str,
        method: AuthMethod,
        password_format: PasswordFormat,
    ) -> Result<(), Error>;

    /// Return the number of messages currently on the server.
    ///
    /// Legal only after a successful `login`; calling it earlier is a caller
    /// defect.
    fn message_count(&mut self) -> Result<u32, Error>;
}

/// Creates server connections, dispatching on the protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn create_connection(
        &self,
        protocol: Protocol,
        endpoint: Endpoint,
    ) -> Box<dyn ServerConnection> {
        match protocol {
            Protocol::Pop3 => Box::new(pop3::Pop3Connection::new(endpoint)),
        }
    }
}
