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

use std::io;

use thiserror::Error;

use crate::connection::AuthMethod;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport or protocol-level failure talking to a mail server.
    ///
    /// This is the only variant `Mailbox::check` absorbs into the `Error`
    /// status; everything else propagates.
    #[error("{protocol} connection error: {reason}")]
    Connection {
        protocol: &'static str,
        reason: String,
    },
    /// A recognised authentication method with no implementation behind it.
    #[error("{protocol}: {method} authentication not supported")]
    UnsupportedAuth {
        protocol: &'static str,
        method: AuthMethod,
    },
    /// The caller violated an API precondition. Never recovered internally.
    #[error("programming error: {0}")]
    Defect(String),
    #[error("hex string of odd length {0}")]
    OddHexLength(usize),
    #[error("invalid hex digit {0:?}")]
    BadHexDigit(char),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Ssl(#[from] openssl::error::ErrorStack),
    #[error(transparent)]
    Nix(#[from] nix::Error),
    #[error(transparent)]
    Cbor(#[from] serde_cbor::error::Error),
}
