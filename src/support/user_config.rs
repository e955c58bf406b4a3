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

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::connection::{AuthMethod, Endpoint, PasswordFormat, Protocol};

/// The per-user configuration for mailbiff.
///
/// This is stored in a file named `mailbiff.toml`, typically under
/// `~/.mailbiff` or `/etc/mailbiff`.
///
/// Passwords never appear here. They live in the encrypted store and are
/// entered with the `set-password` subcommand.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct Config {
    /// Configuration for the encrypted store holding mailbox state and
    /// credentials.
    pub store: StoreConfig,

    /// The mailboxes to monitor, one `[[account]]` table each.
    #[serde(default, rename = "account")]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct StoreConfig {
    /// The directory in which encrypted values are kept.
    pub path: PathBuf,

    /// The secret protecting the store.
    pub secret: String,

    /// If true, `secret` is already a lowercase hex SHA-256 digest rather
    /// than a raw passphrase, as produced by
    /// `crate::crypt::codec::EncryptionCodec::hash_secret`.
    #[serde(default)]
    pub secret_is_hashed: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccountConfig {
    /// The name used to refer to this account on the command line and in
    /// status output.
    pub name: String,

    /// The mail server host name or address.
    pub hostname: String,

    /// The mail server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// The protocol spoken by the server.
    #[serde(default)]
    pub protocol: Protocol,

    /// Socket timeout, in seconds, for connecting and for each reply.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// The login name on the mail server.
    pub username: String,

    /// How to authenticate. Only `plain` is currently usable.
    #[serde(default)]
    pub auth_method: AuthMethod,

    /// Whether the stored password is sent as-is or is a hash.
    #[serde(default)]
    pub password_format: PasswordFormat,

    /// Seconds between checks of this account in watch mode.
    #[serde(default = "default_check_frequency")]
    pub check_frequency: u64,

    /// Accounts are listed in ascending order of this value.
    #[serde(default = "default_display_order")]
    pub display_order: u32,
}

impl AccountConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            hostname: self.hostname.clone(),
            port: self.port,
            timeout_secs: self.timeout,
        }
    }
}

fn default_port() -> u16 {
    110
}

fn default_timeout() -> u64 {
    10
}

fn default_check_frequency() -> u64 {
    60
}

fn default_display_order() -> u32 {
    1
}
