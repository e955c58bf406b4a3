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

//! Mailbox monitoring.
//!
//! A `Mailbox` tracks one remote account and a coarse status derived from
//! the message counts of the most recent poll. It never retries: each
//! `check` is a single atomic attempt, and a transport failure leaves
//! nothing half-updated.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::connection::{
    AuthMethod, ConnectionFactory, Endpoint, PasswordFormat, Protocol,
    ServerConnection,
};
use crate::support::error::Error;
use crate::support::user_config::AccountConfig;

/// Coarse mailbox status.
///
/// Derived solely from `(message_count, read_message_count)` by `check`,
/// never set independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Error,
    NoMail,
    OldMail,
    NewMail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Status::Error => write!(f, "error"),
            Status::NoMail => write!(f, "no mail"),
            Status::OldMail => write!(f, "old mail"),
            Status::NewMail => write!(f, "new mail"),
        }
    }
}

/// One monitored mailbox: where it lives, how to authenticate, and what the
/// last poll found.
///
/// The whole record is serialisable so it can be kept in the encrypted
/// store between runs; that includes the password, which therefore never
/// touches disk in the clear.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mailbox {
    pub account_name: String,
    pub protocol: Protocol,
    pub endpoint: Endpoint,
    pub username: String,
    pub password: String,
    pub auth_method: AuthMethod,
    pub password_format: PasswordFormat,
    /// Seconds between polls in watch mode.
    pub check_frequency_secs: u64,
    /// Position of this mailbox in status listings.
    pub display_order: u32,
    last_checked: Option<DateTime<Utc>>,
    message_count: u32,
    read_message_count: u32,
    status: Status,
}

impl Mailbox {
    pub fn new(
        account_name: String,
        protocol: Protocol,
        endpoint: Endpoint,
        username: String,
        password: String,
        auth_method: AuthMethod,
        password_format: PasswordFormat,
    ) -> Self {
        Mailbox {
            account_name,
            protocol,
            endpoint,
            username,
            password,
            auth_method,
            password_format,
            check_frequency_secs: 60,
            display_order: 1,
            last_checked: None,
            message_count: 0,
            read_message_count: 0,
            status: Status::Error,
        }
    }

    /// Build a fresh mailbox from configuration, with an empty password.
    pub fn from_config(config: &AccountConfig) -> Self {
        let mut mailbox = Mailbox::new(
            config.name.clone(),
            config.protocol,
            config.endpoint(),
            config.username.clone(),
            String::new(),
            config.auth_method,
            config.password_format,
        );
        mailbox.check_frequency_secs = config.check_frequency;
        mailbox.display_order = config.display_order;
        mailbox
    }

    /// Overwrite the connection parameters with the current configuration,
    /// keeping the cached counts and password.
    ///
    /// Used when a stored record is reloaded and the configuration may have
    /// changed since it was written.
    pub fn apply_config(&mut self, config: &AccountConfig) {
        self.protocol = config.protocol;
        self.endpoint = config.endpoint();
        self.username = config.username.clone();
        self.auth_method = config.auth_method;
        self.password_format = config.password_format;
        self.check_frequency_secs = config.check_frequency;
        self.display_order = config.display_order;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn read_message_count(&self) -> u32 {
        self.read_message_count
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    /// Poll the server once and update the status and message count.
    ///
    /// Transport failures are absorbed: the mailbox drops to
    /// `Status::Error` with a zero count and `Ok(())` is returned, since a
    /// broken server is an ordinary outcome for a monitor. Caller defects
    /// and unsupported authentication configurations propagate.
    pub fn check(&mut self, factory: &ConnectionFactory) -> Result<(), Error> {
        match self.try_check(factory) {
            Ok(()) => {
                info!(
                    "{}: {} ({} messages, {} read)",
                    self.account_name,
                    self.status,
                    self.message_count,
                    self.read_message_count
                );
                Ok(())
            },
            Err(Error::Connection { reason, .. }) => {
                warn!("{}: check failed: {}", self.account_name, reason);
                self.status = Status::Error;
                self.message_count = 0;
                Ok(())
            },
            Err(e) => Err(e),
        }
    }

    fn try_check(&mut self, factory: &ConnectionFactory) -> Result<(), Error> {
        let mut connection =
            factory.create_connection(self.protocol, self.endpoint.clone());
        connection.login(
            &self.username,
            &self.password,
            self.auth_method,
            self.password_format,
        )?;
        let count = connection.message_count()?;
        connection.close();

        // Nothing is mutated until the whole exchange has succeeded.
        self.message_count = count;
        self.status = if 0 == count {
            Status::NoMail
        } else if self.read_message_count < count {
            Status::NewMail
        } else {
            Status::OldMail
        };
        self.last_checked = Some(Utc::now());
        Ok(())
    }

    /// Mark everything currently in the mailbox as read.
    ///
    /// Demotes `NewMail` to `OldMail`; other statuses are structurally
    /// unaffected even though the read count catches up.
    pub fn mark_as_read(&mut self) {
        self.read_message_count = self.message_count;
        if Status::NewMail == self.status {
            self.status = Status::OldMail;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::connection::mock::MockServer;

    fn mailbox(endpoint: Endpoint) -> Mailbox {
        Mailbox::new(
            "test account".to_owned(),
            Protocol::Pop3,
            endpoint,
            "fred".to_owned(),
            "hunter2".to_owned(),
            AuthMethod::Plain,
            PasswordFormat::Plain,
        )
    }

    const LOGIN_OK: [&str; 2] = ["+OK user", "+OK logged in"];

    fn script(stat_reply: &'static str) -> Vec<&'static str> {
        let mut replies = LOGIN_OK.to_vec();
        replies.push(stat_reply);
        replies
    }

    #[test]
    fn fresh_mailbox_starts_in_error() {
        let mailbox = mailbox(MockServer::dead_endpoint());
        assert_eq!(Status::Error, mailbox.status());
        assert_eq!(0, mailbox.message_count());
        assert_eq!(0, mailbox.read_message_count());
        assert_eq!(None, mailbox.last_checked());
    }

    #[test]
    fn check_reports_new_mail_then_mark_as_read_demotes_it() {
        let factory = ConnectionFactory::default();

        let server =
            MockServer::start("+OK mock ready", &script("+OK 123 12300"));
        let mut mailbox = mailbox(server.endpoint());
        mailbox.check(&factory).unwrap();

        assert_eq!(Status::NewMail, mailbox.status());
        assert_eq!(123, mailbox.message_count());
        assert_eq!(0, mailbox.read_message_count());
        assert!(mailbox.last_checked().is_some());

        mailbox.mark_as_read();
        assert_eq!(Status::OldMail, mailbox.status());
        assert_eq!(123, mailbox.read_message_count());

        // The same count on a later check is old mail, not new.
        let server =
            MockServer::start("+OK mock ready", &script("+OK 123 12300"));
        mailbox.endpoint = server.endpoint();
        mailbox.check(&factory).unwrap();
        assert_eq!(Status::OldMail, mailbox.status());
    }

    #[test]
    fn check_reports_no_mail_for_empty_mailbox() {
        let factory = ConnectionFactory::default();
        let server = MockServer::start("+OK mock ready", &script("+OK 0 0"));
        let mut mailbox = mailbox(server.endpoint());

        mailbox.check(&factory).unwrap();
        assert_eq!(Status::NoMail, mailbox.status());
        assert_eq!(0, mailbox.message_count());
    }

    #[test]
    fn new_messages_after_mark_as_read_are_new_mail() {
        let factory = ConnectionFactory::default();

        let server =
            MockServer::start("+OK mock ready", &script("+OK 10 1000"));
        let mut mailbox = mailbox(server.endpoint());
        mailbox.check(&factory).unwrap();
        mailbox.mark_as_read();

        let server =
            MockServer::start("+OK mock ready", &script("+OK 11 1100"));
        mailbox.endpoint = server.endpoint();
        mailbox.check(&factory).unwrap();
        assert_eq!(Status::NewMail, mailbox.status());
        assert_eq!(11, mailbox.message_count());
        assert_eq!(10, mailbox.read_message_count());
    }

    #[test]
    fn rejected_password_becomes_error_status() {
        let factory = ConnectionFactory::default();
        let server = MockServer::start(
            "+OK mock ready",
            &["+OK user", "-ERR invalid password"],
        );
        let mut mailbox = mailbox(server.endpoint());
        mailbox.read_message_count = 5;

        mailbox.check(&factory).unwrap();
        assert_eq!(Status::Error, mailbox.status());
        assert_eq!(0, mailbox.message_count());
        // The read count survives the failure untouched.
        assert_eq!(5, mailbox.read_message_count());
        assert_eq!(None, mailbox.last_checked());
    }

    #[test]
    fn unresponsive_server_becomes_error_status() {
        let factory = ConnectionFactory::default();
        let mut mailbox = mailbox(MockServer::dead_endpoint());

        mailbox.check(&factory).unwrap();
        assert_eq!(Status::Error, mailbox.status());
        assert_eq!(0, mailbox.message_count());
    }

    #[test]
    fn error_check_after_success_zeroes_the_count() {
        let factory = ConnectionFactory::default();

        let server = MockServer::start("+OK mock ready", &script("+OK 7 700"));
        let mut mailbox = mailbox(server.endpoint());
        mailbox.check(&factory).unwrap();
        assert_eq!(7, mailbox.message_count());

        mailbox.endpoint = MockServer::dead_endpoint();
        mailbox.check(&factory).unwrap();
        assert_eq!(Status::Error, mailbox.status());
        assert_eq!(0, mailbox.message_count());
    }

    #[test]
    fn unsupported_auth_method_propagates() {
        let factory = ConnectionFactory::default();
        let mut mailbox = mailbox(MockServer::dead_endpoint());
        mailbox.auth_method = AuthMethod::CramMd5;

        assert_matches!(
            Err(Error::UnsupportedAuth { .. }),
            mailbox.check(&factory)
        );
    }

    #[test]
    fn mark_as_read_without_check_is_harmless() {
        let mut mailbox = mailbox(MockServer::dead_endpoint());
        mailbox.mark_as_read();
        assert_eq!(Status::Error, mailbox.status());
        assert_eq!(0, mailbox.read_message_count());
    }
}
