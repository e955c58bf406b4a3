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

use std::thread;
use std::time::{Duration, Instant};

use log::warn;

use crate::account::mailbox::Mailbox;
use crate::connection::ConnectionFactory;
use crate::store::{file::EncryptedFileStore, KeyValueStore};
use crate::support::user_config::Config;

pub(super) fn check(config: Config) {
    let mut store = super::open_store(&config);
    let mut mailboxes = load_mailboxes(&config, &mut store);

    let factory = ConnectionFactory::default();
    for mailbox in &mut mailboxes {
        check_one(mailbox, &factory);
        save(&mut store, mailbox);
    }

    print_statuses(&mailboxes);
}

pub(super) fn watch(config: Config) {
    let mut store = super::open_store(&config);
    let mut mailboxes = load_mailboxes(&config, &mut store);
    let factory = ConnectionFactory::default();

    // Every account is due immediately on startup, then on its own schedule.
    let mut due_times = vec![Instant::now(); mailboxes.len()];

    loop {
        let now = Instant::now();
        let mut changed = false;

        for (mailbox, due) in mailboxes.iter_mut().zip(due_times.iter_mut()) {
            if *due > now {
                continue;
            }

            check_one(mailbox, &factory);
            save(&mut store, mailbox);
            *due = now
                + Duration::from_secs(1.max(mailbox.check_frequency_secs));
            changed = true;
        }

        if changed {
            print_statuses(&mailboxes);
        }

        thread::sleep(Duration::from_secs(1));
    }
}

pub(super) fn mark_read(config: Config, account: &str) {
    let mut store = super::open_store(&config);
    let account_config = match config
        .accounts
        .iter()
        .find(|a| a.name == account)
    {
        Some(account_config) => account_config,
        None => die!(EX_NOUSER, "No account named '{}' is configured", account),
    };

    let mut mailbox = match load_mailbox(&mut store, account_config) {
        Some(mailbox) => mailbox,
        None => die!(
            EX_NOUSER,
            "Account '{}' has never been checked; nothing to mark",
            account
        ),
    };

    mailbox.mark_as_read();
    save(&mut store, &mailbox);
    println!("{}: {}", mailbox.account_name, mailbox.status());
}

/// Load the stored record for one configured account, refreshed with the
/// current configuration, or `None` if the account has never been saved.
fn load_mailbox(
    store: &mut EncryptedFileStore,
    config: &crate::support::user_config::AccountConfig,
) -> Option<Mailbox> {
    store
        .fetch::<Mailbox>(&super::mailbox_key(&config.name))
        .map(|mut mailbox| {
            mailbox.apply_config(config);
            mailbox
        })
}

fn load_mailboxes(
    config: &Config,
    store: &mut EncryptedFileStore,
) -> Vec<Mailbox> {
    if config.accounts.is_empty() {
        die!(EX_CONFIG, "No accounts are configured");
    }

    let mut mailboxes = config
        .accounts
        .iter()
        .map(|account| {
            load_mailbox(store, account)
                .unwrap_or_else(|| Mailbox::from_config(account))
        })
        .collect::<Vec<_>>();
    mailboxes.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.account_name.cmp(&b.account_name))
    });
    mailboxes
}

fn check_one(mailbox: &mut Mailbox, factory: &ConnectionFactory) {
    // Transport failures have already been folded into the status; anything
    // check() reports is a configuration the server can never accept.
    if let Err(e) = mailbox.check(factory) {
        die!(EX_CONFIG, "{}: {}", mailbox.account_name, e);
    }
}

fn save(store: &mut EncryptedFileStore, mailbox: &Mailbox) {
    if !store.store(&super::mailbox_key(&mailbox.account_name), mailbox) {
        warn!("{}: state could not be saved", mailbox.account_name);
    }
}

fn print_statuses(mailboxes: &[Mailbox]) {
    for mailbox in mailboxes {
        println!(
            "{}: {} ({} messages, {} read)",
            mailbox.account_name,
            mailbox.status(),
            mailbox.message_count(),
            mailbox.read_message_count()
        );
    }
}
