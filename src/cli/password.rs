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

use crate::account::mailbox::Mailbox;
use crate::store::KeyValueStore;
use crate::support::user_config::Config;

pub(super) fn set_password(config: Config, account: &str) {
    let account_config = match config
        .accounts
        .iter()
        .find(|a| a.name == account)
    {
        Some(account_config) => account_config,
        None => die!(EX_NOUSER, "No account named '{}' is configured", account),
    };

    let password = match rpassword::prompt_password_stderr("Password: ")
        .and_then(|a| {
            rpassword::prompt_password_stderr("Confirm: ").map(|b| (a, b))
        }) {
        Err(e) => die!(EX_NOINPUT, "Failed to read password: {}", e),
        Ok((a, b)) if a != b => die!(EX_DATAERR, "Passwords don't match"),
        Ok((a, _)) if a.is_empty() => die!(EX_NOINPUT, "No password given"),
        Ok((a, _)) => a,
    };

    let mut store = super::open_store(&config);
    let key = super::mailbox_key(account);
    let mut mailbox = store
        .fetch::<Mailbox>(&key)
        .map(|mut mailbox| {
            mailbox.apply_config(account_config);
            mailbox
        })
        .unwrap_or_else(|| Mailbox::from_config(account_config));
    mailbox.password = password;

    if !store.store(&key, &mailbox) {
        die!(EX_IOERR, "Failed to save the password");
    }
    println!("Password for '{}' saved.", account);
}
