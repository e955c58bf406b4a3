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

use std::fs;
use std::os::unix::fs::DirBuilderExt;

use crate::store::file::EncryptedFileStore;
use crate::support::user_config::Config;

pub mod main;

mod check;
mod password;

/// Open the configured store, creating its directory on first use.
///
/// The directory is made mode 0700 since its contents, while encrypted,
/// are nobody else's business.
pub(super) fn open_store(config: &Config) -> EncryptedFileStore {
    let path = &config.store.path;
    if !path.is_dir() {
        if let Err(e) =
            fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
        {
            die!(EX_CANTCREAT, "Failed to create '{}': {}", path.display(), e);
        }
    }

    match EncryptedFileStore::new(
        path,
        config.store.secret.as_bytes(),
        config.store.secret_is_hashed,
    ) {
        Ok(store) => store,
        Err(e) => die!(EX_CONFIG, "Unable to open store: {}", e),
    }
}

/// The store key under which an account's mailbox record lives.
pub(super) fn mailbox_key(account_name: &str) -> String {
    format!("mailbox:{}", account_name)
}
