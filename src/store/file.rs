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

//! The encrypted file-backed store.
//!
//! Each key-value pair lives in its own file under the store root. The file
//! name is the SHA-256 digest of the key, so on-disk names never reveal the
//! keys themselves; the file content is the encrypted, hex-encoded CBOR
//! serialisation of the value.
//!
//! The file system is the concurrency boundary. Every read takes a shared
//! `flock` and every write an exclusive one, scoped to that one key's file
//! for the duration of the operation, so independent processes can work on
//! the same store and unrelated keys never contend. Nothing spans keys;
//! multi-key consistency is explicitly not provided.
//!
//! Writes truncate and rewrite in place under the exclusive lock rather
//! than staging to a temporary file, so a crash mid-write can leave a torn
//! file behind. `fetch` treats such a file as a miss.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;

use log::{debug, warn};
use nix::fcntl::{flock, FlockArg};
use openssl::hash::{hash, MessageDigest};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::KeyValueStore;
use crate::crypt::codec::EncryptionCodec;
use crate::crypt::hex::bin2hex;
use crate::support::error::Error;

pub struct EncryptedFileStore {
    codec: EncryptionCodec,
    root: PathBuf,
    /// Key to file name, cached for the lifetime of this instance. Never
    /// persisted; every instance rederives names on demand.
    filename_cache: HashMap<String, String>,
}

impl EncryptedFileStore {
    /// Create a store rooted at `root`, protected by `secret`.
    ///
    /// `root` must already exist; the store never creates it. See
    /// `EncryptionCodec::new` for `secret_is_hashed`.
    pub fn new(
        root: impl Into<PathBuf>,
        secret: &[u8],
        secret_is_hashed: bool,
    ) -> Result<Self, Error> {
        Ok(EncryptedFileStore {
            codec: EncryptionCodec::new(secret, secret_is_hashed)?,
            root: root.into(),
            filename_cache: HashMap::new(),
        })
    }

    /// The path of the file holding `key`, hashing the key if this instance
    /// has not seen it before.
    fn value_path(&mut self, key: &str) -> Result<PathBuf, Error> {
        if !self.filename_cache.contains_key(key) {
            let digest =
                bin2hex(&hash(MessageDigest::sha256(), key.as_bytes())?);
            self.filename_cache.insert(key.to_owned(), digest);
        }
        Ok(self.root.join(&self.filename_cache[key]))
    }

    fn try_store<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), Error> {
        let encrypted = self.codec.encrypt(&serde_cbor::to_vec(value)?)?;
        let path = self.value_path(key)?;

        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)?;
        flock(file.as_raw_fd(), FlockArg::LockExclusive)?;
        // Truncate only once the exclusive lock is held.
        let written = file
            .set_len(0)
            .and_then(|_| (&file).write_all(encrypted.as_bytes()));
        let _ = flock(file.as_raw_fd(), FlockArg::Unlock);
        written?;
        Ok(())
    }

    fn try_fetch(&mut self, key: &str) -> Option<Vec<u8>> {
        let path = self.value_path(key).ok()?;
        if !path.is_file() {
            return None;
        }

        let mut file = fs::File::open(&path).ok()?;
        flock(file.as_raw_fd(), FlockArg::LockShared).ok()?;
        let mut stored = String::new();
        let read = file.read_to_string(&mut stored);
        let _ = flock(file.as_raw_fd(), FlockArg::Unlock);
        read.ok()?;

        match self.codec.decrypt(&stored) {
            Ok(decrypted) => Some(decrypted),
            Err(e) => {
                debug!(
                    "undecryptable value at {}, treating as missing: {}",
                    path.display(),
                    e
                );
                None
            },
        }
    }
}

impl KeyValueStore for EncryptedFileStore {
    fn fetch<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.try_fetch(key)
            .and_then(|decrypted| serde_cbor::from_slice(&decrypted).ok())
    }

    fn store<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        match self.try_store(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("store under {} failed: {}", self.root.display(), e);
                false
            },
        }
    }

    fn has_key(&mut self, key: &str) -> bool {
        self.value_path(key)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    fn clear(&mut self, key: &str) -> bool {
        let path = match self.value_path(key) {
            Ok(path) => path,
            Err(_) => return false,
        };
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(ref e) if std::io::ErrorKind::NotFound == e.kind() => true,
            Err(e) => {
                warn!("removing {} failed: {}", path.display(), e);
                false
            },
        }
    }
}
