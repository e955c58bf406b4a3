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

//! Key-value persistence.
//!
//! Stores are best-effort local caches: routine failure is reported through
//! return values rather than errors. A missing key, a lock that cannot be
//! taken, or an undecryptable value are all ordinary outcomes and all look
//! the same to the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod file;

/// Maps opaque string keys to serialisable values.
pub trait KeyValueStore {
    /// Retrieve the value stored under `key`, or `None` if it cannot be
    /// produced for any reason.
    fn fetch<T: DeserializeOwned>(&mut self, key: &str) -> Option<T>;

    /// Store `value` under `key`, replacing anything already there.
    ///
    /// False on failure; prior contents are unspecified in that case.
    fn store<T: Serialize>(&mut self, key: &str, value: &T) -> bool;

    /// Whether the store currently holds `key`.
    fn has_key(&mut self, key: &str) -> bool;

    /// Remove `key`. True iff the key is absent afterwards, so clearing an
    /// absent key succeeds.
    fn clear(&mut self, key: &str) -> bool;
}
