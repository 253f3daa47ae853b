/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::fmt;

use static_assertions::assert_obj_safe;

use crate::diff::{revision_label, unified_diff};
use crate::key::Key;
use crate::revision::Revision;

/// A pluggable engine which versions content in an append-only log.
///
/// Every backend implements the same six operations with the same semantics, so callers never
/// need to know which log technology is in use. Revision identifiers are backend-specific and are
/// never comparable between backends.
///
/// Backends are shared between threads. Concurrent commits are serialized by the backend, and
/// reads never observe a partially written snapshot.
pub trait Backend: fmt::Debug + Send + Sync {
    /// Set up the storage root of the log and the namespace `prefix`.
    ///
    /// A namespace is a partial key like `collection/entity_type/field`. This is idempotent; it is
    /// not an error if the root or the namespace already exists.
    ///
    /// # Errors
    /// - `Error::Unavailable`: The storage root or the namespace could not be created.
    /// - `Error::InvalidKey`: The `prefix` is not a valid namespace.
    /// - `Error::NotConfigured`: No backend has been configured.
    fn initial(&self, prefix: &str) -> crate::Result<()>;

    /// Commit `data` as the new head snapshot of `key` and return the new revision.
    ///
    /// If the namespace containing `key` does not exist, it is set up with `initial` and the
    /// commit is retried once. A new revision is created even if `data` is identical to the
    /// current head.
    ///
    /// # Errors
    /// - `Error::Unavailable`: The log could not be written.
    /// - `Error::NotConfigured`: No backend has been configured.
    fn commit(&self, key: &Key, data: &[u8]) -> crate::Result<Revision>;

    /// Return the content of `key` at `revision`.
    ///
    /// If `revision` does not exist in the log, this returns the head content instead. If `key`
    /// has no history, this returns empty content.
    ///
    /// # Errors
    /// - `Error::Store`: An error occurred reading the log.
    /// - `Error::Io`: An I/O error occurred.
    /// - `Error::NotConfigured`: No backend has been configured.
    fn fetch(&self, key: &Key, revision: &Revision) -> crate::Result<Vec<u8>>;

    /// Return the revisions which modified `key`, newest first.
    ///
    /// The newest revision, which the caller already has as the head value, is excluded. This
    /// returns an empty list for a key with no prior history.
    ///
    /// # Errors
    /// - `Error::Store`: An error occurred reading the log.
    /// - `Error::Io`: An I/O error occurred.
    /// - `Error::NotConfigured`: No backend has been configured.
    fn get_revisions(&self, key: &Key) -> crate::Result<Vec<Revision>>;

    /// Rename `from` to `to`, keeping its history, as a single new revision.
    ///
    /// This returns `false` instead of an error on any failure, so that callers moving many keys
    /// can continue past individual failures.
    fn move_key(&self, from: &Key, to: &Key) -> bool;

    /// Return the lines of a unified diff from `key1` at `rev1` to `key2` at `rev2`.
    ///
    /// The keys may differ to support diffing across a rename. The default implementation fetches
    /// both snapshots and diffs them locally.
    fn diff(
        &self,
        key1: &Key,
        rev1: &Revision,
        key2: &Key,
        rev2: &Revision,
    ) -> crate::Result<Vec<String>> {
        let old = self.fetch(key1, rev1)?;
        let new = self.fetch(key2, rev2)?;
        Ok(unified_diff(
            &old,
            &new,
            &revision_label(rev1),
            &revision_label(rev2),
        ))
    }
}

assert_obj_safe!(Backend);

impl Backend for Box<dyn Backend> {
    fn initial(&self, prefix: &str) -> crate::Result<()> {
        self.as_ref().initial(prefix)
    }

    fn commit(&self, key: &Key, data: &[u8]) -> crate::Result<Revision> {
        self.as_ref().commit(key, data)
    }

    fn fetch(&self, key: &Key, revision: &Revision) -> crate::Result<Vec<u8>> {
        self.as_ref().fetch(key, revision)
    }

    fn get_revisions(&self, key: &Key) -> crate::Result<Vec<Revision>> {
        self.as_ref().get_revisions(key)
    }

    fn move_key(&self, from: &Key, to: &Key) -> bool {
        self.as_ref().move_key(from, to)
    }

    fn diff(
        &self,
        key1: &Key,
        rev1: &Revision,
        key2: &Key,
        rev2: &Revision,
    ) -> crate::Result<Vec<String>> {
        self.as_ref().diff(key1, rev1, key2, rev2)
    }
}
