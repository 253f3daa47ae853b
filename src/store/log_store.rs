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
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use static_assertions::assert_obj_safe;

use crate::key::Key;
use crate::revision::{ContentHash, RevisionId};

/// A single change recorded by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// The content of `key` was replaced by the blob `blob`.
    Write { key: Key, blob: ContentHash },

    /// The key `from` was renamed to `to`, keeping its content and history.
    Move { from: Key, to: Key },
}

/// A commit in an append-only log.
///
/// Commits are immutable once they are appended to a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The revision which was the head of the log when this commit was appended.
    pub parent: Option<RevisionId>,

    /// The change recorded by this commit.
    pub change: Change,

    /// A human-readable description of the change.
    pub message: String,

    /// The time this commit was created.
    pub created: SystemTime,
}

impl Commit {
    /// Serialize this commit to bytes.
    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|_| crate::Error::Serialize)
    }

    /// Deserialize a commit from bytes.
    pub fn decode(data: &[u8]) -> crate::Result<Self> {
        rmp_serde::from_slice(data).map_err(|_| crate::Error::Deserialize)
    }
}

/// A persistent, append-only log of commits and the blobs they reference.
///
/// A `LogStore` provides only the most basic storage operations. Resolving revisions, following
/// renames and listing history are implemented once on top of this trait by [`LogBackend`], so
/// that every log technology behaves the same.
///
/// Implementations must be safe to share between threads, and reads must never observe a
/// partially appended commit.
///
/// [`LogBackend`]: crate::backend::LogBackend
pub trait LogStore: fmt::Debug + Send + Sync {
    /// Set up the storage root of this log and the namespace `prefix`.
    ///
    /// This also sets up every ancestor of `prefix`. Calling this more than once, or concurrently,
    /// is not an error.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: The `prefix` is not a valid namespace.
    /// - `Error::Unavailable`: The storage root or the namespace could not be created.
    fn initial(&self, prefix: &str) -> crate::Result<()>;

    /// Return whether the given `namespace` has been set up with `initial`.
    fn contains_namespace(&self, namespace: &str) -> crate::Result<bool>;

    /// Open a reader which sees the commits and blobs of this log.
    ///
    /// A reader reuses one handle to the underlying storage, so walking many commits through one
    /// reader is much cheaper than calling [`read_commit`] for each of them.
    ///
    /// [`read_commit`]: crate::store::LogStore::read_commit
    fn reader(&self) -> crate::Result<Box<dyn LogReader + '_>>;

    /// Return the ID of the newest commit, or `None` if the log is empty.
    fn head(&self) -> crate::Result<Option<RevisionId>> {
        self.reader()?.head()
    }

    /// Return the commit with the given `id`, or `None` if there is no such commit.
    ///
    /// An `id` of a kind this log does not produce is treated as missing.
    fn read_commit(&self, id: &RevisionId) -> crate::Result<Option<Commit>> {
        self.reader()?.read_commit(id)
    }

    /// Return the blob with the given `id`, or `None` if there is no such blob.
    fn read_blob(&self, id: &ContentHash) -> crate::Result<Option<Vec<u8>>> {
        self.reader()?.read_blob(id)
    }

    /// Acquire the exclusive write lock of this log and start appending.
    ///
    /// This blocks until the lock is available. The lock is released when the returned
    /// transaction is consumed or dropped.
    fn begin(&self) -> crate::Result<Box<dyn LogTransaction + '_>>;
}

assert_obj_safe!(LogStore);

/// A read handle on a [`LogStore`].
///
/// A reader never blocks appends. Each call sees the log as of that call, so a head read through
/// a reader may be followed by newer commits; the commits it already returned never change.
///
/// [`LogStore`]: crate::store::LogStore
pub trait LogReader {
    /// Return the ID of the newest commit, or `None` if the log is empty.
    fn head(&self) -> crate::Result<Option<RevisionId>>;

    /// Return the commit with the given `id`, or `None` if there is no such commit.
    ///
    /// An `id` of a kind this log does not produce is treated as missing.
    fn read_commit(&self, id: &RevisionId) -> crate::Result<Option<Commit>>;

    /// Return the blob with the given `id`, or `None` if there is no such blob.
    fn read_blob(&self, id: &ContentHash) -> crate::Result<Option<Vec<u8>>>;
}

assert_obj_safe!(LogReader);

/// An exclusive, in-progress append to a [`LogStore`].
///
/// Dropping a transaction without calling [`append`] abandons it. Blobs written by an abandoned
/// transaction may remain in the log, but they are never referenced.
///
/// [`LogStore`]: crate::store::LogStore
/// [`append`]: crate::store::LogTransaction::append
pub trait LogTransaction {
    /// Return the ID of the newest commit.
    ///
    /// This cannot change while the transaction is held.
    fn head(&self) -> crate::Result<Option<RevisionId>>;

    /// Store the given `data` and return its hash.
    ///
    /// Writing the same data twice is not an error.
    fn write_blob(&mut self, data: &[u8]) -> crate::Result<ContentHash>;

    /// Append `commit` as the new head of the log and release the lock.
    ///
    /// The commit becomes visible to readers atomically.
    fn append(self: Box<Self>, commit: Commit) -> crate::Result<RevisionId>;
}
