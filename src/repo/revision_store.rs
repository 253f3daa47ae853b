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

use crate::backend::{Backend, BackendConfig, Settings};
use crate::diff::{Diff, DiffSide};
use crate::key::Key;
use crate::revision::Revision;

/// The public contract of a versioned key-value content store.
///
/// A `RevisionStore` owns exactly one [`Backend`], which is selected when the store is created
/// and never changes afterwards. It is meant to be created once when the application starts and
/// then shared, for example behind an `Arc`.
///
/// Failures on the write path (`initial` and `commit`) are always returned to the caller, and a
/// log which cannot be reached is reported as `Error::Unavailable`. Failures on the read path are
/// returned as well, so that callers like [`RevisionView`] can decide how to degrade.
///
/// # Examples
/// ```
/// use rcs_store::backend::{BackendConfig, Settings};
/// use rcs_store::repo::RevisionStore;
/// use rcs_store::{Key, Revision};
///
/// fn main() -> rcs_store::Result<()> {
///     let settings = Settings {
///         backend: Some(String::from("memory")),
///         path: None,
///     };
///     let store = RevisionStore::from_settings(&settings)?;
///
///     let key = Key::new("blog/post/body/1.txt")?;
///     let first = store.commit(&key, b"Hello")?;
///     store.commit(&key, b"Hello, world!")?;
///
///     assert_eq!(store.fetch(&key, &first)?, b"Hello");
///     assert_eq!(store.fetch(&key, &Revision::Head)?, b"Hello, world!");
///     assert_eq!(store.revisions(&key)?, vec![first]);
///     Ok(())
/// }
/// ```
///
/// [`Backend`]: crate::backend::Backend
/// [`RevisionView`]: crate::repo::RevisionView
#[derive(Debug)]
pub struct RevisionStore {
    backend: Box<dyn Backend>,
}

impl RevisionStore {
    /// Create a store which uses the given `backend`.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        RevisionStore { backend }
    }

    /// Open the backend described by `config` and create a store which uses it.
    ///
    /// # Errors
    /// - `Error::UnsupportedFormat`: The existing log has an unsupported format.
    /// - `Error::Store`: An error occurred opening the log.
    /// - `Error::Io`: An I/O error occurred.
    pub fn open(config: &BackendConfig) -> crate::Result<Self> {
        Ok(Self::new(config.open()?))
    }

    /// Select a backend from `settings`, open it, and create a store which uses it.
    ///
    /// # Errors
    /// - `Error::UnknownBackend`: The configured backend name is not available.
    /// - `Error::Config`: The backend configuration is incomplete.
    /// - `Error::UnsupportedFormat`: The existing log has an unsupported format.
    /// - `Error::Store`: An error occurred opening the log.
    /// - `Error::Io`: An I/O error occurred.
    pub fn from_settings(settings: &Settings) -> crate::Result<Self> {
        Self::open(&BackendConfig::from_settings(settings)?)
    }

    /// Return the backend this store uses.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Set up the log and the namespace `prefix`.
    ///
    /// See [`Backend::initial`].
    ///
    /// [`Backend::initial`]: crate::backend::Backend::initial
    pub fn initial(&self, prefix: &str) -> crate::Result<()> {
        self.backend
            .initial(prefix)
            .map_err(crate::Error::into_unavailable)
    }

    /// Commit `data` as the new head of `key` and return the new revision.
    ///
    /// See [`Backend::commit`].
    ///
    /// [`Backend::commit`]: crate::backend::Backend::commit
    pub fn commit(&self, key: &Key, data: &[u8]) -> crate::Result<Revision> {
        self.backend
            .commit(key, data)
            .map_err(crate::Error::into_unavailable)
    }

    /// Return the content of `key` at `revision`.
    ///
    /// See [`Backend::fetch`].
    ///
    /// [`Backend::fetch`]: crate::backend::Backend::fetch
    pub fn fetch(&self, key: &Key, revision: &Revision) -> crate::Result<Vec<u8>> {
        self.backend.fetch(key, revision)
    }

    /// Return the prior revisions of `key`, newest first.
    ///
    /// See [`Backend::get_revisions`].
    ///
    /// [`Backend::get_revisions`]: crate::backend::Backend::get_revisions
    pub fn revisions(&self, key: &Key) -> crate::Result<Vec<Revision>> {
        self.backend.get_revisions(key)
    }

    /// Rename `from` to `to`, keeping its history.
    ///
    /// This returns `false` on any failure.
    pub fn move_key(&self, from: &Key, to: &Key) -> bool {
        self.backend.move_key(from, to)
    }

    /// Return a diff from `key1` at `rev1` to `key2` at `rev2`.
    ///
    /// Nothing is read until the lines of the diff are requested.
    pub fn diff(&self, key1: &Key, rev1: &Revision, key2: &Key, rev2: &Revision) -> Diff<'_> {
        Diff::new(
            self.backend(),
            DiffSide::Stored {
                key: key1.clone(),
                revision: *rev1,
            },
            DiffSide::Stored {
                key: key2.clone(),
                revision: *rev2,
            },
        )
    }

    /// Return a diff from `key` at `revision` to the live value `content`.
    ///
    /// The live value is used as-is, so it may include changes which have not been committed.
    pub fn diff_live(&self, key: &Key, revision: &Revision, content: &[u8]) -> Diff<'_> {
        Diff::new(
            self.backend(),
            DiffSide::Stored {
                key: key.clone(),
                revision: *revision,
            },
            DiffSide::Live {
                content: content.to_vec(),
            },
        )
    }
}

impl From<Box<dyn Backend>> for RevisionStore {
    fn from(backend: Box<dyn Backend>) -> Self {
        Self::new(backend)
    }
}
