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

use std::time::SystemTime;

use super::backend::Backend;
use crate::key::Key;
use crate::revision::{ContentHash, Revision, RevisionId};
use crate::store::{Change, Commit, LogReader, LogStore};

/// An iterator over the commits of a log, starting at a revision and following parents.
struct Ancestry<'a> {
    reader: &'a dyn LogReader,
    next: Option<RevisionId>,
}

impl<'a> Ancestry<'a> {
    fn new(reader: &'a dyn LogReader, start: Option<RevisionId>) -> Self {
        Ancestry {
            reader,
            next: start,
        }
    }
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = crate::Result<(RevisionId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match self.reader.read_commit(&id) {
            Ok(Some(commit)) => {
                self.next = commit.parent;
                Some(Ok((id, commit)))
            }
            // A parent which does not exist means the log is missing a commit.
            Ok(None) => Some(Err(crate::Error::Corrupt)),
            Err(error) => Some(Err(error)),
        }
    }
}

/// A [`Backend`] which resolves revisions over any [`LogStore`].
///
/// All the revision-resolution logic lives here, so every log store behaves the same:
/// - A key's history follows renames backwards, so content committed before a move can still be
/// fetched under the new key.
/// - A key which was moved away has no history of its own; it reads as empty at every revision
/// until it is written again.
/// - Fetching a revision which does not exist falls back to the head.
///
/// [`Backend`]: crate::backend::Backend
/// [`LogStore`]: crate::store::LogStore
#[derive(Debug)]
pub struct LogBackend<S: LogStore> {
    store: S,
}

impl<S: LogStore> LogBackend<S> {
    /// Create a new backend which stores its history in `store`.
    pub fn new(store: S) -> Self {
        LogBackend { store }
    }

    /// Return a reference to the underlying log store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume this backend and return the underlying log store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Return the blob holding the content of `key` at `target`.
    ///
    /// `key` is the name of the key at `head`, and `target` must be `head` or one of its
    /// ancestors. This returns `None` if the key did not exist at `target`.
    fn resolve(
        reader: &dyn LogReader,
        key: &Key,
        target: RevisionId,
        head: RevisionId,
    ) -> crate::Result<Option<ContentHash>> {
        let mut name = key.clone();
        let mut reached = false;

        for entry in Ancestry::new(reader, Some(head)) {
            let (id, commit) = entry?;
            if id == target {
                reached = true;
            }

            match commit.change {
                Change::Write { key, blob } if key == name => {
                    if reached {
                        return Ok(Some(blob));
                    }
                }
                Change::Move { from, to } if to == name => name = from,
                Change::Move { from, .. } if from == name => return Ok(None),
                _ => {}
            }
        }

        Ok(None)
    }

    fn read_content(reader: &dyn LogReader, blob: Option<ContentHash>) -> crate::Result<Vec<u8>> {
        match blob {
            Some(id) => reader.read_blob(&id)?.ok_or(crate::Error::Corrupt),
            None => Ok(Vec::new()),
        }
    }

    fn write(&self, key: &Key, data: &[u8]) -> crate::Result<RevisionId> {
        let namespace = key.namespace();
        if !self.store.contains_namespace(namespace)? {
            return Err(crate::Error::NamespaceMissing(namespace.to_string()));
        }

        let mut transaction = self.store.begin()?;
        let blob = transaction.write_blob(data)?;
        let parent = transaction.head()?;
        transaction.append(Commit {
            parent,
            change: Change::Write {
                key: key.clone(),
                blob,
            },
            message: format!("Commit {}", key),
            created: SystemTime::now(),
        })
    }

    fn try_move(&self, from: &Key, to: &Key) -> crate::Result<RevisionId> {
        if from == to {
            return Err(crate::Error::AlreadyExists(to.to_string()));
        }

        let namespace = to.namespace();
        if !self.store.contains_namespace(namespace)? {
            self.store.initial(namespace)?;
        }

        let transaction = self.store.begin()?;
        let head = transaction
            .head()?
            .ok_or_else(|| crate::Error::NotFound(from.to_string()))?;

        let reader = self.store.reader()?;
        if Self::resolve(&*reader, from, head, head)?.is_none() {
            return Err(crate::Error::NotFound(from.to_string()));
        }
        if Self::resolve(&*reader, to, head, head)?.is_some() {
            return Err(crate::Error::AlreadyExists(to.to_string()));
        }

        transaction.append(Commit {
            parent: Some(head),
            change: Change::Move {
                from: from.clone(),
                to: to.clone(),
            },
            message: format!("Moved {} to {}", from, to),
            created: SystemTime::now(),
        })
    }
}

impl<S: LogStore> Backend for LogBackend<S> {
    fn initial(&self, prefix: &str) -> crate::Result<()> {
        self.store
            .initial(prefix)
            .map_err(crate::Error::into_unavailable)?;
        log::debug!("Set up namespace '{}'", prefix);
        Ok(())
    }

    fn commit(&self, key: &Key, data: &[u8]) -> crate::Result<Revision> {
        let id = match self.write(key, data) {
            Err(crate::Error::NamespaceMissing(namespace)) => {
                log::debug!(
                    "Setting up namespace '{}' before committing {}",
                    namespace,
                    key
                );
                self.initial(key.namespace())?;
                self.write(key, data)
            }
            result => result,
        }
        .map_err(crate::Error::into_unavailable)?;

        log::debug!("Committed {} as revision {}", key, id);
        Ok(Revision::Id(id))
    }

    fn fetch(&self, key: &Key, revision: &Revision) -> crate::Result<Vec<u8>> {
        let reader = self.store.reader()?;

        // Check the requested revision before reading the head, so the head is never older.
        let requested = match revision {
            Revision::Head => None,
            Revision::Id(id) => {
                if reader.read_commit(id)?.is_some() {
                    Some(*id)
                } else {
                    log::debug!(
                        "Revision {} of {} does not exist; using the head instead",
                        id,
                        key
                    );
                    None
                }
            }
        };

        let head = match reader.head()? {
            Some(head) => head,
            None => return Ok(Vec::new()),
        };

        let blob = Self::resolve(&*reader, key, requested.unwrap_or(head), head)?;
        Self::read_content(&*reader, blob)
    }

    fn get_revisions(&self, key: &Key) -> crate::Result<Vec<Revision>> {
        let reader = self.store.reader()?;
        let mut revisions = Vec::new();
        let mut name = key.clone();

        for entry in Ancestry::new(&*reader, reader.head()?) {
            let (id, commit) = entry?;
            match commit.change {
                Change::Write { key, .. } if key == name => revisions.push(id),
                Change::Move { from, to } if to == name => {
                    revisions.push(id);
                    name = from;
                }
                Change::Move { from, .. } if from == name => break,
                _ => {}
            }
        }

        // The newest revision is the head value, which the caller already has.
        Ok(revisions.into_iter().skip(1).map(Revision::Id).collect())
    }

    fn move_key(&self, from: &Key, to: &Key) -> bool {
        match self.try_move(from, to) {
            Ok(id) => {
                log::info!("Moved {} to {} in revision {}", from, to, id);
                true
            }
            Err(error) => {
                log::warn!("Could not move {} to {}: {}", from, to, error);
                false
            }
        }
    }
}
