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

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use super::log_store::{Commit, LogReader, LogStore, LogTransaction};
use super::open_store::OpenStore;
use crate::key::is_valid_namespace;
use crate::revision::{ContentHash, RevisionId};

#[derive(Debug, Default)]
struct MemoryLog {
    namespaces: HashSet<String>,
    commits: Vec<Commit>,
    blobs: HashMap<ContentHash, Vec<u8>>,
}

impl MemoryLog {
    fn head(&self) -> Option<RevisionId> {
        match self.commits.len() {
            0 => None,
            len => Some(RevisionId::Number(len as u64)),
        }
    }
}

#[derive(Debug, Default)]
struct SharedLog {
    log: RwLock<MemoryLog>,
    write_lock: Mutex<()>,
}

/// The configuration for opening a [`MemoryStore`].
///
/// Every store opened from the same `MemoryConfig` (or a clone of it) shares the same log.
///
/// [`MemoryStore`]: crate::store::MemoryStore
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    shared: Arc<SharedLog>,
}

impl MemoryConfig {
    /// Create a new `MemoryConfig` with an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OpenStore for MemoryConfig {
    type Store = MemoryStore;

    fn open(&self) -> crate::Result<Self::Store> {
        Ok(MemoryStore {
            shared: Arc::clone(&self.shared),
        })
    }
}

/// A `LogStore` which stores a centralized log in memory.
///
/// Unlike other `LogStore` implementations, data in a `MemoryStore` is not stored persistently
/// and is only accessible to the current process. This log store is useful for testing.
///
/// Revisions are numbered sequentially starting at 1. None of the methods in this log store will
/// ever return `Err` except for invalid arguments.
///
/// You can use [`MemoryConfig`] to open a log store of this type.
///
/// [`MemoryConfig`]: crate::store::MemoryConfig
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<SharedLog>,
}

impl MemoryStore {
    /// Create a new `MemoryStore` with an empty log.
    pub fn new() -> Self {
        MemoryStore {
            shared: Arc::new(SharedLog::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore for MemoryStore {
    fn initial(&self, prefix: &str) -> crate::Result<()> {
        if !is_valid_namespace(prefix) {
            return Err(crate::Error::InvalidKey(prefix.to_string()));
        }

        let mut log = self.shared.log.write();
        let mut namespace = prefix;
        loop {
            log.namespaces.insert(namespace.to_string());
            match namespace.rfind('/') {
                Some(index) => namespace = &namespace[..index],
                None if namespace.is_empty() => break,
                None => namespace = "",
            }
        }

        Ok(())
    }

    fn contains_namespace(&self, namespace: &str) -> crate::Result<bool> {
        Ok(self.shared.log.read().namespaces.contains(namespace))
    }

    fn reader(&self) -> crate::Result<Box<dyn LogReader + '_>> {
        Ok(Box::new(MemoryReader {
            shared: &self.shared,
        }))
    }

    fn begin(&self) -> crate::Result<Box<dyn LogTransaction + '_>> {
        Ok(Box::new(MemoryTransaction {
            shared: &self.shared,
            _guard: self.shared.write_lock.lock(),
        }))
    }
}

struct MemoryReader<'a> {
    shared: &'a SharedLog,
}

impl<'a> LogReader for MemoryReader<'a> {
    fn head(&self) -> crate::Result<Option<RevisionId>> {
        Ok(self.shared.log.read().head())
    }

    fn read_commit(&self, id: &RevisionId) -> crate::Result<Option<Commit>> {
        // Revision numbers too large for this platform can't name a commit.
        let index = match id {
            RevisionId::Number(number) if *number > 0 => usize::try_from(*number - 1).ok(),
            _ => None,
        };
        Ok(index.and_then(|index| self.shared.log.read().commits.get(index).cloned()))
    }

    fn read_blob(&self, id: &ContentHash) -> crate::Result<Option<Vec<u8>>> {
        Ok(self.shared.log.read().blobs.get(id).cloned())
    }
}

struct MemoryTransaction<'a> {
    shared: &'a SharedLog,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> LogTransaction for MemoryTransaction<'a> {
    fn head(&self) -> crate::Result<Option<RevisionId>> {
        Ok(self.shared.log.read().head())
    }

    fn write_blob(&mut self, data: &[u8]) -> crate::Result<ContentHash> {
        let hash = ContentHash::of(data);
        self.shared
            .log
            .write()
            .blobs
            .entry(hash)
            .or_insert_with(|| data.to_vec());
        Ok(hash)
    }

    fn append(self: Box<Self>, commit: Commit) -> crate::Result<RevisionId> {
        let mut log = self.shared.log.write();
        log.commits.push(commit);
        Ok(RevisionId::Number(log.commits.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::SystemTime;

    use crate::key::Key;
    use crate::store::Change;

    #[test]
    fn out_of_range_numbers_are_missing() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut transaction = store.begin()?;
        let blob = transaction.write_blob(b"data")?;
        let first = transaction.append(Commit {
            parent: None,
            change: Change::Write {
                key: Key::new("a/one.txt")?,
                blob,
            },
            message: String::from("Commit a/one.txt"),
            created: SystemTime::now(),
        })?;

        assert_eq!(first, RevisionId::Number(1));
        assert!(store.read_commit(&first)?.is_some());
        assert!(store.read_commit(&RevisionId::Number(0))?.is_none());
        assert!(store.read_commit(&RevisionId::Number(2))?.is_none());
        assert!(store.read_commit(&RevisionId::Number((1 << 32) + 1))?.is_none());
        assert!(store.read_commit(&RevisionId::Number(u64::MAX))?.is_none());
        assert!(store.read_commit(&RevisionId::Hash(ContentHash::of(b"data")))?.is_none());
        Ok(())
    }
}
