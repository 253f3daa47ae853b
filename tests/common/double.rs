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

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rcs_store::backend::{Backend, LogBackend};
use rcs_store::store::MemoryStore;
use rcs_store::{Key, Revision};

/// The shared counters of a [`CountingBackend`].
#[derive(Debug, Default)]
pub struct Calls {
    fetch: AtomicUsize,
    diff: AtomicUsize,
    fail_reads: AtomicBool,
}

impl Calls {
    /// The number of calls which read from the log.
    pub fn reads(&self) -> usize {
        self.fetch.load(Ordering::SeqCst) + self.diff.load(Ordering::SeqCst)
    }

    /// Make every following read fail.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> rcs_store::Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(rcs_store::Error::Unavailable(anyhow::anyhow!(
                "reads are disabled"
            )))
        } else {
            Ok(())
        }
    }
}

/// A backend which counts the reads made through it and can be made to fail them.
#[derive(Debug)]
pub struct CountingBackend {
    inner: LogBackend<MemoryStore>,
    calls: Arc<Calls>,
}

impl CountingBackend {
    pub fn new() -> (Self, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let backend = CountingBackend {
            inner: LogBackend::new(MemoryStore::new()),
            calls: Arc::clone(&calls),
        };
        (backend, calls)
    }
}

impl Backend for CountingBackend {
    fn initial(&self, prefix: &str) -> rcs_store::Result<()> {
        self.inner.initial(prefix)
    }

    fn commit(&self, key: &Key, data: &[u8]) -> rcs_store::Result<Revision> {
        self.inner.commit(key, data)
    }

    fn fetch(&self, key: &Key, revision: &Revision) -> rcs_store::Result<Vec<u8>> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        self.calls.check()?;
        self.inner.fetch(key, revision)
    }

    fn get_revisions(&self, key: &Key) -> rcs_store::Result<Vec<Revision>> {
        self.inner.get_revisions(key)
    }

    fn move_key(&self, from: &Key, to: &Key) -> bool {
        self.inner.move_key(from, to)
    }

    fn diff(
        &self,
        key1: &Key,
        rev1: &Revision,
        key2: &Key,
        rev2: &Revision,
    ) -> rcs_store::Result<Vec<String>> {
        self.calls.diff.fetch_add(1, Ordering::SeqCst);
        self.calls.check()?;
        self.inner.diff(key1, rev1, key2, rev2)
    }
}
