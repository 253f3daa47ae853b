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

use super::backend::Backend;
use crate::key::Key;
use crate::revision::Revision;

/// A [`Backend`] which is selected when no backend has been configured.
///
/// Every operation fails with `Error::NotConfigured` and `move_key` always returns `false`. This
/// keeps a misconfigured application from silently losing history.
///
/// [`Backend`]: crate::backend::Backend
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyBackend;

impl Backend for DummyBackend {
    fn initial(&self, _prefix: &str) -> crate::Result<()> {
        Err(crate::Error::NotConfigured)
    }

    fn commit(&self, _key: &Key, _data: &[u8]) -> crate::Result<Revision> {
        Err(crate::Error::NotConfigured)
    }

    fn fetch(&self, _key: &Key, _revision: &Revision) -> crate::Result<Vec<u8>> {
        Err(crate::Error::NotConfigured)
    }

    fn get_revisions(&self, _key: &Key) -> crate::Result<Vec<Revision>> {
        Err(crate::Error::NotConfigured)
    }

    fn move_key(&self, from: &Key, to: &Key) -> bool {
        log::warn!(
            "Could not move {} to {}: no revision control backend has been configured",
            from,
            to
        );
        false
    }

    fn diff(
        &self,
        _key1: &Key,
        _rev1: &Revision,
        _key2: &Key,
        _rev2: &Revision,
    ) -> crate::Result<Vec<String>> {
        Err(crate::Error::NotConfigured)
    }
}
