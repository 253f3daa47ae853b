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

use crate::diff::Diff;
use crate::key::{Key, KeyFormat, KeyParts};
use crate::revision::Revision;

use super::projection::Record;
use super::revision_store::RevisionStore;

/// A field of an entity type whose values are versioned in a [`RevisionStore`].
///
/// The value of the field for one entity is stored under the key produced by the field's
/// [`KeyFormat`] from the collection, the entity type, the field name and the entity's
/// identifier.
///
/// [`RevisionStore`]: crate::repo::RevisionStore
/// [`KeyFormat`]: crate::key::KeyFormat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedField {
    collection: String,
    entity_type: String,
    name: String,
    format: KeyFormat,
}

impl VersionedField {
    /// Create a field which uses the default key format.
    pub fn new(
        collection: impl Into<String>,
        entity_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        VersionedField {
            collection: collection.into(),
            entity_type: entity_type.into(),
            name: name.into(),
            format: KeyFormat::default(),
        }
    }

    /// Use `format` to build the keys of this field.
    pub fn with_format(mut self, format: KeyFormat) -> Self {
        self.format = format;
        self
    }

    /// The collection which contains the entity type.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The name of the entity type.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The name of this field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key format of this field.
    pub fn format(&self) -> &KeyFormat {
        &self.format
    }

    /// Return the key of this field for the entity with the given `identifier`.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: A part of the key is empty or contains a `/`.
    pub fn key(&self, identifier: &str) -> crate::Result<Key> {
        self.key_in(&self.format, identifier)
    }

    /// Return the key of this field for `identifier` using a different key `format`.
    pub(crate) fn key_in(&self, format: &KeyFormat, identifier: &str) -> crate::Result<Key> {
        format.resolve(&KeyParts {
            collection: &self.collection,
            entity_type: &self.entity_type,
            field: &self.name,
            identifier,
        })
    }

    /// Return the namespace which contains every key of this field.
    pub fn prefix(&self) -> crate::Result<String> {
        self.format
            .prefix(&self.collection, &self.entity_type, &self.name)
    }

    /// Set up the namespace of this field in `store`.
    ///
    /// This is meant to be called once when the application is installed, but it is safe to call
    /// again.
    pub fn initial(&self, store: &RevisionStore) -> crate::Result<()> {
        store.initial(&self.prefix()?)
    }

    /// Commit the current value of this field in `record` after the record has been saved.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: The record's identifier cannot be used in a key.
    /// - `Error::Unavailable`: The log could not be written.
    pub fn post_save<R: Record + ?Sized>(
        &self,
        store: &RevisionStore,
        record: &R,
    ) -> crate::Result<Revision> {
        let key = self.key(&record.id())?;
        store.commit(&key, &record.value(&self.name))
    }

    /// Return the prior revisions of this field in `record`, newest first.
    pub fn revisions<R: Record + ?Sized>(
        &self,
        store: &RevisionStore,
        record: &R,
    ) -> crate::Result<Vec<Revision>> {
        store.revisions(&self.key(&record.id())?)
    }

    /// Return a diff of this field in `record` from `rev1` to `rev2`.
    ///
    /// If `rev2` is the head, the diff is taken against the value currently held by `record`
    /// rather than the head stored in the log, so it includes changes which are not saved yet.
    pub fn diff<'a, R: Record + ?Sized>(
        &self,
        store: &'a RevisionStore,
        record: &R,
        rev1: &Revision,
        rev2: &Revision,
    ) -> crate::Result<Diff<'a>> {
        let key = self.key(&record.id())?;
        if rev2.is_head() && rev1 != rev2 {
            Ok(store.diff_live(&key, rev1, &record.value(&self.name)))
        } else {
            Ok(store.diff(&key, rev1, &key, rev2))
        }
    }
}
