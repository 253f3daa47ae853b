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

use crate::key::{Key, KeyFormat};

use super::field::VersionedField;
use super::revision_store::RevisionStore;

/// A key which could not be moved to its new format.
#[derive(Debug)]
pub struct MigrationFailure {
    /// The identifier of the entity whose key could not be moved.
    pub identifier: String,

    /// The reason the key could not be moved.
    pub reason: String,
}

/// The per-entity outcome of [`migrate_keyformat`].
///
/// [`migrate_keyformat`]: crate::repo::migrate_keyformat
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// The keys which were moved, as `(old, new)` pairs.
    pub moved: Vec<(Key, Key)>,

    /// The keys which were already in the new format.
    pub unchanged: Vec<Key>,

    /// The entities whose keys could not be moved.
    pub failed: Vec<MigrationFailure>,
}

impl MigrationReport {
    /// Return whether every key was migrated.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Move the keys of `field` for each entity in `identifiers` from the `old` key format to `new`.
///
/// Each key is moved with [`RevisionStore::move_key`], so each one becomes a new revision in the
/// history of its entity. A failure for one entity is recorded in the report and the remaining
/// entities are still migrated, so a partial failure leaves a mix of old and new keys. Running
/// this again moves the keys which are still in the old format and reports the others as failed.
///
/// This needs to be run once for each field whose key format changed.
///
/// [`RevisionStore::move_key`]: crate::repo::RevisionStore::move_key
pub fn migrate_keyformat<I, S>(
    store: &RevisionStore,
    field: &VersionedField,
    identifiers: I,
    old: &KeyFormat,
    new: &KeyFormat,
) -> MigrationReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = MigrationReport::default();

    for identifier in identifiers {
        let identifier = identifier.as_ref();
        let keys = field
            .key_in(old, identifier)
            .and_then(|from| Ok((from, field.key_in(new, identifier)?)));

        let (from, to) = match keys {
            Ok(keys) => keys,
            Err(error) => {
                report.failed.push(MigrationFailure {
                    identifier: identifier.to_string(),
                    reason: error.to_string(),
                });
                continue;
            }
        };

        if from == to {
            report.unchanged.push(to);
        } else if store.move_key(&from, &to) {
            report.moved.push((from, to));
        } else {
            report.failed.push(MigrationFailure {
                identifier: identifier.to_string(),
                reason: format!("could not move {} to {}", from, to),
            });
        }
    }

    log::info!(
        "Migrated the keys of '{}': {} moved, {} unchanged, {} failed",
        field.name(),
        report.moved.len(),
        report.unchanged.len(),
        report.failed.len()
    );

    report
}
