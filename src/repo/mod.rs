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

//! The caller-facing revision store.
//!
//! This module provides [`RevisionStore`], which wraps one [`Backend`] and is the contract the
//! rest of an application uses to version content. On top of it:
//! - [`VersionedField`] maps a field of an entity type to keys and ties it to the lifecycle of a
//! record: setting up its namespace, committing after a save, listing revisions and diffing.
//! - [`RevisionView`] projects records in the primary store to a requested revision.
//! - [`migrate_keyformat`] moves the keys of a field to a new [`KeyFormat`].
//!
//! # Heads
//! The head value of a field is the value cached in the primary store, which is authoritative.
//! It can include changes which have not been committed yet, so reads at the head and diffs
//! against the head use that cached value rather than the newest snapshot in the log.
//!
//! # Failures
//! Writes always report failures. Reads in a [`RevisionView`] never fail; when the log cannot be
//! read, the head value is kept and the failure is recorded in the [`Projection`].
//!
//! [`RevisionStore`]: crate::repo::RevisionStore
//! [`Backend`]: crate::backend::Backend
//! [`VersionedField`]: crate::repo::VersionedField
//! [`RevisionView`]: crate::repo::RevisionView
//! [`migrate_keyformat`]: crate::repo::migrate_keyformat
//! [`KeyFormat`]: crate::key::KeyFormat
//! [`Projection`]: crate::repo::Projection

pub use self::field::VersionedField;
pub use self::migrate::{migrate_keyformat, MigrationFailure, MigrationReport};
pub use self::projection::{Projection, ReadState, Record, Records, RevisionView, Source};
pub use self::revision_store::RevisionStore;

mod field;
mod migrate;
mod projection;
mod revision_store;
