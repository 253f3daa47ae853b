/*
 * Copyright 2019-2020 Garrett Powell
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

//! `rcs-store` is a library for versioning the content of application fields in an append-only
//! log.
//!
//! An application saves successive values under a key and can later fetch any prior value, list
//! the revisions which touched a key, diff two revisions, and rename a key while keeping its
//! history. The current value of a field lives in the application's primary store, and its history
//! lives in a pluggable backend.
//!
//! This crate is organized in layers:
//! - A `LogStore` is a small trait for append-only logs of commits and blobs. The following log
//! stores are provided out of the box:
//!     - `MemoryStore` stores a log in memory with numbered revisions.
//!     - `DirectoryStore` stores a log in a directory in the local file system with hashed
//!     revisions.
//!     - `SqliteStore` stores a log in a SQLite database with numbered revisions.
//! - A `Backend` implements revision resolution, history listing, renames and diffs. Every log
//! store is used through the same `LogBackend`, so they all behave the same. Backends are selected
//! by name with `BackendConfig`.
//! - `RevisionStore` is the caller-facing contract. `VersionedField`, `RevisionView` and
//! `migrate_keyformat` build on it to tie versioning to records in the primary store.
//!
//! # Examples
//! ```
//! use rcs_store::backend::{BackendConfig, Settings};
//! use rcs_store::repo::{Record, RevisionStore, RevisionView, VersionedField};
//!
//! struct Page {
//!     id: u32,
//!     body: String,
//! }
//!
//! impl Record for Page {
//!     fn id(&self) -> String {
//!         self.id.to_string()
//!     }
//!
//!     fn value(&self, _field: &str) -> Vec<u8> {
//!         self.body.clone().into_bytes()
//!     }
//!
//!     fn set_value(&mut self, _field: &str, value: Vec<u8>) {
//!         self.body = String::from_utf8_lossy(&value).into_owned();
//!     }
//! }
//!
//! fn main() -> rcs_store::Result<()> {
//!     // Select the in-memory backend.
//!     let settings = Settings {
//!         backend: Some(String::from("memory")),
//!         path: None,
//!     };
//!     let store = RevisionStore::open(&BackendConfig::from_settings(&settings)?)?;
//!
//!     let field = VersionedField::new("wiki", "page", "body");
//!     field.initial(&store)?;
//!
//!     let mut page = Page { id: 1, body: String::from("First draft") };
//!     let draft = field.post_save(&store, &page)?;
//!     page.body = String::from("Final text");
//!     field.post_save(&store, &page)?;
//!
//!     // Read the page as it was at the first revision.
//!     let fields = [field];
//!     let view = RevisionView::new(&store, &fields, Some(&draft));
//!     let projection = view.project(&mut page);
//!
//!     assert_eq!(page.body, "First draft");
//!     assert!(!projection.has_fallback());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//! Some functionality is gated behind cargo features:
//!
//! Type | Cargo Feature
//! --- | ---
//! `DirectoryStore` | `backend-directory`
//! `SqliteStore` | `backend-sqlite`
//!
//! Both features are enabled by default.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use error::{Error, Result};
pub use key::{Key, KeyFormat, KeyParts};
pub use revision::{ContentHash, Revision, RevisionId};

pub mod backend;
pub mod diff;
mod error;
pub mod key;
pub mod repo;
pub mod revision;
pub mod store;
