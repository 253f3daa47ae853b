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

//! Low-level append-only logs.
//!
//! This module provides low-level storage for version history called log stores. A log store
//! provides only the most basic operations: storing blobs, appending commits under an exclusive
//! lock, and reading them back through a [`LogReader`]. Resolving revisions, following renames
//! and listing history are implemented at a higher level by [`LogBackend`], so log stores are
//! meant to be easy to implement.
//!
//! All log stores implement the [`LogStore`] trait.
//!
//! For each log store, there is a corresponding type which provides the necessary configuration to
//! open that log store. These config types implement [`OpenStore`]. Typically, you'll select one
//! of these by name using [`BackendConfig`] rather than using them directly.
//!
//! [`LogBackend`]: crate::backend::LogBackend
//! [`LogStore`]: crate::store::LogStore
//! [`LogReader`]: crate::store::LogReader
//! [`OpenStore`]: crate::store::OpenStore
//! [`BackendConfig`]: crate::backend::BackendConfig

#[cfg(feature = "backend-directory")]
pub use self::directory_store::{DirectoryConfig, DirectoryStore};
pub use self::log_store::{Change, Commit, LogReader, LogStore, LogTransaction};
pub use self::memory_store::{MemoryConfig, MemoryStore};
pub use self::open_store::OpenStore;
#[cfg(feature = "backend-sqlite")]
pub use self::sqlite_store::{SqliteConfig, SqliteStore};

mod directory_store;
mod log_store;
mod memory_store;
mod open_store;
mod sqlite_store;
