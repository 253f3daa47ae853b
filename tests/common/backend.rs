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

use std::ops::Deref;

use rstest::*;
use tempfile::TempDir;

use rcs_store::backend::LogBackend;
#[cfg(feature = "backend-directory")]
use rcs_store::store::{DirectoryConfig, DirectoryStore};
use rcs_store::store::{MemoryConfig, MemoryStore, OpenStore};
#[cfg(feature = "backend-sqlite")]
use rcs_store::store::{SqliteConfig, SqliteStore};

/// A value which is tied to the lifetime of a temporary directory.
pub struct WithTempDir<T> {
    directory: TempDir,
    value: T,
}

impl<T> WithTempDir<T> {
    /// The temporary directory this value lives in.
    pub fn directory(&self) -> &TempDir {
        &self.directory
    }
}

impl<T> Deref for WithTempDir<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[fixture]
pub fn memory_backend() -> LogBackend<MemoryStore> {
    LogBackend::new(MemoryConfig::new().open().unwrap())
}

/// Return the config of a directory store inside `directory`.
#[cfg(feature = "backend-directory")]
pub fn directory_config(directory: &TempDir) -> DirectoryConfig {
    DirectoryConfig {
        path: directory.path().join("log"),
    }
}

#[cfg(feature = "backend-directory")]
#[fixture]
pub fn directory_backend() -> WithTempDir<LogBackend<DirectoryStore>> {
    let directory = tempfile::tempdir().unwrap();
    let store = directory_config(&directory).open().unwrap();
    WithTempDir {
        directory,
        value: LogBackend::new(store),
    }
}

/// Return the config of a SQLite store inside `directory`.
#[cfg(feature = "backend-sqlite")]
pub fn sqlite_config(directory: &TempDir) -> SqliteConfig {
    SqliteConfig {
        path: directory.path().join("log.db"),
    }
}

#[cfg(feature = "backend-sqlite")]
#[fixture]
pub fn sqlite_backend() -> WithTempDir<LogBackend<SqliteStore>> {
    let directory = tempfile::tempdir().unwrap();
    let store = sqlite_config(&directory).open().unwrap();
    WithTempDir {
        directory,
        value: LogBackend::new(store),
    }
}
