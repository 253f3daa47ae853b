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

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::backend::Backend;
use super::dummy::DummyBackend;
use super::log_backend::LogBackend;
#[cfg(feature = "backend-directory")]
use crate::store::DirectoryConfig;
#[cfg(feature = "backend-sqlite")]
use crate::store::SqliteConfig;
use crate::store::{MemoryConfig, OpenStore};

/// The environment variable which names the backend to use.
pub const BACKEND_VAR: &str = "RCS_BACKEND";

/// The environment variable which holds the storage path of the backend.
pub const PATH_VAR: &str = "RCS_PATH";

/// The name of the [`DummyBackend`].
///
/// [`DummyBackend`]: crate::backend::DummyBackend
pub const DUMMY: &str = "dummy";

/// The name of the in-memory backend.
pub const MEMORY: &str = "memory";

/// The name of the directory backend.
#[cfg(feature = "backend-directory")]
pub const DIRECTORY: &str = "directory";

/// The name of the SQLite backend.
#[cfg(feature = "backend-sqlite")]
pub const SQLITE: &str = "sqlite";

/// Return the names of every backend compiled into this library.
pub fn available_backends() -> Vec<&'static str> {
    let mut names = vec![DUMMY, MEMORY];
    #[cfg(feature = "backend-directory")]
    names.push(DIRECTORY);
    #[cfg(feature = "backend-sqlite")]
    names.push(SQLITE);
    names
}

/// The settings which select and locate a backend.
///
/// These are read once when the application starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The name of the backend to use.
    ///
    /// If this is `None`, the [`DummyBackend`] is used.
    ///
    /// [`DummyBackend`]: crate::backend::DummyBackend
    pub backend: Option<String>,

    /// The storage path of the backend, for backends which need one.
    pub path: Option<PathBuf>,
}

impl Settings {
    /// Read the settings from the `RCS_BACKEND` and `RCS_PATH` environment variables.
    ///
    /// Variables which are unset or empty are treated as missing.
    pub fn from_env() -> Self {
        let backend = env::var(BACKEND_VAR).ok().filter(|name| !name.is_empty());
        let path = env::var_os(PATH_VAR)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        Settings { backend, path }
    }
}

/// The configuration of a backend, selected by name.
///
/// This is the closed set of backends this library provides.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// A backend which fails every operation with `Error::NotConfigured`.
    Dummy,

    /// An in-memory backend with sequentially numbered revisions.
    Memory(MemoryConfig),

    /// A backend which stores its log in a local directory with hashed revisions.
    #[cfg(feature = "backend-directory")]
    #[cfg_attr(docsrs, doc(cfg(feature = "backend-directory")))]
    Directory(DirectoryConfig),

    /// A backend which stores its log in a SQLite database with numbered revisions.
    #[cfg(feature = "backend-sqlite")]
    #[cfg_attr(docsrs, doc(cfg(feature = "backend-sqlite")))]
    Sqlite(SqliteConfig),
}

impl BackendConfig {
    /// Resolve the backend named in `settings`.
    ///
    /// # Errors
    /// - `Error::UnknownBackend`: The configured name is not an available backend.
    /// - `Error::Config`: The backend requires a path and none was configured.
    pub fn from_settings(settings: &Settings) -> crate::Result<Self> {
        let name = match &settings.backend {
            Some(name) => name.trim(),
            None => return Ok(BackendConfig::Dummy),
        };

        match name {
            DUMMY => Ok(BackendConfig::Dummy),
            MEMORY => Ok(BackendConfig::Memory(MemoryConfig::new())),
            #[cfg(feature = "backend-directory")]
            DIRECTORY => Ok(BackendConfig::Directory(DirectoryConfig {
                path: required_path(settings, name)?,
            })),
            #[cfg(feature = "backend-sqlite")]
            SQLITE => Ok(BackendConfig::Sqlite(SqliteConfig {
                path: required_path(settings, name)?,
            })),
            _ => Err(crate::Error::UnknownBackend {
                name: name.to_string(),
                available: available_backends(),
            }),
        }
    }

    /// Return the name of this backend.
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Dummy => DUMMY,
            BackendConfig::Memory(_) => MEMORY,
            #[cfg(feature = "backend-directory")]
            BackendConfig::Directory(_) => DIRECTORY,
            #[cfg(feature = "backend-sqlite")]
            BackendConfig::Sqlite(_) => SQLITE,
        }
    }

    /// Open the configured backend.
    ///
    /// # Errors
    /// - `Error::UnsupportedFormat`: The existing log has an unsupported format.
    /// - `Error::Store`: An error occurred opening the log.
    /// - `Error::Io`: An I/O error occurred.
    pub fn open(&self) -> crate::Result<Box<dyn Backend>> {
        let backend: Box<dyn Backend> = match self {
            BackendConfig::Dummy => Box::new(DummyBackend),
            BackendConfig::Memory(config) => Box::new(LogBackend::new(config.open()?)),
            #[cfg(feature = "backend-directory")]
            BackendConfig::Directory(config) => Box::new(LogBackend::new(config.open()?)),
            #[cfg(feature = "backend-sqlite")]
            BackendConfig::Sqlite(config) => Box::new(LogBackend::new(config.open()?)),
        };
        log::info!("Opened the '{}' revision control backend", self.name());
        Ok(backend)
    }
}

#[cfg(any(feature = "backend-directory", feature = "backend-sqlite"))]
fn required_path(settings: &Settings, name: &str) -> crate::Result<PathBuf> {
    settings.path.clone().ok_or_else(|| {
        crate::Error::Config(format!("the '{}' backend requires a path", name))
    })
}
