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

#![cfg(feature = "backend-directory")]

use std::fs::{self, create_dir_all, remove_file, rename, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use hex_literal::hex;
use uuid::Uuid;

use super::log_store::{Change, Commit, LogReader, LogStore, LogTransaction};
use super::open_store::OpenStore;
use crate::key::is_valid_namespace;
use crate::revision::{ContentHash, RevisionId};

/// A UUID which acts as the version ID of the directory store format.
const CURRENT_VERSION: Uuid = Uuid::from_bytes(hex!("5f0c2a1e 3b7d 11ee 9c4a 1b2e7d4f8a60"));

// The names of files in the metadata directory of the log.
const META_DIRECTORY: &str = ".rcs";
const STAGING_DIRECTORY: &str = "stage";
const OBJECTS_DIRECTORY: &str = "objects";
const NAMESPACES_DIRECTORY: &str = "namespaces";
const VERSION_FILE: &str = "version";
const HEAD_FILE: &str = "HEAD";
const LOCK_FILE: &str = "lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectKind {
    Blob,
    Commit,
}

impl ObjectKind {
    fn directory(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blobs",
            ObjectKind::Commit => "commits",
        }
    }
}

fn unavailable(error: io::Error) -> crate::Error {
    crate::Error::Unavailable(anyhow::Error::from(error))
}

/// Return whether `path` refers to the metadata directory or something inside it.
fn is_reserved(path: &str) -> bool {
    path.split('/').next() == Some(META_DIRECTORY)
}

/// Read the file at `path`, returning `None` if it does not exist.
fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

/// The configuration for opening a [`DirectoryStore`].
///
/// [`DirectoryStore`]: crate::store::DirectoryStore
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(docsrs, doc(cfg(feature = "backend-directory")))]
pub struct DirectoryConfig {
    /// The path of the directory store.
    pub path: PathBuf,
}

impl OpenStore for DirectoryConfig {
    type Store = DirectoryStore;

    fn open(&self) -> crate::Result<Self::Store> {
        let store = DirectoryStore {
            path: self.path.clone(),
        };

        // A store which has not been set up yet is created lazily by `initial`.
        if let Some(version) = read_optional(&store.meta_path().join(VERSION_FILE))? {
            if version != CURRENT_VERSION.as_hyphenated().to_string().as_bytes() {
                return Err(crate::Error::UnsupportedFormat);
            }
        }

        Ok(store)
    }
}

/// A `LogStore` which stores a distributed-style log in a directory in the local file system.
///
/// Commits and blobs are content-addressed objects identified by their BLAKE3 hash, and
/// revisions are identified by the hash of their commit. The current content of every key is
/// also checked out as a regular file at its key path under the root directory.
///
/// Every object and the head pointer are written to a staging file first and then atomically
/// renamed into place. Appending takes an exclusive OS file lock on the log root, so the log can
/// be shared between processes.
///
/// You can use [`DirectoryConfig`] to open a log store of this type.
///
/// [`DirectoryConfig`]: crate::store::DirectoryConfig
#[derive(Debug)]
#[cfg_attr(docsrs, doc(cfg(feature = "backend-directory")))]
pub struct DirectoryStore {
    /// The path of the store's root directory.
    path: PathBuf,
}

impl DirectoryStore {
    fn meta_path(&self) -> PathBuf {
        self.path.join(META_DIRECTORY)
    }

    fn object_path(&self, kind: ObjectKind, hash: &ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        self.meta_path()
            .join(OBJECTS_DIRECTORY)
            .join(kind.directory())
            .join(&hex[..2])
            .join(&hex)
    }

    /// Return a new staging path.
    fn staging_path(&self) -> PathBuf {
        let uuid_str = Uuid::new_v4().as_hyphenated().to_string();
        self.meta_path().join(STAGING_DIRECTORY).join(uuid_str)
    }

    fn is_initialized(&self) -> bool {
        self.meta_path().join(VERSION_FILE).is_file()
    }

    /// Write to a staging file and then atomically move it to `path`.
    fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let staging_path = self.staging_path();
        let result = File::create(&staging_path)
            .and_then(|mut staging_file| {
                staging_file.write_all(data)?;
                staging_file.sync_all()
            })
            .and_then(|()| rename(&staging_path, path));

        if result.is_err() {
            if let Err(error) = remove_file(&staging_path) {
                if error.kind() != io::ErrorKind::NotFound {
                    log::warn!(
                        "Could not remove the staging file {}: {}",
                        staging_path.display(),
                        error
                    );
                }
            }
        }

        result
    }

    /// Return the path of the marker directory which records that `namespace` was set up.
    ///
    /// Nested namespaces are nested marker directories, so setting up a namespace also marks
    /// every one of its ancestors.
    fn namespace_path(&self, namespace: &str) -> PathBuf {
        let mut path = self.meta_path().join(NAMESPACES_DIRECTORY);
        if !namespace.is_empty() {
            path.push(namespace);
        }
        path
    }

    /// Read the object with the given `hash`, verifying its contents.
    fn read_object(&self, kind: ObjectKind, hash: &ContentHash) -> crate::Result<Option<Vec<u8>>> {
        match read_optional(&self.object_path(kind, hash))? {
            Some(data) if ContentHash::of(&data) == *hash => Ok(Some(data)),
            Some(_) => Err(crate::Error::Corrupt),
            None => Ok(None),
        }
    }

    fn write_object(&self, kind: ObjectKind, data: &[u8]) -> crate::Result<ContentHash> {
        let hash = ContentHash::of(data);
        let path = self.object_path(kind, &hash);
        if !path.exists() {
            self.write_atomic(&path, data)?;
        }
        Ok(hash)
    }

    fn read_head(&self) -> crate::Result<Option<RevisionId>> {
        match read_optional(&self.meta_path().join(HEAD_FILE))? {
            Some(data) => {
                let hex = std::str::from_utf8(&data).map_err(|_| crate::Error::Corrupt)?;
                let hash = ContentHash::from_hex(hex.trim()).ok_or(crate::Error::Corrupt)?;
                Ok(Some(RevisionId::Hash(hash)))
            }
            None => Ok(None),
        }
    }

    /// Update the working tree to reflect `change`.
    fn checkout(&self, change: &Change) -> crate::Result<()> {
        match change {
            Change::Write { key, blob } => {
                let data = self
                    .read_object(ObjectKind::Blob, blob)?
                    .ok_or(crate::Error::Corrupt)?;
                self.write_atomic(&self.path.join(key.as_str()), &data)?;
            }
            Change::Move { from, to } => {
                let to_path = self.path.join(to.as_str());
                if let Some(parent) = to_path.parent() {
                    create_dir_all(parent)?;
                }
                match rename(self.path.join(from.as_str()), &to_path) {
                    Err(error) if error.kind() != io::ErrorKind::NotFound => {
                        return Err(error.into())
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

impl LogStore for DirectoryStore {
    fn initial(&self, prefix: &str) -> crate::Result<()> {
        if !is_valid_namespace(prefix) || is_reserved(prefix) {
            return Err(crate::Error::InvalidKey(prefix.to_string()));
        }

        create_dir_all(&self.path).map_err(unavailable)?;
        create_dir_all(self.meta_path().join(STAGING_DIRECTORY)).map_err(unavailable)?;
        for kind in [ObjectKind::Blob, ObjectKind::Commit] {
            create_dir_all(self.meta_path().join(OBJECTS_DIRECTORY).join(kind.directory()))
                .map_err(unavailable)?;
        }

        let version_path = self.meta_path().join(VERSION_FILE);
        let version_id = CURRENT_VERSION.as_hyphenated().to_string();
        match read_optional(&version_path)? {
            Some(version) if version != version_id.as_bytes() => {
                return Err(crate::Error::UnsupportedFormat)
            }
            Some(_) => {}
            None => {
                self.write_atomic(&version_path, version_id.as_bytes())
                    .map_err(unavailable)?;
                log::info!("Created a new log in {}", self.path.display());
            }
        }

        create_dir_all(self.namespace_path(prefix)).map_err(unavailable)?;

        // A key may already be checked out where the namespace directory would go.
        if let Err(error) = create_dir_all(self.path.join(prefix)) {
            log::warn!(
                "Could not create the directory for namespace '{}' in the working tree: {}",
                prefix,
                error
            );
        }

        Ok(())
    }

    fn contains_namespace(&self, namespace: &str) -> crate::Result<bool> {
        if is_reserved(namespace) {
            return Err(crate::Error::InvalidKey(namespace.to_string()));
        }
        Ok(self.is_initialized() && self.namespace_path(namespace).is_dir())
    }

    fn reader(&self) -> crate::Result<Box<dyn LogReader + '_>> {
        Ok(Box::new(DirectoryReader { store: self }))
    }

    fn begin(&self) -> crate::Result<Box<dyn LogTransaction + '_>> {
        if !self.is_initialized() {
            return Err(crate::Error::NamespaceMissing(String::new()));
        }

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(self.meta_path().join(LOCK_FILE))
            .map_err(unavailable)?;
        lock_file.lock_exclusive().map_err(unavailable)?;

        Ok(Box::new(DirectoryTransaction {
            store: self,
            _lock: lock_file,
        }))
    }
}

struct DirectoryReader<'a> {
    store: &'a DirectoryStore,
}

impl<'a> LogReader for DirectoryReader<'a> {
    fn head(&self) -> crate::Result<Option<RevisionId>> {
        self.store.read_head()
    }

    fn read_commit(&self, id: &RevisionId) -> crate::Result<Option<Commit>> {
        let hash = match id {
            RevisionId::Hash(hash) => hash,
            RevisionId::Number(_) => return Ok(None),
        };
        match self.store.read_object(ObjectKind::Commit, hash)? {
            Some(data) => Ok(Some(Commit::decode(&data)?)),
            None => Ok(None),
        }
    }

    fn read_blob(&self, id: &ContentHash) -> crate::Result<Option<Vec<u8>>> {
        self.store.read_object(ObjectKind::Blob, id)
    }
}

struct DirectoryTransaction<'a> {
    store: &'a DirectoryStore,

    /// The file lock is released when this file is closed.
    _lock: File,
}

impl<'a> LogTransaction for DirectoryTransaction<'a> {
    fn head(&self) -> crate::Result<Option<RevisionId>> {
        self.store.read_head()
    }

    fn write_blob(&mut self, data: &[u8]) -> crate::Result<ContentHash> {
        self.store.write_object(ObjectKind::Blob, data)
    }

    fn append(self: Box<Self>, commit: Commit) -> crate::Result<RevisionId> {
        let reserved = match &commit.change {
            Change::Write { key, .. } => is_reserved(key.as_str()),
            Change::Move { from, to } => is_reserved(from.as_str()) || is_reserved(to.as_str()),
        };
        if reserved {
            return Err(crate::Error::InvalidKey(META_DIRECTORY.to_string()));
        }

        let hash = self
            .store
            .write_object(ObjectKind::Commit, &commit.encode()?)?;

        // Moving the head pointer is what makes the commit visible to readers.
        self.store
            .write_atomic(&self.store.meta_path().join(HEAD_FILE), hash.to_hex().as_bytes())?;

        if let Err(error) = self.store.checkout(&commit.change) {
            log::warn!(
                "Could not update the working tree in {}: {}",
                self.store.path.display(),
                error
            );
        }

        Ok(RevisionId::Hash(hash))
    }
}
