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

#![cfg(feature = "backend-sqlite")]

use std::fs::create_dir_all;
use std::path::PathBuf;
use std::time::Duration;

use hex_literal::hex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::log_store::{Commit, LogReader, LogStore, LogTransaction};
use super::open_store::OpenStore;
use crate::key::is_valid_namespace;
use crate::revision::{ContentHash, RevisionId};

/// A UUID which acts as the version ID of the store format.
const CURRENT_VERSION: Uuid = Uuid::from_bytes(hex!("a4e1d6b2 3b7e 11ee 8f21 5bd0c93a7e14"));

/// How long to wait for another connection to release its lock on the database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

fn store_error(error: rusqlite::Error) -> crate::Error {
    crate::Error::Store(anyhow::Error::from(error))
}

/// The configuration for opening a [`SqliteStore`].
///
/// [`SqliteStore`]: crate::store::SqliteStore
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(docsrs, doc(cfg(feature = "backend-sqlite")))]
pub struct SqliteConfig {
    /// The path of the SQLite database.
    pub path: PathBuf,
}

impl OpenStore for SqliteConfig {
    type Store = SqliteStore;

    fn open(&self) -> crate::Result<Self::Store> {
        let store = SqliteStore {
            path: self.path.clone(),
        };

        // A database which does not exist yet is created lazily by `initial`.
        if let Some(connection) = store.connect()? {
            store.check_version(&connection)?;
        }

        Ok(store)
    }
}

/// A `LogStore` which stores a centralized log in a SQLite database.
///
/// Revisions are numbered sequentially starting at 1. Each operation uses its own connection, so
/// reads can proceed while another thread or process is appending. Appends run in an immediate
/// transaction, which SQLite serializes across connections.
///
/// You can use [`SqliteConfig`] to open a log store of this type.
///
/// [`SqliteConfig`]: crate::store::SqliteConfig
#[derive(Debug)]
#[cfg_attr(docsrs, doc(cfg(feature = "backend-sqlite")))]
pub struct SqliteStore {
    /// The path of the SQLite database.
    path: PathBuf,
}

impl SqliteStore {
    /// Open a connection to an existing database, or return `None` if it does not exist yet.
    fn connect(&self) -> crate::Result<Option<Connection>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let connection = Connection::open(&self.path).map_err(store_error)?;
        connection.busy_timeout(BUSY_TIMEOUT).map_err(store_error)?;
        Ok(Some(connection))
    }

    fn connect_existing(&self) -> crate::Result<Connection> {
        self.connect()?
            .ok_or_else(|| crate::Error::NamespaceMissing(String::new()))
    }

    fn check_version(&self, connection: &Connection) -> crate::Result<()> {
        let version_bytes: Option<Vec<u8>> = connection
            .query_row(
                r#"
                    SELECT value FROM Metadata
                    WHERE key = 'version';
                "#,
                params![],
                |row| row.get(0),
            )
            .optional()
            .map_err(|_| crate::Error::UnsupportedFormat)?;

        match version_bytes {
            Some(bytes) => {
                let version = Uuid::from_slice(bytes.as_slice())
                    .map_err(|_| crate::Error::UnsupportedFormat)?;
                if version != CURRENT_VERSION {
                    return Err(crate::Error::UnsupportedFormat);
                }
                Ok(())
            }
            None => Err(crate::Error::UnsupportedFormat),
        }
    }
}

fn read_head(connection: &Connection) -> crate::Result<Option<RevisionId>> {
    let number: Option<i64> = connection
        .query_row(r#"SELECT MAX(number) FROM Revisions;"#, params![], |row| {
            row.get(0)
        })
        .map_err(store_error)?;
    Ok(number.map(|number| RevisionId::Number(number as u64)))
}

impl LogStore for SqliteStore {
    fn initial(&self, prefix: &str) -> crate::Result<()> {
        if !is_valid_namespace(prefix) {
            return Err(crate::Error::InvalidKey(prefix.to_string()));
        }

        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)
                .map_err(|error| crate::Error::Unavailable(anyhow::Error::from(error)))?;
        }

        let mut connection = Connection::open(&self.path)
            .map_err(|error| crate::Error::Unavailable(anyhow::Error::from(error)))?;
        connection.busy_timeout(BUSY_TIMEOUT).map_err(store_error)?;

        connection
            .execute_batch(
                r#"
                    CREATE TABLE IF NOT EXISTS Metadata (
                        key TEXT PRIMARY KEY,
                        value BLOB NOT NULL
                    );

                    CREATE TABLE IF NOT EXISTS Namespaces (
                        path TEXT PRIMARY KEY
                    );

                    CREATE TABLE IF NOT EXISTS Blobs (
                        hash BLOB PRIMARY KEY,
                        data BLOB NOT NULL
                    );

                    CREATE TABLE IF NOT EXISTS Revisions (
                        number INTEGER PRIMARY KEY AUTOINCREMENT,
                        record BLOB NOT NULL
                    );
                "#,
            )
            .map_err(store_error)?;

        let transaction = connection.transaction().map_err(store_error)?;

        transaction
            .execute(
                r#"
                    INSERT OR IGNORE INTO Metadata (key, value)
                    VALUES ('version', ?1);
                "#,
                params![&CURRENT_VERSION.as_bytes()[..]],
            )
            .map_err(store_error)?;

        let mut namespace = prefix;
        loop {
            transaction
                .execute(
                    r#"
                        INSERT OR IGNORE INTO Namespaces (path)
                        VALUES (?1);
                    "#,
                    params![namespace],
                )
                .map_err(store_error)?;
            match namespace.rfind('/') {
                Some(index) => namespace = &namespace[..index],
                None if namespace.is_empty() => break,
                None => namespace = "",
            }
        }

        transaction.commit().map_err(store_error)?;

        self.check_version(&connection)
    }

    fn contains_namespace(&self, namespace: &str) -> crate::Result<bool> {
        let connection = match self.connect()? {
            Some(connection) => connection,
            None => return Ok(false),
        };
        let found: Result<Option<String>, rusqlite::Error> = connection
            .query_row(
                r#"
                    SELECT path FROM Namespaces
                    WHERE path = ?1;
                "#,
                params![namespace],
                |row| row.get(0),
            )
            .optional();
        match found {
            Ok(found) => Ok(found.is_some()),
            // Another connection has created the database but not its schema yet.
            Err(rusqlite::Error::SqliteFailure(_, Some(message)))
                if message.starts_with("no such table") =>
            {
                Ok(false)
            }
            Err(error) => Err(store_error(error)),
        }
    }

    fn reader(&self) -> crate::Result<Box<dyn LogReader + '_>> {
        Ok(Box::new(SqliteReader {
            connection: self.connect()?,
        }))
    }

    fn begin(&self) -> crate::Result<Box<dyn LogTransaction + '_>> {
        let connection = self.connect_existing()?;
        connection
            .execute_batch("BEGIN IMMEDIATE;")
            .map_err(store_error)?;
        Ok(Box::new(SqliteTransaction {
            connection,
            finished: false,
        }))
    }
}

/// A reader holding one connection for as long as it lives.
///
/// A reader of a database which does not exist yet sees an empty log.
struct SqliteReader {
    connection: Option<Connection>,
}

impl LogReader for SqliteReader {
    fn head(&self) -> crate::Result<Option<RevisionId>> {
        match &self.connection {
            Some(connection) => read_head(connection),
            None => Ok(None),
        }
    }

    fn read_commit(&self, id: &RevisionId) -> crate::Result<Option<Commit>> {
        let number = match id {
            RevisionId::Number(number) => match i64::try_from(*number) {
                Ok(number) => number,
                Err(_) => return Ok(None),
            },
            RevisionId::Hash(_) => return Ok(None),
        };
        let connection = match &self.connection {
            Some(connection) => connection,
            None => return Ok(None),
        };
        let record: Option<Vec<u8>> = connection
            .prepare_cached(
                r#"
                    SELECT record FROM Revisions
                    WHERE number = ?1;
                "#,
            )
            .and_then(|mut statement| {
                statement
                    .query_row(params![number], |row| row.get::<_, Vec<u8>>(0))
                    .optional()
            })
            .map_err(store_error)?;
        record.map(|data| Commit::decode(&data)).transpose()
    }

    fn read_blob(&self, id: &ContentHash) -> crate::Result<Option<Vec<u8>>> {
        let connection = match &self.connection {
            Some(connection) => connection,
            None => return Ok(None),
        };
        connection
            .prepare_cached(
                r#"
                    SELECT data FROM Blobs
                    WHERE hash = ?1;
                "#,
            )
            .and_then(|mut statement| {
                statement
                    .query_row(params![&id.as_bytes()[..]], |row| row.get::<_, Vec<u8>>(0))
                    .optional()
            })
            .map_err(store_error)
    }
}

/// An immediate transaction on its own connection.
///
/// The transaction is rolled back if it is dropped before it is committed.
struct SqliteTransaction {
    connection: Connection,
    finished: bool,
}

impl LogTransaction for SqliteTransaction {
    fn head(&self) -> crate::Result<Option<RevisionId>> {
        read_head(&self.connection)
    }

    fn write_blob(&mut self, data: &[u8]) -> crate::Result<ContentHash> {
        let hash = ContentHash::of(data);
        self.connection
            .execute(
                r#"
                    INSERT OR IGNORE INTO Blobs (hash, data)
                    VALUES (?1, ?2);
                "#,
                params![&hash.as_bytes()[..], data],
            )
            .map_err(store_error)?;
        Ok(hash)
    }

    fn append(mut self: Box<Self>, commit: Commit) -> crate::Result<RevisionId> {
        self.connection
            .execute(
                r#"
                    INSERT INTO Revisions (record)
                    VALUES (?1);
                "#,
                params![commit.encode()?],
            )
            .map_err(store_error)?;
        let number = self.connection.last_insert_rowid();
        self.connection
            .execute_batch("COMMIT;")
            .map_err(store_error)?;
        self.finished = true;
        Ok(RevisionId::Number(number as u64))
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(error) = self.connection.execute_batch("ROLLBACK;") {
                log::warn!("Could not roll back an abandoned transaction: {}", error);
            }
        }
    }
}
