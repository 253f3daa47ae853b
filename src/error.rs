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

use std::io;
use std::result;

use thiserror::Error as DeriveError;

/// The error type for operations with a revision store.
#[derive(Debug, DeriveError)]
pub enum Error {
    /// The configured backend name does not match any available backend.
    #[error(
        "'{name}' isn't an available revision control backend. Available options are: {}",
        .available.join(", ")
    )]
    UnknownBackend {
        /// The backend name which was configured.
        name: String,

        /// The names of all the backends which are available.
        available: Vec<&'static str>,
    },

    /// No revision control backend has been configured.
    #[error("No revision control backend has been configured.")]
    NotConfigured,

    /// The backend configuration is incomplete or invalid.
    #[error("The backend configuration is invalid: {0}")]
    Config(String),

    /// The storage root of the backend could not be reached or created.
    #[error("The revision control backend is unavailable: {0}")]
    Unavailable(anyhow::Error),

    /// A key was not found.
    #[error("The key '{0}' was not found.")]
    NotFound(String),

    /// A key already exists.
    #[error("The key '{0}' already exists.")]
    AlreadyExists(String),

    /// The requested revision does not exist.
    #[error("The requested revision does not exist.")]
    RevisionNotFound,

    /// The provided key is not a valid key.
    #[error("'{0}' is not a valid key.")]
    InvalidKey(String),

    /// The provided key format is not a valid key format.
    #[error("'{0}' is not a valid key format.")]
    InvalidKeyFormat(String),

    /// The provided string is not a valid revision.
    #[error("'{0}' is not a valid revision.")]
    InvalidRevision(String),

    /// The namespace which would contain a key has not been initialized.
    #[error("The namespace '{0}' has not been initialized.")]
    NamespaceMissing(String),

    /// This log format is not supported by this version of the library.
    #[error("This log format is not supported by this version of the library.")]
    UnsupportedFormat,

    /// The log is corrupt.
    #[error("The log is corrupt.")]
    Corrupt,

    /// A value could not be serialized.
    #[error("A value could not be serialized.")]
    Serialize,

    /// A value could not be deserialized.
    #[error("A value could not be deserialized.")]
    Deserialize,

    /// An error occurred in the underlying log store.
    #[error("{0}")]
    Store(anyhow::Error),

    /// An I/O error occurred.
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Return whether this error is caused by the backend configuration.
    ///
    /// Configuration errors are fatal and are not worth retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownBackend { .. } | Error::NotConfigured | Error::Config(_)
        )
    }

    /// Convert failures to reach the log into `Error::Unavailable`.
    ///
    /// This is used on the write path, where a failure must never look like a success.
    pub(crate) fn into_unavailable(self) -> Self {
        match self {
            Error::Io(error) => Error::Unavailable(anyhow::Error::from(error)),
            Error::Store(error) => Error::Unavailable(error),
            Error::NamespaceMissing(namespace) => Error::Unavailable(anyhow::anyhow!(
                "The namespace '{}' could not be initialized.",
                namespace
            )),
            error => error,
        }
    }
}

/// The result type for operations with a revision store.
pub type Result<T> = result::Result<T, Error>;
