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

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The string which represents [`Revision::Head`].
///
/// [`Revision::Head`]: crate::Revision::Head
pub const HEAD: &str = "head";

/// A BLAKE3 hash which identifies content in a log.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute the hash of the given `data`.
    pub fn of(data: &[u8]) -> Self {
        ContentHash(*blake3::hash(data).as_bytes())
    }

    /// Return the bytes of this hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return this hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// Parse a hash from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        blake3::Hash::from_hex(hex)
            .ok()
            .map(|hash| ContentHash(*hash.as_bytes()))
    }
}

impl From<[u8; 32]> for ContentHash {
    fn from(bytes: [u8; 32]) -> Self {
        ContentHash(bytes)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A backend-native identifier for a point in the history of a log.
///
/// Centralized logs number their revisions sequentially starting at 1. Distributed logs identify
/// revisions by the hash of the commit. Identifiers from different backends are never comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevisionId {
    /// A sequential revision number.
    Number(u64),

    /// A content-derived commit hash.
    Hash(ContentHash),
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionId::Number(number) => write!(f, "{}", number),
            RevisionId::Hash(hash) => write!(f, "{}", hash),
        }
    }
}

impl FromStr for RevisionId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        if let Some(hash) = ContentHash::from_hex(s) {
            return Ok(RevisionId::Hash(hash));
        }

        if !s.is_empty() && s.bytes().all(|byte| byte.is_ascii_digit()) {
            return s
                .parse()
                .map(RevisionId::Number)
                .map_err(|_| crate::Error::InvalidRevision(s.to_string()));
        }

        Err(crate::Error::InvalidRevision(s.to_string()))
    }
}

/// A point in the history of a key.
///
/// `Revision::Head` always refers to the current value. Because the primary store holds the
/// authoritative current value, callers usually serve `Head` without consulting the log at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    /// The current value.
    Head,

    /// A specific revision in the log.
    Id(RevisionId),
}

impl Revision {
    /// Return whether this is the `head` sentinel.
    pub fn is_head(&self) -> bool {
        matches!(self, Revision::Head)
    }

    /// Return the backend-native ID of this revision, or `None` if it is `head`.
    pub fn id(&self) -> Option<RevisionId> {
        match self {
            Revision::Head => None,
            Revision::Id(id) => Some(*id),
        }
    }
}

impl Default for Revision {
    fn default() -> Self {
        Revision::Head
    }
}

impl From<RevisionId> for Revision {
    fn from(id: RevisionId) -> Self {
        Revision::Id(id)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Head => f.write_str(HEAD),
            Revision::Id(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for Revision {
    type Err = crate::Error;

    /// Parse `head`, a decimal revision number, or a 64-character hex commit hash.
    fn from_str(s: &str) -> crate::Result<Self> {
        if s == HEAD {
            Ok(Revision::Head)
        } else {
            s.parse().map(Revision::Id)
        }
    }
}
