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

//! Mapping logical entities to keys in the log.
//!
//! A [`Key`] is a relative path which identifies a versioned unit of content in a log. Keys are
//! usually not written by hand, but resolved from a [`KeyFormat`] and the [`KeyParts`] which
//! identify a field of an entity.
//!
//! [`Key`]: crate::key::Key
//! [`KeyFormat`]: crate::key::KeyFormat
//! [`KeyParts`]: crate::key::KeyParts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The key format used when none is specified.
pub const DEFAULT_KEY_FORMAT: &str = "{collection}/{entity_type}/{field}/{identifier}.txt";

/// A path which uniquely identifies a versioned unit of content in a log.
///
/// A key is a `/`-separated relative path. None of its components may be empty, `.` or `..`, and
/// it may not contain backslashes or NUL bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

impl Key {
    /// Construct a new key from the given `path`.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: The given `path` is not a valid key.
    pub fn new(path: impl Into<String>) -> crate::Result<Self> {
        let path = path.into();
        if is_valid_path(&path) {
            Ok(Key(path))
        } else {
            Err(crate::Error::InvalidKey(path))
        }
    }

    /// Return this key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the namespace which contains this key.
    ///
    /// This is everything before the last `/`, or the empty string for a top-level key.
    pub fn namespace(&self) -> &str {
        match self.0.rfind('/') {
            Some(index) => &self.0[..index],
            None => "",
        }
    }

    /// Return an iterator over the components of this key.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Key {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Key::new(s)
    }
}

impl TryFrom<String> for Key {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Key::new(value)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

/// Return whether `path` is a valid relative path for a key or namespace.
pub(crate) fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .split('/')
            .all(|component| !matches!(component, "" | "." | ".."))
        && !path.contains(|c: char| c == '\\' || c == '\0')
}

/// Return whether `namespace` is a valid namespace.
///
/// The empty namespace is the root of the log.
pub(crate) fn is_valid_namespace(namespace: &str) -> bool {
    namespace.is_empty() || is_valid_path(namespace)
}

/// The values which identify one field of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyParts<'a> {
    /// The collection which contains the entity type, like an application label.
    pub collection: &'a str,

    /// The type of the entity, like a model name.
    pub entity_type: &'a str,

    /// The name of the versioned field.
    pub field: &'a str,

    /// The identifier of the entity, like a primary key.
    pub identifier: &'a str,
}

impl<'a> KeyParts<'a> {
    fn get(&self, slot: Slot) -> &'a str {
        match slot {
            Slot::Collection => self.collection,
            Slot::EntityType => self.entity_type,
            Slot::Field => self.field,
            Slot::Identifier => self.identifier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Collection,
    EntityType,
    Field,
    Identifier,
}

impl Slot {
    const ALL: [Slot; 4] = [
        Slot::Collection,
        Slot::EntityType,
        Slot::Field,
        Slot::Identifier,
    ];

    fn name(self) -> &'static str {
        match self {
            Slot::Collection => "collection",
            Slot::EntityType => "entity_type",
            Slot::Field => "field",
            Slot::Identifier => "identifier",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Slot::ALL.iter().copied().find(|slot| slot.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

/// A template for resolving [`KeyParts`] into a [`Key`].
///
/// A key format is a string containing the placeholders `{collection}`, `{entity_type}`, `{field}`
/// and `{identifier}`, each of which must appear at least once. Literal braces can be written as
/// `{{` and `}}`.
///
/// Distinct parts always resolve to distinct keys. Placeholders must be separated by some text,
/// and a part may not contain any character of the text which follows its placeholder when
/// another placeholder comes after it.
///
/// ```
/// use rcs_store::key::{KeyFormat, KeyParts};
///
/// let format = KeyFormat::default();
/// let parts = KeyParts {
///     collection: "wiki",
///     entity_type: "Page",
///     field: "content",
///     identifier: "42",
/// };
/// assert_eq!(format.resolve(&parts).unwrap().as_str(), "wiki/Page/content/42.txt");
/// ```
///
/// [`KeyParts`]: crate::key::KeyParts
/// [`Key`]: crate::key::Key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyFormat {
    template: String,
    segments: Vec<Segment>,
}

impl KeyFormat {
    /// Parse a key format from the given `template`.
    ///
    /// # Errors
    /// - `Error::InvalidKeyFormat`: The template has unbalanced braces, an unknown placeholder, two
    /// placeholders with nothing between them, or is missing one of the placeholders.
    pub fn new(template: impl Into<String>) -> crate::Result<Self> {
        let template = template.into();
        let invalid = || crate::Error::InvalidKeyFormat(template.clone());

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => return Err(invalid()),
                        }
                    }
                    let slot = Slot::from_name(&name).ok_or_else(invalid)?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot));
                }
                '}' => return Err(invalid()),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let has_all_slots = Slot::ALL
            .iter()
            .all(|slot| segments.contains(&Segment::Slot(*slot)));
        if !has_all_slots {
            return Err(invalid());
        }

        // Without a literal between two placeholders, their values could be split anywhere.
        let has_adjacent_slots = segments
            .windows(2)
            .any(|pair| matches!(pair, [Segment::Slot(_), Segment::Slot(_)]));
        if has_adjacent_slots {
            return Err(invalid());
        }

        Ok(KeyFormat { template, segments })
    }

    /// Return the template string this format was parsed from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Resolve the given `parts` into a key.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: One of the parts is empty, contains a `/` or a character of the text
    /// which separates it from the next placeholder, or the rendered key is not a valid key.
    pub fn resolve(&self, parts: &KeyParts) -> crate::Result<Key> {
        let mut rendered = String::new();
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Slot(slot) => rendered.push_str(self.checked_part(index, parts, *slot)?),
            }
        }

        Key::new(rendered)
    }

    /// Return the literal between the placeholder at `index` and the next placeholder.
    fn separator(&self, index: usize) -> Option<&str> {
        match (self.segments.get(index + 1), self.segments.get(index + 2)) {
            (Some(Segment::Literal(text)), Some(Segment::Slot(_))) => Some(text),
            _ => None,
        }
    }

    /// Return the value of `slot` for the placeholder at `index`, checking that it can be told
    /// apart from the rest of the key.
    fn checked_part<'a>(
        &self,
        index: usize,
        parts: &KeyParts<'a>,
        slot: Slot,
    ) -> crate::Result<&'a str> {
        let value = parts.get(slot);
        let contains_separator = self
            .separator(index)
            .map_or(false, |separator| value.contains(|c: char| separator.contains(c)));
        if value.is_empty() || value.contains('/') || contains_separator {
            return Err(crate::Error::InvalidKey(value.to_string()));
        }
        Ok(value)
    }

    /// Return the namespace which contains the keys of a field.
    ///
    /// This renders the template up to the last `/` before the first `{identifier}` placeholder.
    /// This is the prefix passed to [`Backend::initial`] when setting up a field.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: One of the parts is empty or contains a `/`.
    ///
    /// [`Backend::initial`]: crate::backend::Backend::initial
    pub fn prefix(
        &self,
        collection: &str,
        entity_type: &str,
        field: &str,
    ) -> crate::Result<String> {
        let parts = KeyParts {
            collection,
            entity_type,
            field,
            identifier: "",
        };

        let mut rendered = String::new();
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Slot(Slot::Identifier) => break,
                Segment::Slot(slot) => rendered.push_str(self.checked_part(index, &parts, *slot)?),
            }
        }

        let prefix = match rendered.rfind('/') {
            Some(index) => rendered[..index].to_string(),
            None => String::new(),
        };

        if is_valid_namespace(&prefix) {
            Ok(prefix)
        } else {
            Err(crate::Error::InvalidKey(prefix))
        }
    }
}

impl Default for KeyFormat {
    fn default() -> Self {
        let separator = || Segment::Literal(String::from("/"));
        KeyFormat {
            template: String::from(DEFAULT_KEY_FORMAT),
            segments: vec![
                Segment::Slot(Slot::Collection),
                separator(),
                Segment::Slot(Slot::EntityType),
                separator(),
                Segment::Slot(Slot::Field),
                separator(),
                Segment::Slot(Slot::Identifier),
                Segment::Literal(String::from(".txt")),
            ],
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl FromStr for KeyFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        KeyFormat::new(s)
    }
}
