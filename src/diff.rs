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

//! Unified diffs between snapshots.

use std::fmt;
use std::vec;

use similar::TextDiff;

use crate::backend::Backend;
use crate::key::Key;
use crate::revision::Revision;

/// The number of unchanged lines shown around each change.
const CONTEXT_LINES: usize = 3;

/// Return the header label for the given `revision`.
pub fn revision_label(revision: &Revision) -> String {
    format!("Revision: {}", revision)
}

/// Compute the lines of a unified diff from `old` to `new`.
///
/// Content which is not valid UTF-8 is decoded lossily. Each returned line keeps its trailing
/// newline. If the contents are identical, this returns no lines at all, not even the header.
pub fn unified_diff(old: &[u8], new: &[u8], old_label: &str, new_label: &str) -> Vec<String> {
    let old = String::from_utf8_lossy(old);
    let new = String::from_utf8_lossy(new);
    let text_diff = TextDiff::from_lines(old.as_ref(), new.as_ref());
    let rendered = text_diff
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(old_label, new_label)
        .to_string();
    rendered.split_inclusive('\n').map(String::from).collect()
}

/// One side of a [`Diff`].
///
/// [`Diff`]: crate::diff::Diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSide {
    /// A snapshot stored in the log.
    Stored { key: Key, revision: Revision },

    /// A value held by the caller, which may include changes that are not committed yet.
    Live { content: Vec<u8> },
}

impl DiffSide {
    fn label(&self) -> String {
        match self {
            DiffSide::Stored { revision, .. } => revision_label(revision),
            DiffSide::Live { .. } => revision_label(&Revision::Head),
        }
    }

    fn content(&self, backend: &dyn Backend) -> crate::Result<Vec<u8>> {
        match self {
            DiffSide::Stored { key, revision } => backend.fetch(key, revision),
            DiffSide::Live { content } => Ok(content.clone()),
        }
    }
}

/// A lazy, restartable unified diff between two sides.
///
/// Nothing is computed until [`lines`] is called, and every call computes the diff again from
/// the backend; results are never cached. A diff of a stored snapshot against itself is always
/// empty and never touches the backend.
///
/// [`lines`]: crate::diff::Diff::lines
pub struct Diff<'a> {
    backend: &'a dyn Backend,
    old: DiffSide,
    new: DiffSide,
}

impl<'a> fmt::Debug for Diff<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diff")
            .field("old", &self.old)
            .field("new", &self.new)
            .finish()
    }
}

impl<'a> Diff<'a> {
    /// Create a diff from `old` to `new` which reads snapshots from `backend`.
    pub fn new(backend: &'a dyn Backend, old: DiffSide, new: DiffSide) -> Self {
        Diff { backend, old, new }
    }

    /// The old side of this diff.
    pub fn old(&self) -> &DiffSide {
        &self.old
    }

    /// The new side of this diff.
    pub fn new_side(&self) -> &DiffSide {
        &self.new
    }

    /// Return whether both sides are the same stored snapshot.
    pub fn is_noop(&self) -> bool {
        matches!(self.old, DiffSide::Stored { .. }) && self.old == self.new
    }

    /// Compute the lines of this diff.
    ///
    /// # Errors
    /// Any error from fetching a stored side is returned.
    pub fn lines(&self) -> crate::Result<DiffLines> {
        if self.is_noop() {
            return Ok(DiffLines::default());
        }

        let lines = match (&self.old, &self.new) {
            (
                DiffSide::Stored {
                    key: old_key,
                    revision: old_revision,
                },
                DiffSide::Stored {
                    key: new_key,
                    revision: new_revision,
                },
            ) => self
                .backend
                .diff(old_key, old_revision, new_key, new_revision)?,
            (old, new) => unified_diff(
                &old.content(self.backend)?,
                &new.content(self.backend)?,
                &old.label(),
                &new.label(),
            ),
        };

        Ok(DiffLines(lines.into_iter()))
    }

    /// Compute the lines of this diff, or return no lines if that fails.
    ///
    /// This is meant for displaying a diff, where an empty diff is preferable to an error.
    pub fn lines_or_empty(&self) -> DiffLines {
        self.lines().unwrap_or_else(|error| {
            log::warn!("Could not compute {:?}: {}", self, error);
            DiffLines::default()
        })
    }
}

/// An iterator over the lines of a [`Diff`].
///
/// [`Diff`]: crate::diff::Diff
#[derive(Debug, Clone)]
pub struct DiffLines(vec::IntoIter<String>);

impl Default for DiffLines {
    fn default() -> Self {
        DiffLines(Vec::new().into_iter())
    }
}

impl Iterator for DiffLines {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for DiffLines {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_has_no_lines() {
        assert!(unified_diff(b"same\n", b"same\n", "a", "b").is_empty());
    }

    #[test]
    fn changed_line_is_reported_with_headers() {
        let lines = unified_diff(
            b"first\nsecond\n",
            b"first\nchanged\n",
            "Revision: 1",
            "Revision: 2",
        );

        assert_eq!(lines[0], "--- Revision: 1\n");
        assert_eq!(lines[1], "+++ Revision: 2\n");
        assert!(lines[2].starts_with("@@"));
        assert!(lines.contains(&String::from("-second\n")));
        assert!(lines.contains(&String::from("+changed\n")));
        assert!(lines.contains(&String::from(" first\n")));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let lines = unified_diff(&[0xff, b'\n'], b"ok\n", "a", "b");
        assert!(lines.iter().any(|line| line.starts_with('-')));
    }
}
