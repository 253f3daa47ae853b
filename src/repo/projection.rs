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

use crate::revision::{Revision, RevisionId};

use super::field::VersionedField;
use super::revision_store::RevisionStore;

/// A record in the primary store which holds the head value of its versioned fields.
pub trait Record {
    /// The identifier of this record, used to build its keys.
    fn id(&self) -> String;

    /// The current value of the field named `field`.
    ///
    /// A field which this record does not have reads as empty.
    fn value(&self, field: &str) -> Vec<u8>;

    /// Replace the value of the field named `field` with `value`.
    fn set_value(&mut self, field: &str, value: Vec<u8>);
}

/// Where the values of a read come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadState {
    /// The values cached in the primary store are used as-is.
    Head,

    /// The values are fetched from the log at the given revision.
    Historical(RevisionId),
}

impl ReadState {
    /// Return the state for reading at the `requested` revision.
    ///
    /// Only a revision which is present and is not the head causes a historical read.
    pub fn for_revision(requested: Option<&Revision>) -> Self {
        match requested.and_then(Revision::id) {
            Some(id) => ReadState::Historical(id),
            None => ReadState::Head,
        }
    }
}

/// Where the value of one field of a projected record came from.
#[derive(Debug)]
pub enum Source {
    /// The head value in the primary store was used without reading the log.
    Head,

    /// The value was replaced with historical content from the log.
    Historical,

    /// Reading the log failed, so the head value was kept.
    Fallback(crate::Error),
}

impl Source {
    /// Return whether a failed read fell back to the head value.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Source::Fallback(_))
    }
}

/// The outcome of projecting one record.
#[derive(Debug, Default)]
pub struct Projection {
    fields: Vec<(String, Source)>,
}

impl Projection {
    /// Return where the value of the field named `field` came from.
    pub fn source(&self, field: &str) -> Option<&Source> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, source)| source)
    }

    /// Return an iterator over each projected field and where its value came from.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Source)> {
        self.fields
            .iter()
            .map(|(name, source)| (name.as_str(), source))
    }

    /// Return whether any field fell back to its head value.
    pub fn has_fallback(&self) -> bool {
        self.fields.iter().any(|(_, source)| source.is_fallback())
    }
}

/// A view of records at a requested revision.
///
/// At the head, records are returned untouched. At any other revision, the value of each
/// versioned field is replaced with the content fetched from the log. A fetch which fails never
/// fails the read; the head value stays in place and the failure is reported in the
/// [`Projection`].
///
/// [`Projection`]: crate::repo::Projection
#[derive(Debug)]
pub struct RevisionView<'a> {
    store: &'a RevisionStore,
    fields: &'a [VersionedField],
    state: ReadState,
}

impl<'a> RevisionView<'a> {
    /// Create a view of `fields` at the `requested` revision.
    pub fn new(
        store: &'a RevisionStore,
        fields: &'a [VersionedField],
        requested: Option<&Revision>,
    ) -> Self {
        RevisionView {
            store,
            fields,
            state: ReadState::for_revision(requested),
        }
    }

    /// The state this view reads in.
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Replace the versioned fields of `record` with their values at the revision of this view.
    pub fn project<R: Record + ?Sized>(&self, record: &mut R) -> Projection {
        let fields = self
            .fields
            .iter()
            .map(|field| (field.name().to_string(), self.project_field(field, &mut *record)))
            .collect();
        Projection { fields }
    }

    fn project_field<R: Record + ?Sized>(&self, field: &VersionedField, record: &mut R) -> Source {
        let id = match self.state {
            ReadState::Head => return Source::Head,
            ReadState::Historical(id) => id,
        };

        let content = field
            .key(&record.id())
            .and_then(|key| self.store.fetch(&key, &Revision::Id(id)));

        match content {
            Ok(content) => {
                record.set_value(field.name(), content);
                Source::Historical
            }
            Err(error) => {
                log::warn!(
                    "Could not read '{}' of record {} at revision {}, using the head value: {}",
                    field.name(),
                    record.id(),
                    id,
                    error
                );
                Source::Fallback(error)
            }
        }
    }

    /// Return an iterator which projects each record of `records` as it is consumed.
    pub fn records<I>(&self, records: I) -> Records<'_, 'a, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Record,
    {
        Records {
            view: self,
            records: records.into_iter(),
        }
    }
}

/// An iterator over projected records.
///
/// This is returned by [`RevisionView::records`].
///
/// [`RevisionView::records`]: crate::repo::RevisionView::records
#[derive(Debug)]
pub struct Records<'v, 'a, I> {
    view: &'v RevisionView<'a>,
    records: I,
}

impl<'v, 'a, I> Iterator for Records<'v, 'a, I>
where
    I: Iterator,
    I::Item: Record,
{
    type Item = (I::Item, Projection);

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = self.records.next()?;
        let projection = self.view.project(&mut record);
        Some((record, projection))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}
