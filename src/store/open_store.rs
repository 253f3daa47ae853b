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

use crate::store::LogStore;

/// A value which can be used to open a `LogStore`.
pub trait OpenStore {
    /// The type of `LogStore` which this value can be used to open.
    type Store: LogStore + 'static;

    /// Open a log store of type `Store`.
    ///
    /// This does not create the storage root; that happens lazily in [`LogStore::initial`].
    ///
    /// # Errors
    /// - `Error::UnsupportedFormat`: The storage represented by this value contains a log in an
    /// unsupported format.
    /// - `Error::Store`: An error occurred with the log store.
    /// - `Error::Io`: An I/O error occurred.
    ///
    /// [`LogStore::initial`]: crate::store::LogStore::initial
    fn open(&self) -> crate::Result<Self::Store>;
}
