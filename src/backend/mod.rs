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

//! Pluggable engines which version content.
//!
//! A [`Backend`] implements the operations of a versioned key-value content store: committing
//! snapshots, fetching them at any revision, listing the revisions of a key, renaming a key while
//! keeping its history, and diffing two snapshots.
//!
//! Backends form a closed set which is selected by name with [`BackendConfig`]. Every backend
//! except the [`DummyBackend`] is a [`LogBackend`] over one of the log stores in [`store`].
//!
//! [`Backend`]: crate::backend::Backend
//! [`BackendConfig`]: crate::backend::BackendConfig
//! [`DummyBackend`]: crate::backend::DummyBackend
//! [`LogBackend`]: crate::backend::LogBackend
//! [`store`]: crate::store

pub use self::backend::Backend;
pub use self::config::{available_backends, BackendConfig, Settings, BACKEND_VAR, PATH_VAR};
pub use self::dummy::DummyBackend;
pub use self::log_backend::LogBackend;

mod backend;
mod config;
mod dummy;
mod log_backend;
