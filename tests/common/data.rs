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

use rand::distributions::Alphanumeric;
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use rstest::*;

use rcs_store::Key;

/// The minimum size of test data buffers.
const MIN_BUFFER_SIZE: usize = 1024;

/// The maximum size of test data buffers.
const MAX_BUFFER_SIZE: usize = 2048;

/// The length of random identifiers.
const IDENTIFIER_LEN: usize = 12;

/// Return a randomly sized buffer of random bytes.
#[fixture]
pub fn buffer() -> Vec<u8> {
    let mut rng = SmallRng::from_entropy();
    let mut buffer = vec![0u8; rng.gen_range(MIN_BUFFER_SIZE..MAX_BUFFER_SIZE)];
    rng.fill_bytes(&mut buffer);
    buffer
}

/// Return a random key in a three-level namespace.
#[fixture]
pub fn key() -> Key {
    let rng = SmallRng::from_entropy();
    let identifier: String = rng
        .sample_iter(&Alphanumeric)
        .take(IDENTIFIER_LEN)
        .map(char::from)
        .collect();
    Key::new(format!("app/model/field/{}.txt", identifier)).unwrap()
}

/// Parse `path` as a key.
pub fn key_of(path: &str) -> Key {
    Key::new(path).unwrap()
}
