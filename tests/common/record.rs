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

use std::collections::HashMap;

use rcs_store::repo::Record;

/// A record in a fake primary store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    pub id: u64,
    pub fields: HashMap<String, String>,
}

impl TestRecord {
    pub fn new(id: u64) -> Self {
        TestRecord {
            id,
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: &str) {
        self.fields.insert(field.to_string(), value.to_string());
    }

    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }
}

impl Record for TestRecord {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn value(&self, field: &str) -> Vec<u8> {
        self.get(field).as_bytes().to_vec()
    }

    fn set_value(&mut self, field: &str, value: Vec<u8>) {
        self.set(field, &String::from_utf8_lossy(&value));
    }
}
