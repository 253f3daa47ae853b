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

use std::fmt::Debug;
use std::mem::discriminant;

use spectral::{AssertionFailure, Spec};

/// An assertion which checks that an `rcs_store::Result` failed with a given error variant.
///
/// Only the variant is compared, so the expected value's fields are ignored.
pub trait ErrorVariantAssertions {
    fn is_err_variant(&self, expected: rcs_store::Error);
}

impl<'a, T: Debug> ErrorVariantAssertions for Spec<'a, rcs_store::Result<T>> {
    fn is_err_variant(&self, expected: rcs_store::Error) {
        let actual = match self.subject {
            Err(error) if discriminant(error) == discriminant(&expected) => return,
            Err(error) => format!("Err({:?})", error),
            Ok(value) => format!("Ok({:?})", value),
        };
        AssertionFailure::from_spec(self)
            .with_expected(format!("Err({:?})", expected))
            .with_actual(actual)
            .fail();
    }
}

/// Assertions on the lines of a unified diff.
pub trait DiffAssertions {
    fn has_added_line(&self, line: &str);
    fn has_removed_line(&self, line: &str);
}

impl<'a> DiffAssertions for Spec<'a, Vec<String>> {
    fn has_added_line(&self, line: &str) {
        check_line(self, format!("+{}\n", line));
    }

    fn has_removed_line(&self, line: &str) {
        check_line(self, format!("-{}\n", line));
    }
}

fn check_line(spec: &Spec<Vec<String>>, expected: String) {
    if !spec.subject.contains(&expected) {
        AssertionFailure::from_spec(spec)
            .with_expected(format!("a diff containing {:?}", expected))
            .with_actual(format!("{:?}", spec.subject))
            .fail();
    }
}
