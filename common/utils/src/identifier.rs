// Copyright (C) 2024 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Opaque identifier utilities.
//!
//! This module provides the label type used to tag in-flight calls for later
//! lookup. An identifier is caller-supplied, compared only for equality, and
//! never used for ordering. The same type serves both call ids and call
//! groups.

use std::fmt::Display;

/// An opaque caller-supplied label.
///
/// Wraps a string that identifies a call or a call group. Identifiers are
/// immutable once attached to a request and are only ever compared for
/// equality during registry lookups.
///
/// # Examples
///
/// ```rust
/// use scope_utils::identifier::Identifier;
///
/// let id = Identifier::new("req-1");
/// let same = Identifier::from("req-1");
/// assert_eq!(id, same);
///
/// // Abbreviated form for logs
/// let long = Identifier::new("0123456789abcdef");
/// assert_eq!(long.brief(), "0123");
/// ```
#[derive(Hash, PartialEq, Eq, Clone, Debug)]
pub struct Identifier {
    /// The label that identifies the call or group.
    label: String,
}

impl Identifier {
    /// Creates a new identifier from a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Returns a shortened version of the identifier for log output.
    ///
    /// Returns the first quarter of the label. Labels too short to abbreviate,
    /// or whose quarter boundary falls inside a multi-byte character, are
    /// returned whole.
    pub fn brief(&self) -> &str {
        let len = self.label.len();
        if len < 8 {
            return &self.label;
        }
        self.label.get(..len / 4).unwrap_or(&self.label)
    }
}

impl From<&str> for Identifier {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Identifier {
    fn from(label: String) -> Self {
        Self::new(label)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}
