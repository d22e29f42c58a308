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

//! Call tagging for registry lookup.
//!
//! A tag is attached to a call when the request is built and never changes
//! afterwards. Tags exist purely so calls can be found again from outside
//! the scope that launched them; they impose no ordering.

use scope_utils::identifier::Identifier;

/// Caller-supplied lookup metadata attached to a call.
///
/// Ids are expected to be unique per call; groups are shared across calls
/// that should be cancelled together. Both are optional.
#[derive(Clone, Debug, Default)]
pub struct CallTag {
    /// Identifier unique to this call.
    pub id: Option<Identifier>,
    /// Identifier shared by calls cancelled as a unit.
    pub group: Option<Identifier>,
}

impl CallTag {
    /// Creates an empty tag.
    pub fn new() -> Self {
        Self {
            id: None,
            group: None,
        }
    }

    /// Creates a tag carrying only an id.
    pub fn with_id(id: impl Into<Identifier>) -> Self {
        Self {
            id: Some(id.into()),
            group: None,
        }
    }

    /// Creates a tag carrying only a group.
    pub fn with_group(group: impl Into<Identifier>) -> Self {
        Self {
            id: None,
            group: Some(group.into()),
        }
    }

    /// Creates a tag carrying both an id and a group.
    pub fn with(id: impl Into<Identifier>, group: impl Into<Identifier>) -> Self {
        Self {
            id: Some(id.into()),
            group: Some(group.into()),
        }
    }
}
