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

//! Conditional compilation utility macros.
//!
//! This module provides macros for conditional compilation based on build
//! configurations, enabling code to be included or excluded depending on
//! whether the code is being compiled in test mode.

/// Conditionally includes items only when compiled in test mode.
///
/// Wraps the provided items with `#[cfg(test)]`, causing them to be included
/// only when the test configuration is active.
///
/// # Examples
///
/// ```rust
/// use scope_utils::cfg_test;
///
/// cfg_test! {
///     fn test_helper() -> u32 {
///         42
///     }
/// }
///
/// #[test]
/// fn test_using_helper() {
///     // Available only in test mode
///     assert_eq!(test_helper(), 42);
/// }
/// ```
#[macro_export]
macro_rules! cfg_test {
    ($($item:item)*) => {
        $(
            #[cfg(test)]
            $item
        )*
    }
}
