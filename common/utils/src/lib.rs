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

//! Common utilities for scope operations.
//!
//! This crate provides the shared building blocks for the task-scope system:
//! opaque identifiers used to tag in-flight calls, the lifecycle observation
//! capability that binds scopes to an external owner's lifecycle, and
//! logging helpers for tests.

#![allow(clippy::new_without_default)]

/// Internal macros module.
#[macro_use]
mod macros;

/// Opaque identifier utilities for call ids and groups.
pub mod identifier;

/// Observation utilities for external lifecycle events.
pub mod observe;


pub use log::{debug, error, info};
