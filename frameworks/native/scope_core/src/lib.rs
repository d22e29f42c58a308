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

//! Task-scope engine for cancellable asynchronous work.
//!
//! This crate wraps units of asynchronous work, typically network requests,
//! in scopes that catch every error instead of crashing the host process,
//! can be bound to an external owner's lifecycle so in-flight work dies with
//! the owner, and register their in-flight calls in a process-wide registry
//! where they can be cancelled individually, by group, or wholesale from
//! outside the scope that created them. The registry holds only non-owning
//! references, so completed work never leaks.
//!
//! The wire-level transport is a collaborator, consumed through the opaque
//! [`CallHandle`] abstraction; this crate owns lifecycles and lookup, never
//! sockets.

#![allow(clippy::new_without_default)]

#[macro_use]
extern crate scope_utils;

/// Call handle and transport collaborator contracts.
pub mod call;

/// Process-wide debug sink configuration.
pub mod config;

/// Lifecycle binding of scopes to external owners.
pub mod lifecycle;

/// Progress listener registration for in-flight calls.
pub mod progress;

/// Running-call registry and cancellation engine.
pub mod registry;

/// Task scopes and their state machine.
pub mod scope;

/// Call tagging for registry lookup.
pub mod tag;

/// Testing utilities.
pub mod test;

mod cancel;

pub use call::{CallHandle, TransportDispatcher};
pub use config::{debug, debug_error, is_debug, set_debug};
pub use lifecycle::LifecycleBinding;
pub use progress::{ProgressListener, ProgressListeners};
pub use registry::CallRegistry;
pub use scope::{
    scope, scope_bound_to, BusinessError, Dispatcher, ErrorHandler, ScopeContext, ScopeError,
    ScopeState, TaskScope, TaskScopeBuilder,
};
pub use tag::CallTag;

/// Log target for this crate's diagnostics.
pub(crate) const LOG_TAG: &str = "ScopeCore";
