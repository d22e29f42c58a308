// Copyright (C) 2025 Huawei Device Co., Ltd.
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

//! Lifecycle event observation for external owners.
//!
//! This module defines the minimal capability an external owner (a view, a
//! component, a process-lifecycle framework) must expose so that scopes can
//! be bound to its teardown: subscribe an observer, unsubscribe it again,
//! deliver the terminal event at most once per subscription. A provided
//! registrar implements the capability for any framework that can call
//! `notify`.

mod late;
mod observer;
mod register;

pub use late::LateLifecycleOwner;
pub use observer::{LifecycleEvent, Observer};
pub use register::{LifecycleOwner, LifecycleRegistrar, SubscriptionHandle, UnsubscribeError};
