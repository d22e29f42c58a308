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

//! Process-wide debug sink.
//!
//! Diagnostics from the scope engine flow through the `log` facade under
//! one tag, gated by a single process-wide flag so embedders pay nothing
//! when it is off. Sink configuration itself belongs to the embedder.

use std::error::Error;
use std::fmt::Display;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::LOG_TAG;

static DEBUG: AtomicBool = AtomicBool::new(false);

/// Enables or disables the debug sink.
pub fn set_debug(enable: bool) {
    DEBUG.store(enable, Ordering::Relaxed);
}

/// Returns whether the debug sink is enabled.
pub fn is_debug() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Logs a diagnostic message when the debug sink is enabled.
///
/// The message is annotated with the caller's file and line so registry
/// sweeps and scope transitions can be traced back to their call site.
#[track_caller]
pub fn debug(message: impl Display) {
    if !is_debug() {
        return;
    }
    let caller = Location::caller();
    log::debug!(
        target: LOG_TAG,
        "{} ({}:{})",
        message,
        caller.file(),
        caller.line()
    );
}

/// Logs an error and its source chain when the debug sink is enabled.
///
/// Errors carry their own origin, so no call-site annotation is added.
pub fn debug_error(error: &(dyn Error + 'static)) {
    if !is_debug() {
        return;
    }
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    log::debug!(target: LOG_TAG, "{}", message);
}
