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

//! Cancellation engine built atop the running-call registry.
//!
//! All operations are best effort against a moving target: a call may
//! complete between lookup and cancellation, in which case cancelling its
//! handle is a no-op by the handle contract. Handles are always cancelled
//! outside the registry lock.

use std::sync::Arc;

use scope_utils::identifier::Identifier;

use crate::call::CallHandle;
use crate::config;
use crate::registry::CallRegistry;

impl CallRegistry {
    /// Cancels every live call and clears the registry, then forwards to
    /// the transport's global dispatcher for anything it still tracks
    /// independently, such as queued-but-not-started work.
    pub fn cancel_all(&self) {
        let live = self.remove_where(|_| true);
        for call in &live {
            call.cancel();
        }
        if let Some(transport) = self.transport() {
            transport.cancel_all();
        }
        config::debug(format!("cancel_all swept {} calls", live.len()));
    }

    /// Cancels the first-registered call tagged with `id` and removes its
    /// entry.
    ///
    /// Ids are expected to be unique, so scanning stops at the first match.
    /// Returns `true` if a call was cancelled; `None` short-circuits to
    /// `false` without scanning.
    pub fn cancel_by_id(&self, id: Option<&Identifier>) -> bool {
        let Some(id) = id else {
            return false;
        };
        let found = self.remove_first(|call| call.tag().id.as_ref() == Some(id));
        match found {
            Some(call) => {
                call.cancel();
                config::debug(format!("cancelled call id {}", id.brief()));
                true
            }
            None => false,
        }
    }

    /// Cancels every call tagged with `group` and removes the entries.
    ///
    /// Returns `true` if at least one call matched; `None` short-circuits
    /// to `false` without scanning.
    pub fn cancel_by_group(&self, group: Option<&Identifier>) -> bool {
        let Some(group) = group else {
            return false;
        };
        let matches = self.remove_where(|call| call.tag().group.as_ref() == Some(group));
        for call in &matches {
            call.cancel();
        }
        if matches.is_empty() {
            return false;
        }
        config::debug(format!(
            "cancelled {} calls in group {}",
            matches.len(),
            group.brief()
        ));
        true
    }

    /// Removes and returns the first-registered live entry matching `pred`,
    /// stopping the scan there. Dead entries encountered on the way are
    /// purged.
    fn remove_first(
        &self,
        mut pred: impl FnMut(&Arc<dyn CallHandle>) -> bool,
    ) -> Option<Arc<dyn CallHandle>> {
        let mut calls = self.calls.lock().unwrap();
        let mut index = 0;
        while index < calls.len() {
            match calls[index].upgrade() {
                Some(call) => {
                    if pred(&call) {
                        calls.remove(index);
                        return Some(call);
                    }
                    index += 1;
                }
                None => {
                    calls.remove(index);
                }
            }
        }
        None
    }
}
