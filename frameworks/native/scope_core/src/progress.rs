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

//! Progress listener registration for in-flight calls.
//!
//! Each call carries one listener set for uploads and one for downloads,
//! mutable while the call is in flight. This module manages registration
//! only; invoking the listeners with transferred-byte counts is the
//! transport's job, via [`ProgressListeners::notify`].

use std::sync::{Arc, Mutex};

use scope_utils::identifier::Identifier;

use crate::call::CallHandle;
use crate::registry::CallRegistry;

/// Observes transfer progress of one direction of a call.
pub trait ProgressListener: Send + Sync {
    /// Reports bytes transferred so far and the expected total (0 if
    /// unknown).
    fn on_progress(&self, progress: u64, total: u64);
}

/// An ordered set of progress listeners attached to one call direction.
///
/// Listeners are notified in registration order and identified by pointer
/// identity. A listener added mid-transfer sees only events emitted after
/// registration; nothing is replayed.
pub struct ProgressListeners {
    listeners: Mutex<Vec<Arc<dyn ProgressListener>>>,
}

impl ProgressListeners {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Appends a listener.
    pub fn add(&self, listener: Arc<dyn ProgressListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Removes the first occurrence of the listener, by pointer identity.
    ///
    /// Returns `false` if the listener was not registered.
    pub fn remove(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        match listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Delivers a progress event to every listener, in registration order.
    ///
    /// The set is snapshotted first, so a listener may add or remove
    /// listeners from inside its callback.
    pub fn notify(&self, progress: u64, total: u64) {
        let snapshot: Vec<Arc<dyn ProgressListener>> =
            self.listeners.lock().unwrap().clone();
        for listener in snapshot {
            listener.on_progress(progress, total);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().unwrap().is_empty()
    }
}

impl Default for ProgressListeners {
    fn default() -> Self {
        Self::new()
    }
}

impl CallRegistry {
    /// Attaches an upload listener to every active call tagged with `id`.
    ///
    /// Silent no-op when no active call matches: a listener registered for
    /// a not-yet-started or already-finished request has no effect.
    pub fn add_upload_listener(&self, id: &Identifier, listener: Arc<dyn ProgressListener>) {
        self.for_each_matching(id, |call| call.upload_listeners().add(listener.clone()));
    }

    /// Detaches an upload listener from every active call tagged with `id`.
    pub fn remove_upload_listener(&self, id: &Identifier, listener: &Arc<dyn ProgressListener>) {
        self.for_each_matching(id, |call| {
            call.upload_listeners().remove(listener);
        });
    }

    /// Attaches a download listener to every active call tagged with `id`.
    pub fn add_download_listener(&self, id: &Identifier, listener: Arc<dyn ProgressListener>) {
        self.for_each_matching(id, |call| call.download_listeners().add(listener.clone()));
    }

    /// Detaches a download listener from every active call tagged with `id`.
    pub fn remove_download_listener(&self, id: &Identifier, listener: &Arc<dyn ProgressListener>) {
        self.for_each_matching(id, |call| {
            call.download_listeners().remove(listener);
        });
    }

    /// Runs `f` for every live entry whose tag id equals `id`.
    ///
    /// Ids may be reused; every active match receives the mutation.
    fn for_each_matching(&self, id: &Identifier, mut f: impl FnMut(&Arc<dyn CallHandle>)) {
        self.for_each(|call| {
            if call.tag().id.as_ref() == Some(id) {
                f(call);
            }
        });
    }
}
