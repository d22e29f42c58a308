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

//! Running-call registry.
//!
//! A process-wide collection of non-owning references to active call
//! handles. Calls register themselves when they start and deregister when
//! they complete; cancellation sweeps and listener registration scan the
//! collection concurrently with both. Entries are held as [`Weak`]
//! references, so an entry whose handle already completed simply fails to
//! upgrade and is purged on the next pass.
//!
//! Entries keep registration order: id lookups cancel the first-registered
//! match, deterministically, when an id is accidentally reused.

use std::sync::{Arc, Mutex, Once, OnceLock, Weak};

use scope_utils::error;

use crate::call::{CallHandle, TransportDispatcher};

/// Registry of in-flight calls.
///
/// Construct fresh registries in tests; production code shares the
/// process-wide instance from [`CallRegistry::get_instance`]. The internal
/// mutex is held only to snapshot or for single-entry check-and-act, never
/// across a callback into a handle or listener.
pub struct CallRegistry {
    pub(crate) calls: Mutex<Vec<Weak<dyn CallHandle>>>,
    transport: Mutex<Option<Arc<dyn TransportDispatcher>>>,
}

impl CallRegistry {
    /// Creates an empty registry with no transport fallback.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            transport: Mutex::new(None),
        }
    }

    /// Creates an empty registry forwarding full sweeps to `transport`.
    pub fn with_transport(transport: Arc<dyn TransportDispatcher>) -> Self {
        let registry = Self::new();
        registry.set_transport(transport);
        registry
    }

    /// Gets the shared process-wide registry.
    ///
    /// First access installs a panic hook that logs before delegating to
    /// the previous hook.
    pub fn get_instance() -> &'static Self {
        static REGISTRY: OnceLock<CallRegistry> = OnceLock::new();
        static ONCE: Once = Once::new();
        let registry = REGISTRY.get_or_init(CallRegistry::new);

        ONCE.call_once(|| {
            let old_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                error!("Panic occurred {:?}", info);
                old_hook(info);
            }));
        });

        registry
    }

    /// Configures the transport dispatcher used as a fallback by
    /// [`cancel_all`](CallRegistry::cancel_all).
    pub fn set_transport(&self, transport: Arc<dyn TransportDispatcher>) {
        *self.transport.lock().unwrap() = Some(transport);
    }

    pub(crate) fn transport(&self) -> Option<Arc<dyn TransportDispatcher>> {
        self.transport.lock().unwrap().clone()
    }

    /// Adds a call when it starts executing.
    ///
    /// Only a non-owning reference is stored; the registry never extends
    /// the handle's life.
    pub fn register(&self, handle: &Arc<dyn CallHandle>) {
        self.calls.lock().unwrap().push(Arc::downgrade(handle));
    }

    /// Removes a call once it completes, by handle identity.
    ///
    /// The transport's completion callback calls this for success, failure
    /// and cancellation alike. Returns `false` if the entry was already
    /// gone, which is not an error.
    pub fn complete(&self, handle: &Arc<dyn CallHandle>) -> bool {
        let target = Arc::downgrade(handle);
        let mut calls = self.calls.lock().unwrap();
        let found = match calls.iter().position(|entry| entry.ptr_eq(&target)) {
            Some(index) => {
                calls.remove(index);
                true
            }
            None => false,
        };
        calls.retain(|entry| entry.strong_count() > 0);
        found
    }

    /// Runs `f` for every live entry.
    ///
    /// Iterates over a snapshot taken under the lock, so `f` may mutate the
    /// registry, cancel calls, or touch listener sets without deadlocking.
    /// Dead entries are purged while snapshotting.
    pub fn for_each(&self, mut f: impl FnMut(&Arc<dyn CallHandle>)) {
        let snapshot = {
            let mut calls = self.calls.lock().unwrap();
            calls.retain(|entry| entry.strong_count() > 0);
            calls
                .iter()
                .filter_map(Weak::upgrade)
                .collect::<Vec<Arc<dyn CallHandle>>>()
        };
        for call in &snapshot {
            f(call);
        }
    }

    /// Removes every live entry matching `pred` and returns the removed
    /// handles; dead entries are purged along the way.
    ///
    /// `pred` runs under the registry lock and must not call back into the
    /// registry.
    pub fn remove_where(
        &self,
        mut pred: impl FnMut(&Arc<dyn CallHandle>) -> bool,
    ) -> Vec<Arc<dyn CallHandle>> {
        let mut removed = Vec::new();
        let mut calls = self.calls.lock().unwrap();
        calls.retain(|entry| match entry.upgrade() {
            Some(call) => {
                if pred(&call) {
                    removed.push(call);
                    false
                } else {
                    true
                }
            }
            None => false,
        });
        removed
    }

    /// Returns the number of live entries, purging dead ones.
    pub fn len(&self) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.retain(|entry| entry.strong_count() > 0);
        calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

cfg_test! {
    impl CallRegistry {
        /// Returns whether the handle currently has a live entry.
        pub(crate) fn contains(&self, handle: &Arc<dyn CallHandle>) -> bool {
            let target = Arc::downgrade(handle);
            self.calls
                .lock()
                .unwrap()
                .iter()
                .any(|entry| entry.ptr_eq(&target))
        }
    }
}
