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

//! Lifecycle binding of scopes to external owners.
//!
//! A binding observes one owner for one trigger event and cancels its
//! scope exactly once when the event fires. It holds the scope weakly, so
//! an owner outliving its scopes keeps nothing alive, and it unsubscribes
//! itself as soon as it fires or the scope settles on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use scope_utils::observe::lifecycle::{
    LifecycleEvent, LifecycleOwner, Observer, SubscriptionHandle,
};

use crate::config;
use crate::scope::ScopeInner;

/// Observer that cancels a scope when its owner reaches a trigger event.
pub struct LifecycleBinding {
    scope: Weak<ScopeInner>,
    trigger: LifecycleEvent,
    fired: AtomicBool,
    subscription: Mutex<Option<(Arc<dyn LifecycleOwner>, SubscriptionHandle)>>,
}

impl LifecycleBinding {
    /// Subscribes a new binding to `owner` and returns it.
    pub(crate) fn bind(
        scope: Weak<ScopeInner>,
        owner: Arc<dyn LifecycleOwner>,
        trigger: LifecycleEvent,
    ) -> Arc<Self> {
        let binding = Arc::new(Self {
            scope,
            trigger,
            fired: AtomicBool::new(false),
            subscription: Mutex::new(None),
        });
        let handle = owner.subscribe(binding.clone());
        *binding.subscription.lock().unwrap() = Some((owner, handle));
        // The owner may have delivered the trigger from inside subscribe,
        // before the handle was stored; release the subscription now.
        if binding.fired.load(Ordering::SeqCst) {
            binding.detach();
        }
        binding
    }

    /// Unsubscribes from the owner. Idempotent; called when the binding
    /// fires or when the scope settles without it.
    pub(crate) fn detach(&self) {
        let subscription = self.subscription.lock().unwrap().take();
        if let Some((owner, handle)) = subscription {
            if owner.unsubscribe(&handle).is_err() {
                // The owner already drained its observers on a terminal
                // event; nothing left to release.
                config::debug("lifecycle binding already released by owner");
            }
        }
    }
}

impl Observer for LifecycleBinding {
    fn on_event(&self, event: LifecycleEvent) {
        if event != self.trigger {
            return;
        }
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(scope) = self.scope.upgrade() {
            scope.cancel();
        }
        self.detach();
    }
}
