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

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{LifecycleEvent, Observer};

/// Handle returned by a subscription, required to unsubscribe again.
///
/// Owners implemented outside this crate mint handles with
/// [`from_raw`](SubscriptionHandle::from_raw) from whatever id scheme they
/// keep internally.
#[derive(Debug, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: u64,
}

impl SubscriptionHandle {
    /// Creates a handle from a raw subscription id issued by an owner.
    pub fn from_raw(id: u64) -> Self {
        Self { id }
    }

    /// Returns the raw subscription id.
    pub fn raw(&self) -> u64 {
        self.id
    }
}

/// The lifecycle capability an external owner exposes to the scope system.
///
/// The scope core depends only on this trait, never on a concrete framework
/// type. Implementations must deliver the terminal event at most once per
/// subscription.
pub trait LifecycleOwner: Send + Sync {
    /// Subscribes an observer to the owner's event stream.
    fn subscribe(&self, observer: Arc<dyn Observer>) -> SubscriptionHandle;

    /// Removes a previous subscription.
    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), UnsubscribeError>;
}

/// A lifecycle event stream drivable by any framework.
///
/// Observers are notified in subscription order. Delivering the terminal
/// event drains the observer list, so each subscription sees `Destroy` at
/// most once and nothing after it; later subscriptions are not retained.
pub struct LifecycleRegistrar {
    observers: Mutex<Vec<(u64, Arc<dyn Observer>)>>,
    next_id: AtomicU64,
    terminated: AtomicBool,
}

impl LifecycleRegistrar {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            terminated: AtomicBool::new(false),
        }
    }

    /// Delivers an event to every current observer.
    ///
    /// The observer list is snapshotted first, so observers may subscribe or
    /// unsubscribe from inside their callback without deadlocking.
    pub fn notify(&self, event: LifecycleEvent) {
        if self.terminated.load(Ordering::Acquire) {
            return;
        }
        let snapshot: Vec<Arc<dyn Observer>> = if event.is_terminal() {
            self.terminated.store(true, Ordering::Release);
            let mut observers = self.observers.lock().unwrap();
            observers.drain(..).map(|(_, observer)| observer).collect()
        } else {
            self.observers
                .lock()
                .unwrap()
                .iter()
                .map(|(_, observer)| observer.clone())
                .collect()
        };
        for observer in snapshot {
            observer.on_event(event);
        }
    }

    /// Returns the number of currently retained observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    /// Returns `true` once the terminal event has been delivered.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

impl LifecycleOwner for LifecycleRegistrar {
    fn subscribe(&self, observer: Arc<dyn Observer>) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // Subscriptions after teardown would never fire; do not retain them.
        if !self.terminated.load(Ordering::Acquire) {
            self.observers.lock().unwrap().push((id, observer));
        }
        SubscriptionHandle::from_raw(id)
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), UnsubscribeError> {
        let mut observers = self.observers.lock().unwrap();
        match observers.iter().position(|(id, _)| *id == handle.raw()) {
            Some(index) => {
                observers.remove(index);
                Ok(())
            }
            None => Err(UnsubscribeError::NotRegistered),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum UnsubscribeError {
    NotRegistered,
}
