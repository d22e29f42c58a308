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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::error;

use super::{LifecycleOwner, Observer, SubscriptionHandle, UnsubscribeError};

enum LateState {
    /// Stream not yet available; subscriptions are buffered in order.
    Pending(Vec<(u64, Arc<dyn Observer>)>),
    Attached(Arc<dyn LifecycleOwner>),
}

/// A lifecycle owner whose underlying event stream may not exist yet.
///
/// Covers owners whose lifecycle becomes available only after construction,
/// such as a view hierarchy not yet attached. Subscriptions taken while
/// pending are buffered and forwarded exactly once when `attach` supplies
/// the real stream; unsubscribing works in both phases.
pub struct LateLifecycleOwner {
    // Lock order: `state` before `forwarded`.
    state: Mutex<LateState>,
    forwarded: Mutex<HashMap<u64, SubscriptionHandle>>,
    next_id: AtomicU64,
}

impl LateLifecycleOwner {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LateState::Pending(Vec::new())),
            forwarded: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Supplies the real lifecycle stream and forwards buffered subscriptions.
    ///
    /// A second attach is rejected; the first stream stays in place.
    pub fn attach(&self, owner: Arc<dyn LifecycleOwner>) {
        let mut state = self.state.lock().unwrap();
        let pending = match &mut *state {
            LateState::Pending(pending) => std::mem::take(pending),
            LateState::Attached(_) => {
                error!("lifecycle owner already attached");
                return;
            }
        };
        let mut forwarded = self.forwarded.lock().unwrap();
        for (id, observer) in pending {
            let inner = owner.subscribe(observer);
            forwarded.insert(id, inner);
        }
        drop(forwarded);
        *state = LateState::Attached(owner);
    }

    /// Returns `true` once the real stream has been supplied.
    pub fn is_attached(&self) -> bool {
        matches!(&*self.state.lock().unwrap(), LateState::Attached(_))
    }
}

impl LifecycleOwner for LateLifecycleOwner {
    fn subscribe(&self, observer: Arc<dyn Observer>) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock().unwrap();
        match &mut *state {
            LateState::Pending(pending) => pending.push((id, observer)),
            LateState::Attached(owner) => {
                let inner = owner.subscribe(observer);
                self.forwarded.lock().unwrap().insert(id, inner);
            }
        }
        SubscriptionHandle::from_raw(id)
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), UnsubscribeError> {
        let mut state = self.state.lock().unwrap();
        match &mut *state {
            LateState::Pending(pending) => {
                match pending.iter().position(|(id, _)| *id == handle.raw()) {
                    Some(index) => {
                        pending.remove(index);
                        Ok(())
                    }
                    None => Err(UnsubscribeError::NotRegistered),
                }
            }
            LateState::Attached(owner) => {
                let inner = self
                    .forwarded
                    .lock()
                    .unwrap()
                    .remove(&handle.raw())
                    .ok_or(UnsubscribeError::NotRegistered)?;
                owner.unsubscribe(&inner)
            }
        }
    }
}
