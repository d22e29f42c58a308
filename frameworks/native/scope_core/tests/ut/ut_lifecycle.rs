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

use std::sync::Arc;
use std::time::Duration;

use scope_utils::observe::lifecycle::{LateLifecycleOwner, LifecycleEvent, LifecycleRegistrar};

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use scope_utils::observe::lifecycle::{
    LifecycleOwner, Observer, SubscriptionHandle, UnsubscribeError,
};

use super::*;
use crate::call::CallHandle;
use crate::registry::CallRegistry;
use crate::scope::{
    scope_bound_to, BusinessError, Dispatcher, ErrorHandler, ScopeError, ScopeState, TaskScope,
    TaskScopeBuilder,
};
use crate::tag::CallTag;
use crate::test::TestCall;

struct SilentCheck {
    errors: AtomicUsize,
}

impl SilentCheck {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            errors: AtomicUsize::new(0),
        })
    }
}

impl ErrorHandler for SilentCheck {
    fn on_error(&self, _error: &BusinessError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// Owner that replays its current event to every new observer from inside
/// subscribe, the way a framework reporting an already-destroyed component
/// would.
struct ReplayOwner {
    replay: LifecycleEvent,
    retained: Mutex<Vec<(u64, Arc<dyn Observer>)>>,
    next_id: AtomicU64,
}

impl ReplayOwner {
    fn new(replay: LifecycleEvent) -> Arc<Self> {
        Arc::new(Self {
            replay,
            retained: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        })
    }

    fn retained(&self) -> usize {
        self.retained.lock().unwrap().len()
    }
}

impl LifecycleOwner for ReplayOwner {
    fn subscribe(&self, observer: Arc<dyn Observer>) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.retained.lock().unwrap().push((id, observer.clone()));
        observer.on_event(self.replay);
        SubscriptionHandle::from_raw(id)
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), UnsubscribeError> {
        let mut retained = self.retained.lock().unwrap();
        match retained.iter().position(|(id, _)| *id == handle.raw()) {
            Some(index) => {
                retained.remove(index);
                Ok(())
            }
            None => Err(UnsubscribeError::NotRegistered),
        }
    }
}

async fn wait_settled(scope: &TaskScope) -> ScopeState {
    for _ in 0..200 {
        if scope.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    scope.state()
}

// @tc.name: ut_lifecycle_destroy_cancels
// @tc.desc: Test that destroying the owner cancels the bound scope
// @tc.precon: NA
// @tc.step: 1. Launch a scope bound to an owner, with a registered call
//           2. Destroy the owner
//           3. Simulate the transport's completion callback
// @tc.expect: The scope is cancelled, the call exactly once with it, the
//             error handler stays silent, and the registry entry is gone
//             after completion
// @tc.type: FUNC
// @tc.require: NA
#[tokio::test]
async fn ut_lifecycle_destroy_cancels() {
    let owner = Arc::new(LifecycleRegistrar::new());
    let registry = Arc::new(CallRegistry::new());
    let handler = SilentCheck::new();
    let call = TestCall::new(CallTag::with("req-1", "feed"));
    let handle: Arc<dyn CallHandle> = call.clone();

    registry.register(&handle);
    let body_handle = handle.clone();
    let task = TaskScopeBuilder::new(Dispatcher::current())
        .error_handler(handler.clone())
        .bound_to(owner.clone(), LifecycleEvent::Destroy)
        .launch(move |ctx| async move {
            ctx.bind_call(&body_handle);
            ctx.cancelled().await;
            Err(ScopeError::Cancelled)
        });
    tokio::time::sleep(Duration::from_millis(10)).await;

    owner.notify(LifecycleEvent::Destroy);
    assert_eq!(wait_settled(&task).await, ScopeState::Cancelled);
    assert!(call.is_cancelled());
    assert_eq!(call.cancel_count(), 1);
    assert_eq!(handler.errors.load(Ordering::SeqCst), 0);

    // The transport reports completion for the cancelled call.
    assert!(registry.complete(&handle));
    assert!(registry.is_empty());
}

// @tc.name: ut_lifecycle_non_trigger_ignored
// @tc.desc: Test that non-trigger events leave the scope alone
// @tc.precon: NA
// @tc.step: 1. Bind a scope to an owner's Destroy
//           2. Emit Pause and Stop
// @tc.expect: The scope keeps running
// @tc.type: FUNC
// @tc.require: NA
#[tokio::test]
async fn ut_lifecycle_non_trigger_ignored() {
    let owner = Arc::new(LifecycleRegistrar::new());
    let task = scope_bound_to(owner.clone(), Dispatcher::current(), |ctx| async move {
        ctx.cancelled().await;
        Err(ScopeError::Cancelled)
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    owner.notify(LifecycleEvent::Pause);
    owner.notify(LifecycleEvent::Stop);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(task.state(), ScopeState::Running);

    task.cancel();
    assert_eq!(wait_settled(&task).await, ScopeState::Cancelled);
}

// @tc.name: ut_lifecycle_custom_trigger_once
// @tc.desc: Test a non-default trigger firing more than once
// @tc.precon: NA
// @tc.step: 1. Bind a scope to an owner's Stop event
//           2. Emit Stop twice
// @tc.expect: The scope is cancelled exactly once, without panicking on the
//             repeat
// @tc.type: FUNC
// @tc.require: NA
#[tokio::test]
async fn ut_lifecycle_custom_trigger_once() {
    let owner = Arc::new(LifecycleRegistrar::new());
    let task = TaskScopeBuilder::new(Dispatcher::current())
        .bound_to(owner.clone(), LifecycleEvent::Stop)
        .launch(|ctx| async move {
            ctx.cancelled().await;
            Err(ScopeError::Cancelled)
        });
    tokio::time::sleep(Duration::from_millis(10)).await;

    owner.notify(LifecycleEvent::Stop);
    owner.notify(LifecycleEvent::Stop);
    assert_eq!(wait_settled(&task).await, ScopeState::Cancelled);
    assert_eq!(owner.observer_count(), 0);
}

// @tc.name: ut_lifecycle_completion_detaches
// @tc.desc: Test that natural completion releases the binding
// @tc.precon: NA
// @tc.step: 1. Bind a scope whose body returns immediately
//           2. Wait for settlement
// @tc.expect: The owner retains no observers and a later Destroy is a no-op
// @tc.type: FUNC
// @tc.require: NA
#[tokio::test]
async fn ut_lifecycle_completion_detaches() {
    let owner = Arc::new(LifecycleRegistrar::new());
    let task = scope_bound_to(owner.clone(), Dispatcher::current(), |_ctx| async move {
        Ok(())
    });
    assert_eq!(wait_settled(&task).await, ScopeState::Completed);
    assert_eq!(owner.observer_count(), 0);

    owner.notify(LifecycleEvent::Destroy);
    assert_eq!(task.state(), ScopeState::Completed);
}

// @tc.name: ut_lifecycle_trigger_during_subscribe
// @tc.desc: Test binding to an owner that is already past the trigger
// @tc.precon: NA
// @tc.step: 1. Bind a scope to an owner that replays Destroy from inside
//              subscribe
//           2. Wait for settlement
// @tc.expect: The scope is cancelled and the owner retains no observer
// @tc.type: FUNC
// @tc.require: NA
#[tokio::test]
async fn ut_lifecycle_trigger_during_subscribe() {
    let owner = ReplayOwner::new(LifecycleEvent::Destroy);
    let task = scope_bound_to(owner.clone(), Dispatcher::current(), |ctx| async move {
        ctx.cancelled().await;
        Err(ScopeError::Cancelled)
    });
    assert_eq!(wait_settled(&task).await, ScopeState::Cancelled);
    assert_eq!(owner.retained(), 0);
}

// @tc.name: ut_lifecycle_late_owner
// @tc.desc: Test binding through an owner attached after launch
// @tc.precon: NA
// @tc.step: 1. Bind a scope to a LateLifecycleOwner
//           2. Attach the real owner, then destroy it
// @tc.expect: The subscription is forwarded and the scope is cancelled
// @tc.type: FUNC
// @tc.require: NA
#[tokio::test]
async fn ut_lifecycle_late_owner() {
    let late = Arc::new(LateLifecycleOwner::new());
    let task = scope_bound_to(late.clone(), Dispatcher::current(), |ctx| async move {
        ctx.cancelled().await;
        Err(ScopeError::Cancelled)
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(task.state(), ScopeState::Running);

    let owner = Arc::new(LifecycleRegistrar::new());
    late.attach(owner.clone());
    assert!(late.is_attached());

    owner.notify(LifecycleEvent::Destroy);
    assert_eq!(wait_settled(&task).await, ScopeState::Cancelled);
}
