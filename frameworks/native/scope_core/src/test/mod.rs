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

//! Testing utilities.
//!
//! In-memory stand-ins for the transport collaborator, usable by this
//! crate's unit tests and by embedders testing against the registry.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::call::{CallHandle, TransportDispatcher};
use crate::progress::{ProgressListener, ProgressListeners};
use crate::tag::CallTag;

/// A call handle that records cancellation instead of touching a socket.
pub struct TestCall {
    tag: CallTag,
    cancelled: AtomicBool,
    cancel_count: AtomicUsize,
    upload_listeners: ProgressListeners,
    download_listeners: ProgressListeners,
}

impl TestCall {
    pub fn new(tag: CallTag) -> Arc<Self> {
        Arc::new(Self {
            tag,
            cancelled: AtomicBool::new(false),
            cancel_count: AtomicUsize::new(0),
            upload_listeners: ProgressListeners::new(),
            download_listeners: ProgressListeners::new(),
        })
    }

    /// How many times `cancel` was invoked, idempotent or not.
    pub fn cancel_count(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }
}

impl CallHandle for TestCall {
    fn cancel(&self) {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn tag(&self) -> &CallTag {
        &self.tag
    }

    fn upload_listeners(&self) -> &ProgressListeners {
        &self.upload_listeners
    }

    fn download_listeners(&self) -> &ProgressListeners {
        &self.download_listeners
    }
}

/// A transport dispatcher that counts full sweeps.
pub struct TestTransport {
    cancel_all_count: AtomicUsize,
}

impl TestTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cancel_all_count: AtomicUsize::new(0),
        })
    }

    pub fn cancel_all_count(&self) -> usize {
        self.cancel_all_count.load(Ordering::SeqCst)
    }
}

impl TransportDispatcher for TestTransport {
    fn cancel_all(&self) {
        self.cancel_all_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A progress listener that keeps every event it receives.
pub struct RecordingListener {
    events: Mutex<Vec<(u64, u64)>>,
    last_total: AtomicU64,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            last_total: AtomicU64::new(0),
        })
    }

    pub fn events(&self) -> Vec<(u64, u64)> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn last_total(&self) -> u64 {
        self.last_total.load(Ordering::SeqCst)
    }
}

impl ProgressListener for RecordingListener {
    fn on_progress(&self, progress: u64, total: u64) {
        self.events.lock().unwrap().push((progress, total));
        self.last_total.store(total, Ordering::SeqCst);
    }
}
