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

/// An event in an external owner's lifecycle.
///
/// `Destroy` is the terminal event: a lifecycle stream delivers it at most
/// once per subscription and delivers nothing afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

impl LifecycleEvent {
    /// Returns `true` for the terminal event of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleEvent::Destroy)
    }
}

/// Receives lifecycle events from an owner's event stream.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: LifecycleEvent);
}
