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

//! Contracts consumed from the transport collaborator.
//!
//! The engine never touches sockets; it sees one outbound operation as an
//! opaque handle that can be cancelled and inspected. Handles register
//! themselves in the [`CallRegistry`](crate::registry::CallRegistry) when
//! they start and deregister when they complete.

use crate::progress::ProgressListeners;
use crate::tag::CallTag;

/// One in-flight outbound operation, owned by the transport.
///
/// The engine holds only non-owning references to handles, so a handle may
/// be gone by the time a registry sweep reaches it; that is not an error.
pub trait CallHandle: Send + Sync {
    /// Cancels the operation. Idempotent; cancelling a completed call is a
    /// no-op.
    fn cancel(&self);

    /// Returns whether the operation has been cancelled.
    fn is_cancelled(&self) -> bool;

    /// Returns the lookup tag attached when the request was built.
    fn tag(&self) -> &CallTag;

    /// Returns the mutable set of upload progress listeners.
    fn upload_listeners(&self) -> &ProgressListeners;

    /// Returns the mutable set of download progress listeners.
    fn download_listeners(&self) -> &ProgressListeners;
}

/// The transport's own global dispatcher.
///
/// Work the transport has queued but not yet started never reaches the
/// registry; a full cancellation sweep forwards to this as a fallback.
pub trait TransportDispatcher: Send + Sync {
    /// Cancels everything the transport still tracks independently.
    fn cancel_all(&self);
}
