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

//! Task scopes and their state machine.
//!
//! A scope wraps one unit of asynchronous work. It starts in `Created`,
//! moves to `Running` when launched, and settles exactly once into
//! `Completed`, `Failed` or `Cancelled`. Business failures are routed to
//! the scope's error handler instead of propagating to the host; an error
//! that arrives after the scope was already cancelled is discarded.
//!
//! Calls bound to a scope through [`ScopeContext::bind_call`] are cancelled
//! with it, alongside the cooperative cancellation signal the body itself
//! observes.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, Weak};

use scope_utils::observe::lifecycle::{LifecycleEvent, LifecycleOwner};
use tokio_util::sync::CancellationToken;

use crate::call::CallHandle;
use crate::config;
use crate::lifecycle::LifecycleBinding;

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;
const FAILED: u8 = 3;
const CANCELLED: u8 = 4;

/// Observable state of a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeState {
    Created,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ScopeState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            CREATED => ScopeState::Created,
            RUNNING => ScopeState::Running,
            COMPLETED => ScopeState::Completed,
            FAILED => ScopeState::Failed,
            _ => ScopeState::Cancelled,
        }
    }

    /// Returns whether the scope has settled into a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ScopeState::Completed | ScopeState::Failed | ScopeState::Cancelled
        )
    }
}

/// A failure produced by the work a scope runs.
///
/// Carries a human-readable message, an optional domain error code, and an
/// optional underlying cause.
pub struct BusinessError {
    code: Option<i32>,
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl BusinessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            source: None,
        }
    }

    pub fn from_source(source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            code: None,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the domain error code, 0 when none was set.
    pub fn code(&self) -> i32 {
        self.code.unwrap_or(0)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Debug for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusinessError")
            .field("code", &self.code)
            .field("message", &self.message)
            .finish()
    }
}

impl Error for BusinessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn Error + 'static))
    }
}

/// Why a scope body stopped early.
#[derive(Debug)]
pub enum ScopeError {
    /// The scope was cancelled, cooperatively observed by the body.
    Cancelled,
    /// The work itself failed.
    Business(BusinessError),
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::Cancelled => write!(f, "scope cancelled"),
            ScopeError::Business(e) => write!(f, "{}", e),
        }
    }
}

impl Error for ScopeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScopeError::Cancelled => None,
            ScopeError::Business(e) => Some(e),
        }
    }
}

impl From<BusinessError> for ScopeError {
    fn from(e: BusinessError) -> Self {
        ScopeError::Business(e)
    }
}

/// Receives business failures a scope catches.
///
/// Called at most once per scope, never for cancellation.
pub trait ErrorHandler: Send + Sync {
    fn on_error(&self, error: &BusinessError);
}

/// Default handler: surfaces the failure through the debug sink.
struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn on_error(&self, error: &BusinessError) {
        config::debug_error(error);
    }
}

/// Executor seam for launching scope bodies.
///
/// Wraps a runtime handle so scopes can be launched from any thread that
/// can name a runtime, not only from inside one.
#[derive(Clone)]
pub struct Dispatcher {
    handle: tokio::runtime::Handle,
}

impl Dispatcher {
    /// Captures the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics outside a runtime, as
    /// [`Handle::current`](tokio::runtime::Handle::current) does.
    pub fn current() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }

    pub(crate) fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(future);
    }
}

impl From<tokio::runtime::Handle> for Dispatcher {
    fn from(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }
}

/// Shared core of a scope, reachable from the handle, the context inside
/// the body, and a lifecycle binding.
pub(crate) struct ScopeInner {
    state: AtomicU8,
    token: CancellationToken,
    error_handler: Arc<dyn ErrorHandler>,
    owned_calls: Mutex<Vec<Weak<dyn CallHandle>>>,
    binding: Mutex<Option<Arc<LifecycleBinding>>>,
}

impl ScopeInner {
    fn new(error_handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            state: AtomicU8::new(CREATED),
            token: CancellationToken::new(),
            error_handler,
            owned_calls: Mutex::new(Vec::new()),
            binding: Mutex::new(None),
        }
    }

    fn state(&self) -> ScopeState {
        ScopeState::from_raw(self.state.load(Ordering::SeqCst))
    }

    /// Moves to `to` if the current state is in `from`. Exactly one caller
    /// wins a contended transition.
    fn transition(&self, from: &[u8], to: u8) -> bool {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                from.contains(&current).then_some(to)
            })
            .is_ok()
    }

    /// Cancels the scope. Idempotent; loses to an earlier terminal state.
    pub(crate) fn cancel(self: &Arc<Self>) {
        if !self.transition(&[CREATED, RUNNING], CANCELLED) {
            return;
        }
        self.token.cancel();
        let owned = std::mem::take(&mut *self.owned_calls.lock().unwrap());
        for call in owned.iter().filter_map(Weak::upgrade) {
            call.cancel();
        }
        self.detach_binding();
        config::debug("scope cancelled");
    }

    /// Settles the scope with the body's outcome. Runs on the scope task
    /// after the body returns or loses the cancellation race.
    fn settle(self: &Arc<Self>, result: Result<(), ScopeError>) {
        match result {
            Ok(()) => {
                if self.transition(&[RUNNING], COMPLETED) {
                    self.detach_binding();
                }
            }
            Err(ScopeError::Cancelled) => self.cancel(),
            Err(ScopeError::Business(error)) => {
                if self.transition(&[RUNNING], FAILED) {
                    self.detach_binding();
                    self.error_handler.on_error(&error);
                } else {
                    // Already cancelled; the owner no longer listens.
                    config::debug_error(&error);
                }
            }
        }
    }

    fn attach_binding(&self, binding: Arc<LifecycleBinding>) {
        *self.binding.lock().unwrap() = Some(binding);
    }

    fn detach_binding(&self) {
        let binding = self.binding.lock().unwrap().take();
        if let Some(binding) = binding {
            binding.detach();
        }
    }
}

/// Handle to a launched scope.
///
/// Cloning shares the same scope; dropping every handle does not cancel
/// the work.
#[derive(Clone)]
pub struct TaskScope {
    inner: Arc<ScopeInner>,
}

impl TaskScope {
    /// Cancels the scope: signals the body, cancels bound calls, and
    /// releases any lifecycle binding. Idempotent, and a no-op once the
    /// scope has settled.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn state(&self) -> ScopeState {
        self.inner.state()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state().is_terminal()
    }
}

/// The body's view of its own scope.
#[derive(Clone)]
pub struct ScopeContext {
    inner: Arc<ScopeInner>,
    dispatcher: Dispatcher,
}

impl ScopeContext {
    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Resolves when cancellation is requested. Bodies race long waits
    /// against this to stay cooperative.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await;
    }

    /// Ties a call's life to this scope: cancelling the scope cancels the
    /// call. The scope holds only a non-owning reference.
    ///
    /// A call bound to an already-cancelled scope is cancelled on the spot.
    pub fn bind_call(&self, handle: &Arc<dyn CallHandle>) {
        if self.inner.token.is_cancelled() {
            handle.cancel();
            return;
        }
        self.inner
            .owned_calls
            .lock()
            .unwrap()
            .push(Arc::downgrade(handle));
        // Recheck: a cancel sweep may have drained the list between the
        // check above and the insert.
        if self.inner.token.is_cancelled() {
            handle.cancel();
        }
    }

    /// Returns the dispatcher the scope runs on, for launching sibling
    /// scopes.
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }
}

/// Configures and launches a [`TaskScope`].
pub struct TaskScopeBuilder {
    dispatcher: Dispatcher,
    error_handler: Arc<dyn ErrorHandler>,
    bound_to: Option<(Arc<dyn LifecycleOwner>, LifecycleEvent)>,
}

impl TaskScopeBuilder {
    /// Starts a builder targeting `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            error_handler: Arc::new(LogErrorHandler),
            bound_to: None,
        }
    }

    /// Replaces the default logging error handler.
    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    /// Cancels the scope when `owner` emits `event`. The default trigger
    /// for owner teardown is [`LifecycleEvent::Destroy`].
    pub fn bound_to(mut self, owner: Arc<dyn LifecycleOwner>, event: LifecycleEvent) -> Self {
        self.bound_to = Some((owner, event));
        self
    }

    /// Launches `body` and returns a handle to the running scope.
    ///
    /// The lifecycle binding, when configured, is subscribed before the
    /// body is spawned, so an owner destroyed during launch still cancels
    /// the scope.
    pub fn launch<F, Fut>(self, body: F) -> TaskScope
    where
        F: FnOnce(ScopeContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ScopeError>> + Send + 'static,
    {
        let inner = Arc::new(ScopeInner::new(self.error_handler));
        inner.state.store(RUNNING, Ordering::SeqCst);

        if let Some((owner, event)) = self.bound_to {
            let binding = LifecycleBinding::bind(Arc::downgrade(&inner), owner, event);
            inner.attach_binding(binding);
        }

        let context = ScopeContext {
            inner: inner.clone(),
            dispatcher: self.dispatcher.clone(),
        };
        let task_inner = inner.clone();
        self.dispatcher.spawn(async move {
            let token = task_inner.token.clone();
            let result = tokio::select! {
                _ = token.cancelled() => Err(ScopeError::Cancelled),
                result = body(context) => result,
            };
            task_inner.settle(result);
        });

        TaskScope { inner }
    }
}

/// Launches an unbound scope on `dispatcher`.
pub fn scope<F, Fut>(dispatcher: Dispatcher, body: F) -> TaskScope
where
    F: FnOnce(ScopeContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ScopeError>> + Send + 'static,
{
    TaskScopeBuilder::new(dispatcher).launch(body)
}

/// Launches a scope cancelled when `owner` is destroyed.
pub fn scope_bound_to<F, Fut>(
    owner: Arc<dyn LifecycleOwner>,
    dispatcher: Dispatcher,
    body: F,
) -> TaskScope
where
    F: FnOnce(ScopeContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ScopeError>> + Send + 'static,
{
    TaskScopeBuilder::new(dispatcher)
        .bound_to(owner, LifecycleEvent::Destroy)
        .launch(body)
}
