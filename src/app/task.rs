// SPDX-License-Identifier: GPL-3.0-only

//! Deferred work returned from `update`

use futures::FutureExt;
use futures::future::BoxFuture;

/// Asynchronous work whose outcome is fed back as a message
///
/// `update` never awaits; it hands the future to whoever drives the loop.
#[must_use = "tasks do nothing unless they are run"]
pub struct Task<M> {
    future: Option<BoxFuture<'static, M>>,
}

impl<M> Task<M> {
    /// No follow-up work
    pub fn none() -> Self {
        Self { future: None }
    }

    /// Run a future and map its output to a message
    pub fn perform<T, F>(future: F, map: impl FnOnce(T) -> M + Send + 'static) -> Self
    where
        F: std::future::Future<Output = T> + Send + 'static,
        M: 'static,
    {
        Self {
            future: Some(future.map(map).boxed()),
        }
    }

    pub fn is_none(&self) -> bool {
        self.future.is_none()
    }

    pub fn into_future(self) -> Option<BoxFuture<'static, M>> {
        self.future
    }
}

impl<M> std::fmt::Debug for Task<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.future.is_some() {
            write!(f, "Task(pending)")
        } else {
            write!(f, "Task(none)")
        }
    }
}
