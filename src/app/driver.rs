// SPDX-License-Identifier: GPL-3.0-only

//! Event loop plumbing
//!
//! Feeds messages to the controller and runs the tasks it returns on the
//! current tokio runtime. Completions come back one at a time, so the
//! controller is only ever touched from the loop that owns the driver.

use super::{Controller, Message};
use tokio::task::JoinSet;
use tracing::error;

pub struct Driver {
    controller: Controller,
    tasks: JoinSet<Message>,
}

impl Driver {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            tasks: JoinSet::new(),
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Tasks spawned and not yet applied
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Apply a message and start its follow-up work
    ///
    /// Must be called within a tokio runtime context.
    pub fn dispatch(&mut self, message: Message) {
        let task = self.controller.update(message);
        if let Some(future) = task.into_future() {
            self.tasks.spawn(future);
        }
    }

    /// Apply every completion that is already available. Never blocks.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Some(joined) = self.tasks.try_join_next() {
            if let Some(message) = Self::unwrap_join(joined) {
                self.dispatch(message);
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next completion and apply it
    ///
    /// Returns `false` when nothing is in flight.
    pub async fn next(&mut self) -> bool {
        match self.tasks.join_next().await {
            Some(joined) => {
                if let Some(message) = Self::unwrap_join(joined) {
                    self.dispatch(message);
                }
                true
            }
            None => false,
        }
    }

    /// Apply completions until no work is left
    pub async fn settle(&mut self) {
        while self.next().await {}
    }

    fn unwrap_join(joined: Result<Message, tokio::task::JoinError>) -> Option<Message> {
        match joined {
            Ok(message) => Some(message),
            Err(e) => {
                error!(error = %e, "Controller task failed");
                None
            }
        }
    }
}
