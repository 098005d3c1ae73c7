//! Cooperative cancellation for the single in-flight task of a handler.
//!
//! A [`TaskController`] owns at most one live [`TaskHandle`]. Restarting the
//! controller cancels the previous handle before handing out a new one, so a
//! handler that always goes through [`TaskController::restart`] can never have
//! two tasks racing to publish a result.

use std::{
  borrow::Borrow,
  future::Future,
  sync::{
    Arc,
    atomic::{
      AtomicBool,
      Ordering,
    },
  },
};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Shared {
  canceled: AtomicBool,
  notify:   Notify,
}

impl Shared {
  fn cancel(&self) {
    self.canceled.store(true, Ordering::Release);
    self.notify.notify_waiters();
  }
}

/// Run `future` until it finishes or `cancel` is canceled, whichever comes
/// first. A canceled future is dropped and `None` is returned.
pub async fn cancelable_future<T>(
  future: impl Future<Output = T>,
  cancel: impl Borrow<TaskHandle>,
) -> Option<T> {
  tokio::select! {
    biased;
    _ = cancel.borrow().canceled() => None,
    res = future => Some(res),
  }
}

/// Owner side of the cancellation pair. Dropping the controller cancels the
/// current task.
#[derive(Debug, Default)]
pub struct TaskController {
  current: Option<Arc<Shared>>,
}

impl TaskController {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cancel the current task, if any. Calling this with nothing in flight is a
  /// no-op.
  pub fn cancel(&mut self) {
    if let Some(shared) = self.current.take() {
      shared.cancel();
    }
  }

  /// Whether a handle handed out by the last [`restart`](Self::restart) is
  /// still alive, i.e. the task has neither finished nor been canceled.
  pub fn is_running(&self) -> bool {
    self
      .current
      .as_ref()
      .is_some_and(|shared| Arc::strong_count(shared) > 1)
  }

  /// Cancel the current task and return a handle for its replacement.
  pub fn restart(&mut self) -> TaskHandle {
    self.cancel();
    let shared = Arc::new(Shared::default());
    self.current = Some(shared.clone());
    TaskHandle { shared }
  }
}

impl Drop for TaskController {
  fn drop(&mut self) {
    self.cancel();
  }
}

/// Task side of the cancellation pair.
#[derive(Debug, Clone)]
pub struct TaskHandle {
  shared: Arc<Shared>,
}

impl TaskHandle {
  pub fn is_canceled(&self) -> bool {
    self.shared.canceled.load(Ordering::Acquire)
  }

  /// Resolves once the task is canceled.
  pub async fn canceled(&self) {
    loop {
      // register before checking the flag so a concurrent cancel is not lost
      let notified = self.shared.notify.notified();
      if self.is_canceled() {
        return;
      }
      notified.await;
    }
  }
}
