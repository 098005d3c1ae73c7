//! Synchronous producers for the engine's event channel

use std::time::Duration;

use futures_executor::block_on;
use tokio::{
  runtime::Handle,
  sync::mpsc::{
    Sender,
    error::TrySendError,
  },
};

/// Maximum time to block when sending to a full channel.
/// Keep this very short: the caller is usually a host callback and it is
/// better to drop an event than to freeze the editor.
const SEND_TIMEOUT_MS: u64 = 2;

/// Send an event to a channel, blocking only briefly if the channel is full.
///
/// - First attempts a non-blocking send (fast path)
/// - If the channel is full, blocks for at most `SEND_TIMEOUT_MS` milliseconds
/// - If still full after that, the event is dropped
///
/// The timed wait needs a tokio runtime context (see [`Handle::enter`]);
/// without one a full channel drops the event immediately.
///
/// Returns whether the event was delivered.
pub fn send_blocking<T>(tx: &Sender<T>, data: T) -> bool {
  match tx.try_send(data) {
    Ok(()) => true,
    Err(TrySendError::Full(_)) if Handle::try_current().is_err() => {
      log::warn!("Dropped event: channel full and no runtime to wait on");
      false
    },
    Err(TrySendError::Full(data)) => {
      let sent = block_on(tx.send_timeout(data, Duration::from_millis(SEND_TIMEOUT_MS))).is_ok();
      if !sent {
        log::warn!("Dropped event: channel stayed full for {SEND_TIMEOUT_MS}ms");
      }
      sent
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("Attempted to send to closed channel");
      false
    },
  }
}

/// Try to send an event without blocking at all.
/// Returns true if the event was sent, false if the channel was full or closed.
pub fn try_send<T>(tx: &Sender<T>, data: T) -> bool {
  tx.try_send(data).is_ok()
}
