//! Event plumbing shared by the preview engine: cooperative task cancellation
//! and non-freezing producers for host callbacks.

mod cancel;
mod send;

pub use cancel::{
  TaskController,
  TaskHandle,
  cancelable_future,
};
pub use send::{
  send_blocking,
  try_send,
};
