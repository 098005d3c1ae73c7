//! The task that owns a [`Previewer`] and feeds it events in delivery order.
//!
//! Host callbacks push [`PreviewEvent`]s through a [`PreviewHandle`]; finished
//! fetches come back on the previewer's own channel. Both are handled on the
//! same task, so the state machine never sees concurrent mutation.

use serde_json::Value;
use the_preview_event::send_blocking;
use tokio::{
  runtime::Handle,
  sync::{
    mpsc,
    oneshot,
  },
  task::JoinHandle,
};

use crate::{
  error::PreviewError,
  overlay::PreviewHost,
  resolve::{
    DISMISS_MENU,
    Previewer,
  },
};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum PreviewEvent {
  /// Raw payload of the editor's item-changed event.
  ItemChanged(Value),
  /// Completion accepted or insert mode left.
  ItemDone,
  /// Move the overlay into the persistent preview window. The reply carries
  /// the keys the host should feed back.
  Promote(oneshot::Sender<&'static str>),
}

/// Cloneable sender side of a running preview service.
#[derive(Debug, Clone)]
pub struct PreviewHandle {
  tx:      mpsc::Sender<PreviewEvent>,
  /// Runtime the service runs on, entered by the blocking sends so that they
  /// can wait on a full channel from any thread.
  runtime: Handle,
}

impl PreviewHandle {
  pub fn sender(&self) -> &mpsc::Sender<PreviewEvent> {
    &self.tx
  }

  /// For synchronous host callbacks. Returns whether the event was queued.
  pub fn item_changed(&self, payload: Value) -> bool {
    self.send(PreviewEvent::ItemChanged(payload))
  }

  pub fn item_done(&self) -> bool {
    self.send(PreviewEvent::ItemDone)
  }

  fn send(&self, event: PreviewEvent) -> bool {
    let _guard = self.runtime.enter();
    send_blocking(&self.tx, event)
  }

  pub async fn promote(&self) -> &'static str {
    let (reply, rx) = oneshot::channel();
    if self.tx.send(PreviewEvent::Promote(reply)).await.is_err() {
      return DISMISS_MENU;
    }
    rx.await.unwrap_or(DISMISS_MENU)
  }

  /// Like [`promote`](Self::promote), for threads outside the runtime.
  pub fn promote_blocking(&self) -> &'static str {
    let (reply, rx) = oneshot::channel();
    if self.tx.blocking_send(PreviewEvent::Promote(reply)).is_err() {
      return DISMISS_MENU;
    }
    rx.blocking_recv().unwrap_or(DISMISS_MENU)
  }
}

impl<H: PreviewHost + Send + 'static> Previewer<H> {
  /// Run the previewer on its own task. The task ends, handing the previewer
  /// back, once every [`PreviewHandle`] is dropped.
  pub fn spawn(self) -> (PreviewHandle, JoinHandle<Self>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::spawn(run(self, rx));
    let runtime = Handle::current();
    (PreviewHandle { tx, runtime }, task)
  }
}

impl<H: PreviewHost> Previewer<H> {
  pub fn handle_event(&mut self, event: PreviewEvent) -> Result<(), PreviewError> {
    match event {
      PreviewEvent::ItemChanged(payload) => self.item_changed(&payload),
      PreviewEvent::ItemDone => self.item_done(),
      PreviewEvent::Promote(reply) => {
        let result = self.promote();
        let _ = reply.send(DISMISS_MENU);
        result.map(drop)
      },
    }
  }
}

async fn run<H: PreviewHost>(
  mut previewer: Previewer<H>,
  mut events: mpsc::Receiver<PreviewEvent>,
) -> Previewer<H> {
  let Some(mut resolutions) = previewer.take_resolutions() else {
    log::error!("preview service started twice");
    return previewer;
  };

  loop {
    let result = tokio::select! {
      biased;
      event = events.recv() => match event {
        Some(event) => previewer.handle_event(event),
        None => break,
      },
      Some(resolution) = resolutions.recv() => previewer.resolved(resolution),
    };
    if let Err(err) = result {
      log::error!("preview failed: {err}");
    }
  }

  // nothing can consume a result anymore
  if let Err(err) = previewer.item_done() {
    log::error!("failed to close previews on shutdown: {err}");
  }
  previewer
}
