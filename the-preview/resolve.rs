//! Reacting to completion item changes: pick the documentation to show,
//! fetch it when it is not inline, and keep at most one fetch in flight.
//!
//! Every transition first cancels the in-flight fetch and closes the open
//! overlays, synchronously, before anything can yield. A fetch result only
//! becomes an overlay if it arrives while its generation is still current.

use std::{
  sync::Arc,
  time::{
    Duration,
    Instant,
  },
};

use async_trait::async_trait;
use serde_json::Value;
use the_preview_event::{
  TaskController,
  cancelable_future,
};
use tokio::sync::mpsc::{
  UnboundedReceiver,
  UnboundedSender,
  unbounded_channel,
};

use crate::{
  config::PreviewConfig,
  document::{
    ContentBlock,
    Context,
    Doc,
  },
  error::{
    PreviewError,
    ResolveError,
  },
  event::{
    ExternalRef,
    ItemChangedEvent,
  },
  geometry::{
    self,
    PopupRect,
  },
  overlay::{
    OverlayManager,
    PreviewHost,
    SurfaceId,
  },
};

/// Keys that dismiss the completion menu without leaving the popup state,
/// returned to the host after a promotion (Ctrl-E).
pub const DISMISS_MENU: &str = "\u{5}";

/// Source of documentation that is not available inline, e.g. a language
/// server's `completionItem/resolve`.
#[async_trait]
pub trait DocResolver: Send + Sync {
  async fn resolve(&self, reference: &ExternalRef) -> Result<Option<Doc>, ResolveError>;
}

/// Outcome of a finished fetch, delivered back to the state machine.
#[derive(Debug)]
pub struct Resolution {
  generation: u64,
  popup:      PopupRect,
  /// Buffer context as it was when the item changed.
  context:    Context,
  doc:        Doc,
}

impl Resolution {
  pub fn doc(&self) -> &Doc {
    &self.doc
  }
}

pub struct Previewer<H> {
  config:          PreviewConfig,
  host:            H,
  resolver:        Arc<dyn DocResolver>,
  overlays:        OverlayManager,
  task_controller: TaskController,
  /// Bumped on every cancellation; results from older generations are stale.
  generation:      u64,
  resolution_tx:   UnboundedSender<Resolution>,
  resolution_rx:   Option<UnboundedReceiver<Resolution>>,
}

impl<H: PreviewHost> Previewer<H> {
  pub fn new(config: PreviewConfig, host: H, resolver: Arc<dyn DocResolver>) -> Self {
    let (resolution_tx, resolution_rx) = unbounded_channel();
    Self {
      config,
      host,
      resolver,
      overlays: OverlayManager::new(),
      task_controller: TaskController::new(),
      generation: 0,
      resolution_tx,
      resolution_rx: Some(resolution_rx),
    }
  }

  pub fn config(&self) -> &PreviewConfig {
    &self.config
  }

  pub fn host(&self) -> &H {
    &self.host
  }

  pub fn host_mut(&mut self) -> &mut H {
    &mut self.host
  }

  pub fn overlays(&self) -> &OverlayManager {
    &self.overlays
  }

  /// Whether a fetch is still racing its timeout.
  pub fn is_resolving(&self) -> bool {
    self.task_controller.is_running()
  }

  pub(crate) fn take_resolutions(&mut self) -> Option<UnboundedReceiver<Resolution>> {
    self.resolution_rx.take()
  }

  /// Wait for the next finished fetch. Returns `None` once the receiver has
  /// been handed to the service loop.
  pub async fn next_resolution(&mut self) -> Option<Resolution> {
    self.resolution_rx.as_mut()?.recv().await
  }

  /// The selected completion item changed. `payload` is the raw event from the
  /// editor; anything that does not decode is treated as nothing to preview.
  pub fn item_changed(&mut self, payload: &Value) -> Result<(), PreviewError> {
    let started = Instant::now();
    self.reset()?;
    let result = self.preview(payload);
    log::trace!("preview handled in {:?}", started.elapsed());
    result
  }

  /// The completion was accepted or insert mode was left.
  pub fn item_done(&mut self) -> Result<(), PreviewError> {
    self.reset()
  }

  /// Show the result of a fetch unless it was superseded.
  pub fn resolved(&mut self, resolution: Resolution) -> Result<(), PreviewError> {
    if resolution.generation != self.generation {
      log::debug!(
        "discarding stale resolution (generation {} < {})",
        resolution.generation,
        self.generation
      );
      return Ok(());
    }
    self
      .show(&resolution.popup, &resolution.context, resolution.doc)
      .map(drop)
  }

  /// Move the current overlay's content into the persistent preview window.
  /// Returns the keys the host should feed back to stay in the menu.
  pub fn promote(&mut self) -> Result<&'static str, PreviewError> {
    let Some(surface) = self.overlays.most_recent(&self.host)? else {
      return Ok(DISMISS_MENU);
    };
    if let Some(content) = self.host.overlay_content(surface)? {
      self.host.stop_insert()?;
      self.host.enter_full_preview(&content)?;
    }
    Ok(DISMISS_MENU)
  }

  fn cancel(&mut self) {
    self.task_controller.cancel();
    self.generation = self.generation.wrapping_add(1);
  }

  fn reset(&mut self) -> Result<(), PreviewError> {
    self.cancel();
    self.overlays.close_all(&mut self.host)?;
    Ok(())
  }

  fn preview(&mut self, payload: &Value) -> Result<(), PreviewError> {
    if !self.config.enabled {
      return Ok(());
    }
    let event = match ItemChangedEvent::decode(payload) {
      Ok(event) => event,
      Err(err) => {
        log::debug!("{err}");
        return Ok(());
      },
    };
    let popup = event.popup();
    let Some(data) = event.completed_item.user_data else {
      return Ok(());
    };
    let context = self.host.context();

    match (data.doc, data.external) {
      (Some(doc), _) if !doc.text.is_empty() => self.show(&popup, &context, doc).map(drop),
      (fallback, Some(reference)) => {
        self.start_resolution(popup, context, reference, fallback);
        Ok(())
      },
      (_, None) => Ok(()),
    }
  }

  fn start_resolution(
    &mut self,
    popup: PopupRect,
    context: Context,
    reference: ExternalRef,
    fallback: Option<Doc>,
  ) {
    let handle = self.task_controller.restart();
    let generation = self.generation;
    let resolver = self.resolver.clone();
    let timeout = self.config.resolve_timeout();
    let tx = self.resolution_tx.clone();

    tokio::spawn(async move {
      let race = fetch_race(resolver, reference, fallback, timeout);
      let Some(Some(doc)) = cancelable_future(race, handle).await else {
        return;
      };
      let _ = tx.send(Resolution {
        generation,
        popup,
        context,
        doc,
      });
    });
  }

  fn show(
    &mut self,
    popup: &PopupRect,
    context: &Context,
    doc: Doc,
  ) -> Result<SurfaceId, PreviewError> {
    let content = ContentBlock::new(context, doc);
    let mut size = content.measure();
    if let Some(max_width) = self.config.max_width {
      size.width = size.width.min(max_width);
    }
    let placement = geometry::solve(self.host.screen(), popup, self.config.margin, size);
    let surface = self
      .overlays
      .create(&mut self.host, &placement.candidate, &content)?;
    log::debug!("preview {surface} placed {:?}", placement.direction);
    Ok(surface)
  }
}

/// Race the resolver against `timeout`. A resolver that finishes in time wins
/// even when it has nothing; a failure or timeout falls back to the inline doc.
async fn fetch_race(
  resolver: Arc<dyn DocResolver>,
  reference: ExternalRef,
  fallback: Option<Doc>,
  timeout: Duration,
) -> Option<Doc> {
  match tokio::time::timeout(timeout, resolver.resolve(&reference)).await {
    Ok(Ok(doc)) => doc,
    Ok(Err(err)) => {
      log::warn!("{err}");
      fallback
    },
    Err(_) => {
      log::debug!("resolver timed out after {timeout:?}");
      fallback
    },
  }
}
