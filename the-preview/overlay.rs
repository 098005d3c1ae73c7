//! Overlay surfaces owned by the preview engine.
//!
//! The host may have other floating surfaces open; only surfaces tagged with
//! this engine's marker are ever enumerated or closed.

use std::fmt;

use crate::{
  document::{
    ContentBlock,
    Context,
  },
  error::HostError,
  geometry::{
    Candidate,
    Screen,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// UI primitives the engine drives. Implemented by the editor bridge.
pub trait PreviewHost {
  fn screen(&self) -> Screen;

  fn context(&self) -> Context;

  /// Open a non-focused surface at `candidate` showing `content`, tagged with
  /// `marker` and with soft wrapping enabled.
  fn create_overlay(
    &mut self,
    candidate: &Candidate,
    content: &ContentBlock,
    marker: &str,
  ) -> Result<SurfaceId, HostError>;

  /// Close a surface. A surface that is already gone is reported as
  /// [`HostError::SurfaceGone`].
  fn close_overlay(&mut self, surface: SurfaceId) -> Result<(), HostError>;

  fn list_tagged(&self, marker: &str) -> Result<Vec<SurfaceId>, HostError>;

  /// Read back what a surface currently shows.
  fn overlay_content(&self, surface: SurfaceId) -> Result<Option<ContentBlock>, HostError>;

  /// Leave insert mode.
  fn stop_insert(&mut self) -> Result<(), HostError>;

  /// Show `content` in the persistent preview window.
  fn enter_full_preview(&mut self, content: &ContentBlock) -> Result<(), HostError>;
}

#[derive(Debug)]
pub struct OverlayManager {
  marker: String,
  last:   Option<SurfaceId>,
}

impl Default for OverlayManager {
  fn default() -> Self {
    Self::new()
  }
}

impl OverlayManager {
  pub fn new() -> Self {
    Self::with_marker(format!(
      "preview_{}",
      uuid::Uuid::new_v4().simple()
    ))
  }

  pub fn with_marker(marker: impl Into<String>) -> Self {
    Self {
      marker: marker.into(),
      last:   None,
    }
  }

  pub fn marker(&self) -> &str {
    &self.marker
  }

  pub fn list_owned<H: PreviewHost + ?Sized>(&self, host: &H) -> Result<Vec<SurfaceId>, HostError> {
    host.list_tagged(&self.marker)
  }

  /// Close every owned surface, skipping ones that disappeared in the
  /// meantime. Returns how many were actually closed.
  pub fn close_all<H: PreviewHost + ?Sized>(&mut self, host: &mut H) -> Result<usize, HostError> {
    let mut closed = 0;
    for surface in self.list_owned(host)? {
      match host.close_overlay(surface) {
        Ok(()) => closed += 1,
        Err(HostError::SurfaceGone(_)) => {
          log::debug!("overlay {surface} already closed");
        },
        Err(err) => return Err(err),
      }
    }
    self.last = None;
    Ok(closed)
  }

  pub fn create<H: PreviewHost + ?Sized>(
    &mut self,
    host: &mut H,
    candidate: &Candidate,
    content: &ContentBlock,
  ) -> Result<SurfaceId, HostError> {
    let surface = host.create_overlay(candidate, content, &self.marker)?;
    self.last = Some(surface);
    Ok(surface)
  }

  /// The most recently created overlay if it is still open, otherwise any
  /// owned overlay the host still lists.
  pub fn most_recent<H: PreviewHost + ?Sized>(
    &self,
    host: &H,
  ) -> Result<Option<SurfaceId>, HostError> {
    let owned = self.list_owned(host)?;
    let recent = self
      .last
      .filter(|last| owned.contains(last))
      .or_else(|| owned.first().copied());
    Ok(recent)
  }
}
