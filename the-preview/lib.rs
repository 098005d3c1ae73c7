//! Documentation preview for the completion popup.
//!
//! While the user moves through completion items, [`Previewer`] keeps a
//! floating overlay next to the popup showing the selected item's
//! documentation. Documentation that is not inline is fetched through a
//! [`DocResolver`] under a timeout, and every new selection cancels the
//! previous fetch before it can render.

pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod geometry;
pub mod overlay;
pub mod resolve;
pub mod service;

pub use config::PreviewConfig;
pub use document::{
  ContentBlock,
  Context,
  Doc,
};
pub use error::{
  ConfigError,
  DecodeError,
  HostError,
  PreviewError,
  ResolveError,
};
pub use event::{
  ExternalRef,
  ItemChangedEvent,
};
pub use geometry::{
  Candidate,
  Direction,
  Placement,
  PopupRect,
  Screen,
};
pub use overlay::{
  OverlayManager,
  PreviewHost,
  SurfaceId,
};
pub use resolve::{
  DISMISS_MENU,
  DocResolver,
  Previewer,
  Resolution,
};
pub use service::{
  PreviewEvent,
  PreviewHandle,
};
