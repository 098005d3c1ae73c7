use std::{
  io,
  path::PathBuf,
};

use thiserror::Error;

use crate::overlay::SurfaceId;

/// Failure reported by the host while manipulating overlay surfaces.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
  /// The surface was already closed, by the user or by the host.
  #[error("surface {0} no longer exists")]
  SurfaceGone(SurfaceId),
  #[error("host rejected request: {0}")]
  Rejected(String),
}

#[derive(Debug, Error)]
pub enum PreviewError {
  #[error(transparent)]
  Host(#[from] HostError),
}

/// Failure of the documentation resolver. Never fatal: the preview falls back
/// to the inline documentation instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to resolve documentation: {0}")]
pub struct ResolveError(pub String);

#[derive(Debug, Error)]
#[error("invalid completion event: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("failed to parse preview config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("invalid preview config: {0}")]
  Invalid(String),
}
