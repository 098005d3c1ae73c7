use std::{
  fs,
  path::Path,
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PreviewConfig {
  /// Show previews at all. Item changes still close stale overlays when off.
  pub enabled:         bool,
  /// Cells kept free between the overlay and the screen or popup edges.
  pub margin:          i32,
  /// How long to wait for a resolver before falling back to inline docs, in
  /// milliseconds.
  pub resolve_timeout: u64,
  /// Upper bound on the overlay width.
  pub max_width:       Option<usize>,
}

impl Default for PreviewConfig {
  fn default() -> Self {
    Self {
      enabled:         true,
      margin:          0,
      resolve_timeout: 500,
      max_width:       None,
    }
  }
}

impl PreviewConfig {
  pub fn resolve_timeout(&self) -> Duration {
    Duration::from_millis(self.resolve_timeout)
  }

  pub fn load(text: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| {
      ConfigError::Io {
        path: path.to_path_buf(),
        source,
      }
    })?;
    Self::load(&text)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.margin < 0 {
      return Err(ConfigError::Invalid(format!(
        "margin must not be negative, got {}",
        self.margin
      )));
    }
    if self.resolve_timeout == 0 {
      return Err(ConfigError::Invalid(
        "resolve-timeout must be at least 1ms".into(),
      ));
    }
    if self.max_width == Some(0) {
      return Err(ConfigError::Invalid("max-width must be at least 1".into()));
    }
    Ok(())
  }
}
