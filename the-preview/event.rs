//! Typed views of the payloads the editor sends when the selected completion
//! item changes.

use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Value;

use crate::{
  document::Doc,
  error::DecodeError,
  geometry::PopupRect,
};

/// Opaque handle a [`DocResolver`](crate::DocResolver) turns into a [`Doc`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalRef(pub Value);

/// Preview data attached to a completion item by the completion source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserData {
  #[serde(default)]
  pub doc:      Option<Doc>,
  #[serde(default, rename = "extern")]
  pub external: Option<ExternalRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionItem {
  pub word:      String,
  #[serde(default)]
  pub abbr:      Option<String>,
  #[serde(default)]
  pub menu:      Option<String>,
  #[serde(default)]
  pub kind:      Option<String>,
  #[serde(default)]
  pub user_data: Option<UserData>,
}

/// The selected item together with the popup geometry at the time of the
/// change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemChangedEvent {
  pub completed_item: CompletionItem,
  pub row:            i32,
  pub col:            i32,
  pub height:         i32,
  pub width:          i32,
  pub size:           u32,
  pub scrollbar:      bool,
}

impl ItemChangedEvent {
  pub fn decode(payload: &Value) -> Result<Self, DecodeError> {
    Ok(Self::deserialize(payload)?)
  }

  pub fn popup(&self) -> PopupRect {
    PopupRect {
      row:       self.row,
      col:       self.col,
      height:    self.height,
      width:     self.width,
      scrollbar: self.scrollbar,
    }
  }
}
