//! In-memory editor used by the preview integration tests.

use std::{
  collections::BTreeMap,
  sync::Arc,
  time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{
  Value,
  json,
};
use the_preview::{
  Candidate,
  ContentBlock,
  Context,
  Doc,
  DocResolver,
  ExternalRef,
  HostError,
  PopupRect,
  PreviewConfig,
  PreviewHost,
  Previewer,
  ResolveError,
  Screen,
  SurfaceId,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
  pub id:        SurfaceId,
  pub candidate: Candidate,
  pub content:   ContentBlock,
  pub marker:    String,
}

#[derive(Debug, Default)]
pub struct HostState {
  next_id:            u64,
  pub open:           BTreeMap<SurfaceId, Overlay>,
  /// Every overlay ever created, in order.
  pub created:        Vec<Overlay>,
  pub insert_stopped: bool,
  pub full_preview:   Option<ContentBlock>,
  pub reject_create:  bool,
  pub context:        Context,
}

#[derive(Debug, Clone)]
pub struct FakeHost {
  pub state: Arc<Mutex<HostState>>,
  screen:    Screen,
}

impl FakeHost {
  pub fn new(screen: Screen) -> Self {
    let state = HostState {
      context: Context {
        filetype: "rust".into(),
        tabstop:  4,
      },
      ..HostState::default()
    };
    Self {
      state: Arc::new(Mutex::new(state)),
      screen,
    }
  }

  pub fn open(&self) -> Vec<Overlay> {
    self.state.lock().open.values().cloned().collect()
  }

  pub fn created(&self) -> Vec<Overlay> {
    self.state.lock().created.clone()
  }

  /// Simulate a floating window opened by someone else.
  pub fn open_foreign(&self, marker: &str) -> SurfaceId {
    let mut state = self.state.lock();
    state.next_id += 1;
    let id = SurfaceId(state.next_id);
    state.open.insert(id, Overlay {
      id,
      candidate: Candidate {
        row:    0,
        col:    0,
        height: 1,
        width:  1,
      },
      content: ContentBlock::default(),
      marker: marker.to_owned(),
    });
    id
  }
}

impl PreviewHost for FakeHost {
  fn screen(&self) -> Screen {
    self.screen
  }

  fn context(&self) -> Context {
    self.state.lock().context.clone()
  }

  fn create_overlay(
    &mut self,
    candidate: &Candidate,
    content: &ContentBlock,
    marker: &str,
  ) -> Result<SurfaceId, HostError> {
    let mut state = self.state.lock();
    if state.reject_create {
      return Err(HostError::Rejected("no room for a float".into()));
    }
    state.next_id += 1;
    let overlay = Overlay {
      id:        SurfaceId(state.next_id),
      candidate: *candidate,
      content:   content.clone(),
      marker:    marker.to_owned(),
    };
    state.open.insert(overlay.id, overlay.clone());
    state.created.push(overlay.clone());
    Ok(overlay.id)
  }

  fn close_overlay(&mut self, surface: SurfaceId) -> Result<(), HostError> {
    self
      .state
      .lock()
      .open
      .remove(&surface)
      .map(drop)
      .ok_or(HostError::SurfaceGone(surface))
  }

  fn list_tagged(&self, marker: &str) -> Result<Vec<SurfaceId>, HostError> {
    Ok(
      self
        .state
        .lock()
        .open
        .values()
        .filter(|overlay| overlay.marker == marker)
        .map(|overlay| overlay.id)
        .collect(),
    )
  }

  fn overlay_content(&self, surface: SurfaceId) -> Result<Option<ContentBlock>, HostError> {
    Ok(
      self
        .state
        .lock()
        .open
        .get(&surface)
        .map(|overlay| overlay.content.clone()),
    )
  }

  fn stop_insert(&mut self) -> Result<(), HostError> {
    self.state.lock().insert_stopped = true;
    Ok(())
  }

  fn enter_full_preview(&mut self, content: &ContentBlock) -> Result<(), HostError> {
    self.state.lock().full_preview = Some(content.clone());
    Ok(())
  }
}

/// Resolves references of the form
/// `{"doc": {...}, "delay-ms": N, "fail": bool}` after the given delay.
pub struct ScriptedResolver;

#[async_trait]
impl DocResolver for ScriptedResolver {
  async fn resolve(&self, reference: &ExternalRef) -> Result<Option<Doc>, ResolveError> {
    let delay = reference
      .0
      .get("delay-ms")
      .and_then(Value::as_u64)
      .unwrap_or_default();
    tokio::time::sleep(Duration::from_millis(delay)).await;

    if reference.0.get("fail").and_then(Value::as_bool) == Some(true) {
      return Err(ResolveError("scripted failure".into()));
    }
    reference
      .0
      .get("doc")
      .map(|doc| serde_json::from_value(doc.clone()))
      .transpose()
      .map_err(|err| ResolveError(err.to_string()))
  }
}

pub fn screen() -> Screen {
  Screen::new(80, 24)
}

pub fn popup() -> PopupRect {
  PopupRect {
    row:       10,
    col:       5,
    height:    4,
    width:     20,
    scrollbar: false,
  }
}

pub fn previewer(host: &FakeHost) -> Previewer<FakeHost> {
  previewer_with(host, PreviewConfig::default())
}

pub fn previewer_with(host: &FakeHost, config: PreviewConfig) -> Previewer<FakeHost> {
  Previewer::new(config, host.clone(), Arc::new(ScriptedResolver))
}

/// Item-changed payload as the editor sends it.
pub fn changed(popup: PopupRect, user_data: Value) -> Value {
  json!({
    "completed_item": {
      "word": "item",
      "abbr": "item",
      "user_data": user_data,
    },
    "row": popup.row,
    "col": popup.col,
    "height": popup.height,
    "width": popup.width,
    "size": 12,
    "scrollbar": popup.scrollbar,
  })
}

pub fn inline(text: &str, syntax: &str) -> Value {
  json!({ "doc": { "text": text, "syntax": syntax } })
}

/// Item whose docs live behind a resolver taking `delay_ms`.
pub fn external(text: &str, delay_ms: u64, fallback: Option<&str>) -> Value {
  json!({
    "doc": fallback.map(|text| json!({ "text": text, "syntax": "markdown" })),
    "extern": {
      "doc": { "text": text, "syntax": "markdown" },
      "delay-ms": delay_ms,
    },
  })
}
