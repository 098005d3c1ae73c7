//! Replays a recorded stream of completion events against an in-memory editor
//! and prints every overlay operation the preview engine performs.
//!
//! Each line of the input is one JSON step:
//!
//! ```text
//! {"event": "changed", "payload": {"completed_item": {...}, "row": 3, ...}}
//! {"event": "wait", "ms": 200}
//! {"event": "promote"}
//! {"event": "done"}
//! ```
//!
//! External references resolve to their `doc` field after `delay-ms`.

use std::{
  collections::BTreeMap,
  path::PathBuf,
  sync::Arc,
  time::Duration,
};

use anyhow::{
  Context as _,
  anyhow,
};
use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use the_preview::{
  Candidate,
  ContentBlock,
  Context,
  Doc,
  DocResolver,
  ExternalRef,
  HostError,
  PreviewConfig,
  PreviewEvent,
  PreviewHost,
  Previewer,
  ResolveError,
  Screen,
  SurfaceId,
};

#[derive(Debug, Parser)]
#[command(name = "the-preview-replay", about = "Replay completion events through the preview engine")]
struct Args {
  /// Preview settings (TOML)
  #[arg(long)]
  config:   Option<PathBuf>,
  /// Screen size as WIDTHxHEIGHT
  #[arg(long, default_value = "80x24", value_parser = parse_screen)]
  screen:   Screen,
  /// Filetype of the buffer being completed in
  #[arg(long, default_value = "")]
  filetype: String,
  #[arg(long, default_value_t = 8)]
  tabstop:  usize,
  /// JSON lines file of events
  events:   PathBuf,
}

fn parse_screen(value: &str) -> Result<Screen, String> {
  let (width, height) = value
    .split_once('x')
    .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
  let width = width.parse().map_err(|err| format!("bad width: {err}"))?;
  let height = height.parse().map_err(|err| format!("bad height: {err}"))?;
  Ok(Screen::new(width, height))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum Step {
  Changed { payload: Value },
  Done,
  Promote,
  Wait { ms: u64 },
}

struct PrintHost {
  screen:  Screen,
  context: Context,
  next_id: u64,
  open:    BTreeMap<SurfaceId, (String, ContentBlock)>,
}

impl PreviewHost for PrintHost {
  fn screen(&self) -> Screen {
    self.screen
  }

  fn context(&self) -> Context {
    self.context.clone()
  }

  fn create_overlay(
    &mut self,
    candidate: &Candidate,
    content: &ContentBlock,
    marker: &str,
  ) -> Result<SurfaceId, HostError> {
    self.next_id += 1;
    let id = SurfaceId(self.next_id);
    println!(
      "open  {id} at row={} col={} {}x{} syntax={:?}",
      candidate.row, candidate.col, candidate.width, candidate.height, content.syntax
    );
    for line in &content.lines {
      println!("      | {line}");
    }
    self.open.insert(id, (marker.to_owned(), content.clone()));
    Ok(id)
  }

  fn close_overlay(&mut self, surface: SurfaceId) -> Result<(), HostError> {
    self
      .open
      .remove(&surface)
      .ok_or(HostError::SurfaceGone(surface))?;
    println!("close {surface}");
    Ok(())
  }

  fn list_tagged(&self, marker: &str) -> Result<Vec<SurfaceId>, HostError> {
    Ok(
      self
        .open
        .iter()
        .filter(|(_, (tag, _))| tag == marker)
        .map(|(id, _)| *id)
        .collect(),
    )
  }

  fn overlay_content(&self, surface: SurfaceId) -> Result<Option<ContentBlock>, HostError> {
    Ok(self.open.get(&surface).map(|(_, content)| content.clone()))
  }

  fn stop_insert(&mut self) -> Result<(), HostError> {
    println!("stopinsert");
    Ok(())
  }

  fn enter_full_preview(&mut self, content: &ContentBlock) -> Result<(), HostError> {
    println!(
      "preview window ({} lines, syntax={:?})",
      content.lines.len(),
      content.syntax
    );
    Ok(())
  }
}

struct ReplayResolver;

#[async_trait]
impl DocResolver for ReplayResolver {
  async fn resolve(&self, reference: &ExternalRef) -> Result<Option<Doc>, ResolveError> {
    let delay = reference
      .0
      .get("delay-ms")
      .and_then(Value::as_u64)
      .unwrap_or_default();
    tokio::time::sleep(Duration::from_millis(delay)).await;
    reference
      .0
      .get("doc")
      .map(|doc| serde_json::from_value(doc.clone()))
      .transpose()
      .map_err(|err| ResolveError(err.to_string()))
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  env_logger::init();
  let args = Args::parse();

  let config = match &args.config {
    Some(path) => PreviewConfig::load_file(path)?,
    None => PreviewConfig::default(),
  };
  let host = PrintHost {
    screen:  args.screen,
    context: Context {
      filetype: args.filetype,
      tabstop:  args.tabstop,
    },
    next_id: 0,
    open:    BTreeMap::new(),
  };
  let (handle, task) = Previewer::new(config, host, Arc::new(ReplayResolver)).spawn();

  let text = tokio::fs::read_to_string(&args.events)
    .await
    .with_context(|| format!("failed to read {}", args.events.display()))?;
  for (index, line) in text.lines().enumerate() {
    if line.trim().is_empty() {
      continue;
    }
    let step: Step =
      serde_json::from_str(line).with_context(|| format!("bad step on line {}", index + 1))?;
    match step {
      Step::Changed { payload } => {
        handle
          .sender()
          .send(PreviewEvent::ItemChanged(payload))
          .await
          .map_err(|_| anyhow!("preview service stopped"))?;
      },
      Step::Done => {
        handle
          .sender()
          .send(PreviewEvent::ItemDone)
          .await
          .map_err(|_| anyhow!("preview service stopped"))?;
      },
      Step::Promote => {
        let keys = handle.promote().await;
        println!("keys  {keys:?}");
      },
      Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
    }
  }

  drop(handle);
  task.await.context("preview service panicked")?;
  Ok(())
}
