//! Normalization of documentation text before it is measured and rendered.

use serde::{
  Deserialize,
  Serialize,
};

use crate::geometry::ContentSize;

const FENCE: &str = "```";
const MARKDOWN: &str = "markdown";
const DEFAULT_TABSTOP: usize = 8;

/// Documentation text and the syntax it should be highlighted with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
  pub text:   String,
  pub syntax: String,
}

impl Doc {
  pub fn new(text: impl Into<String>, syntax: impl Into<String>) -> Self {
    Self {
      text:   text.into(),
      syntax: syntax.into(),
    }
  }
}

/// Buffer state the preview is rendered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
  /// Filetype of the buffer being edited.
  pub filetype: String,
  /// Display width of a tab.
  pub tabstop:  usize,
}

impl Default for Context {
  fn default() -> Self {
    Self {
      filetype: String::new(),
      tabstop:  DEFAULT_TABSTOP,
    }
  }
}

/// Processed lines ready to be put into an overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBlock {
  pub lines:  Vec<String>,
  pub syntax: String,
}

impl ContentBlock {
  /// Strip redundant fencing, expand tabs and split into lines.
  pub fn new(context: &Context, doc: Doc) -> Self {
    let doc = preprocess(context, doc);
    let text = expand_tabs(context, &doc.text);
    let mut lines = text.lines().map(str::to_owned).collect::<Vec<_>>();
    if lines.is_empty() {
      lines.push(String::new());
    }
    Self {
      lines,
      syntax: doc.syntax,
    }
  }

  pub fn measure(&self) -> ContentSize {
    ContentSize {
      lines: self.lines.len(),
      width: self.lines.iter().map(String::len).max().unwrap_or_default(),
    }
  }
}

/// Unwrap markdown that is a single fenced code block, adopting the fence's
/// language as the syntax. Anything else is returned unchanged.
pub fn preprocess(context: &Context, doc: Doc) -> Doc {
  if doc.syntax != MARKDOWN {
    return doc;
  }

  let lines = doc.text.lines().collect::<Vec<_>>();
  let [first, interior @ .., last] = lines.as_slice() else {
    // a lone opening fence is both the first and the last line
    return match lines.as_slice() {
      [only] if *only == FENCE => Doc::new("", context.filetype.clone()),
      _ => doc,
    };
  };

  let wrapped = first.starts_with(FENCE)
    && *last == FENCE
    && !interior.iter().any(|line| line.starts_with(FENCE));
  if !wrapped {
    return doc;
  }

  let tag = first[FENCE.len()..].trim();
  let syntax = if !tag.is_empty() && tag.chars().all(char::is_alphanumeric) {
    tag.to_owned()
  } else {
    context.filetype.clone()
  };
  Doc {
    text: interior.join("\n"),
    syntax,
  }
}

/// Replace tabs with spaces up to the next multiple of the context's tabstop.
pub fn expand_tabs(context: &Context, text: &str) -> String {
  if !text.contains('\t') {
    return text.to_owned();
  }

  let tabstop = if context.tabstop == 0 {
    DEFAULT_TABSTOP
  } else {
    context.tabstop
  };
  let mut expanded = String::with_capacity(text.len());
  let mut column = 0;
  for ch in text.chars() {
    match ch {
      '\t' => {
        let pad = tabstop - column % tabstop;
        expanded.extend(std::iter::repeat_n(' ', pad));
        column += pad;
      },
      '\n' | '\r' => {
        expanded.push(ch);
        column = 0;
      },
      _ => {
        expanded.push(ch);
        column += 1;
      },
    }
  }
  expanded
}

#[cfg(test)]
mod tests {
  use super::{
    ContentBlock,
    Context,
    Doc,
    expand_tabs,
    preprocess,
  };

  fn context() -> Context {
    Context {
      filetype: "python".into(),
      tabstop:  4,
    }
  }

  #[test]
  fn fenced_markdown_adopts_language_tag() {
    let doc = Doc::new("```rust\nfn main() {}\nlet x = 1;\n```", "markdown");
    let processed = preprocess(&context(), doc);
    assert_eq!(processed, Doc::new("fn main() {}\nlet x = 1;", "rust"));
  }

  #[test]
  fn non_alphanumeric_tag_falls_back_to_filetype() {
    let doc = Doc::new("```c++\nint x;\n```", "markdown");
    assert_eq!(preprocess(&context(), doc).syntax, "python");

    let doc = Doc::new("```\nx = 1\n```", "markdown");
    assert_eq!(preprocess(&context(), doc), Doc::new("x = 1", "python"));
  }

  #[test]
  fn multiple_fences_are_left_alone() {
    let text = "```rust\na\n```\ntext\n```rust\nb\n```";
    let doc = Doc::new(text, "markdown");
    assert_eq!(preprocess(&context(), doc.clone()), doc);
  }

  #[test]
  fn partially_fenced_markdown_is_left_alone() {
    let doc = Doc::new("intro\n```rust\nfn f() {}\n```", "markdown");
    assert_eq!(preprocess(&context(), doc.clone()), doc);

    let doc = Doc::new("```rust\nfn f() {}\n``` trailing", "markdown");
    assert_eq!(preprocess(&context(), doc.clone()), doc);
  }

  #[test]
  fn other_syntaxes_are_not_unwrapped() {
    let doc = Doc::new("```rust\nfn f() {}\n```", "plaintext");
    assert_eq!(preprocess(&context(), doc.clone()), doc);
  }

  #[test]
  fn preprocess_is_idempotent() {
    let docs = [
      Doc::new("```rust\nfn f() {}\n```", "markdown"),
      Doc::new("```markdown\n# title\n```", "markdown"),
      Doc::new("```markdown\n```", "markdown"),
      Doc::new("```", "markdown"),
      Doc::new("plain *markdown*", "markdown"),
      Doc::new("", "markdown"),
    ];
    for doc in docs {
      let once = preprocess(&context(), doc);
      let twice = preprocess(&context(), once.clone());
      assert_eq!(once, twice);
    }
  }

  #[test]
  fn tabs_expand_to_next_stop() {
    assert_eq!(expand_tabs(&context(), "\tx"), "    x");
    assert_eq!(expand_tabs(&context(), "ab\tc"), "ab  c");
    assert_eq!(expand_tabs(&context(), "abcd\te\n\tf"), "abcd    e\n    f");
  }

  #[test]
  fn zero_tabstop_uses_default_width() {
    let context = Context {
      filetype: String::new(),
      tabstop:  0,
    };
    assert_eq!(expand_tabs(&context, "\t"), " ".repeat(8));
  }

  #[test]
  fn content_is_measured_after_tab_expansion() {
    let doc = Doc::new("a\tb\nlonger line", "text");
    let content = ContentBlock::new(&context(), doc);
    assert_eq!(content.lines, vec!["a   b", "longer line"]);
    let size = content.measure();
    assert_eq!(size.lines, 2);
    assert_eq!(size.width, 11);

    let tabbed = ContentBlock::new(&context(), Doc::new("\t\t\tx", "text"));
    assert_eq!(tabbed.measure().width, 13);
  }

  #[test]
  fn empty_text_keeps_one_blank_line() {
    let content = ContentBlock::new(&context(), Doc::new("", "text"));
    assert_eq!(content.lines, vec![String::new()]);
    assert_eq!(content.measure().width, 0);
  }

  #[test]
  fn width_is_measured_in_bytes() {
    let content = ContentBlock::new(&context(), Doc::new("héllo", "text"));
    assert_eq!(content.measure().width, 6);
  }
}
