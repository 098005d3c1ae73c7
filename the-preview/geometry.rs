//! Placement of the preview overlay around the completion popup.
//!
//! All coordinates are editor cells. Rows and columns are signed because a
//! candidate may be computed partially off screen before it is discarded or
//! deprioritized.

use std::cmp::Reverse;

/// Size of the display area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
  pub width:  i32,
  pub height: i32,
}

impl Screen {
  pub const fn new(width: i32, height: i32) -> Self {
    Self { width, height }
  }
}

/// Geometry of the completion popup when the item changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupRect {
  pub row:       i32,
  pub col:       i32,
  pub height:    i32,
  pub width:     i32,
  pub scrollbar: bool,
}

impl PopupRect {
  fn scrollbar_width(&self) -> i32 {
    i32::from(self.scrollbar)
  }
}

/// Measured extent of the content to preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentSize {
  /// Number of lines.
  pub lines: usize,
  /// Widest line, in bytes.
  pub width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
  North,
  South,
  West,
  East,
}

/// One proposed rectangle for the overlay. Height and width are always at
/// least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
  pub row:    i32,
  pub col:    i32,
  pub height: i32,
  pub width:  i32,
}

impl Candidate {
  pub fn area(&self) -> i64 {
    i64::from(self.height) * i64::from(self.width)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
  pub direction: Direction,
  pub candidate: Candidate,
}

impl Placement {
  pub fn area(&self) -> i64 {
    self.candidate.area()
  }
}

/// Columns kept free between a side placement and the popup.
const SIDE_GAP: i32 = 2;

fn to_cells(n: usize) -> i32 {
  i32::try_from(n).unwrap_or(i32::MAX)
}

/// Clip `available - margin` into `[1, hi]`.
fn limit(available: i32, margin: i32, hi: i32) -> i32 {
  available.saturating_sub(margin).min(hi).max(1)
}

/// All proposed placements, in proposal order: north (only when it fits on
/// screen), south, west, east.
pub fn candidates(
  screen: Screen,
  popup: &PopupRect,
  margin: i32,
  size: ContentSize,
) -> Vec<Placement> {
  let (north, others) = propose(screen, popup, margin, size);
  north.into_iter().chain(others).collect()
}

/// Pick the placement with the largest area. Ties go to the earliest proposed
/// direction.
pub fn solve(screen: Screen, popup: &PopupRect, margin: i32, size: ContentSize) -> Placement {
  let (north, others) = propose(screen, popup, margin, size);
  let [south, ..] = others;
  // min_by_key keeps the first of equal elements
  north
    .into_iter()
    .chain(others)
    .min_by_key(|placement| Reverse(placement.area()))
    .unwrap_or(south)
}

fn propose(
  screen: Screen,
  popup: &PopupRect,
  margin: i32,
  size: ContentSize,
) -> (Option<Placement>, [Placement; 3]) {
  let top = popup.row;
  let bottom = popup.row.saturating_add(popup.height).saturating_add(1);
  let left = popup.col;
  let right = popup
    .col
    .saturating_add(popup.width)
    .saturating_add(popup.scrollbar_width());

  let max_height = to_cells(size.lines);
  let max_width = to_cells(size.width);
  let limit_h = |available: i32| limit(available, margin, max_height);
  let limit_w = |available: i32| limit(available, margin, max_width);

  let vertical_width = limit_w(screen.width.saturating_sub(left));

  let north_height = limit_h(top.saturating_sub(1));
  let north = Candidate {
    row:    top.saturating_sub(1).saturating_sub(north_height),
    col:    left,
    height: north_height,
    width:  vertical_width,
  };
  let north = (north.row > 0).then_some(Placement {
    direction: Direction::North,
    candidate: north,
  });

  let south = Placement {
    direction: Direction::South,
    candidate: Candidate {
      row:    bottom,
      col:    left,
      height: limit_h(screen.height.saturating_sub(bottom)),
      width:  vertical_width,
    },
  };

  let side_height = limit_h(screen.height.saturating_sub(top));

  let west_width = limit_w(left.saturating_sub(SIDE_GAP));
  let west = Placement {
    direction: Direction::West,
    candidate: Candidate {
      row:    top,
      col:    left.saturating_sub(SIDE_GAP).saturating_sub(west_width),
      height: side_height,
      width:  west_width,
    },
  };

  let east = Placement {
    direction: Direction::East,
    candidate: Candidate {
      row:    top,
      col:    right.saturating_add(SIDE_GAP),
      height: side_height,
      width:  limit_w(screen.width.saturating_sub(right).saturating_sub(SIDE_GAP)),
    },
  };

  (north, [south, west, east])
}
