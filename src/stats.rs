use std::fmt;

use crate::geometry::Geometry;

/// Glyph shown for bytes outside printable ASCII.
pub const PLACEHOLDER: char = '.';

/// Point-in-time copy of the arena and page table.
///
/// Rendered with `Display` as one line of bytes per page, a blank line, and
/// one line with `f` (free) or `R` (reserved) per page:
///
/// ```text
///   Memory contents:
///   hello...........................
///   ................................
///   ...
///
///   Memory allocations:
///   RRffffffffff
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
  pub(crate) geometry: Geometry,
  pub(crate) contents: Vec<u8>,
  pub(crate) reserved: Vec<bool>,
  pub(crate) live_allocations: usize,
  pub(crate) largest_free_run: usize,
}

impl Snapshot {
  /// Raw arena bytes.
  pub fn contents(&self) -> &[u8] {
    &self.contents
  }

  /// Bytes of one page, `None` past the end of the arena.
  pub fn page_bytes(
    &self,
    page: usize,
  ) -> Option<&[u8]> {
    self.contents.chunks(self.geometry.page_size()).nth(page)
  }

  pub fn is_reserved(
    &self,
    page: usize,
  ) -> Option<bool> {
    self.reserved.get(page).copied()
  }

  pub fn reserved_pages(&self) -> usize {
    self.reserved.iter().filter(|r| **r).count()
  }

  pub fn free_pages(&self) -> usize {
    self.reserved.len() - self.reserved_pages()
  }

  pub fn live_allocations(&self) -> usize {
    self.live_allocations
  }

  /// Length in pages of the largest free run (0 when full).
  pub fn largest_free_run(&self) -> usize {
    self.largest_free_run
  }

  /// The `f`/`R` allocation line.
  pub fn allocation_map(&self) -> String {
    self
      .reserved
      .iter()
      .map(|reserved| if *reserved { 'R' } else { 'f' })
      .collect()
  }
}

/// Printable ASCII (32..=126) as itself, everything else as [`PLACEHOLDER`].
pub fn printable(byte: u8) -> char {
  if (32..=126).contains(&byte) {
    byte as char
  } else {
    PLACEHOLDER
  }
}

impl fmt::Display for Snapshot {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Memory contents:")?;
    for page in self.contents.chunks(self.geometry.page_size()) {
      let line: String = page.iter().copied().map(printable).collect();
      writeln!(f, "{line}")?;
    }
    writeln!(f)?;

    writeln!(f, "Memory allocations:")?;
    writeln!(f, "{}", self.allocation_map())
  }
}
