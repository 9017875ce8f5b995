//! Page ownership table.
//!
//! ```text
//!   page:   0   1   2   3   4   5   6   7   8   9  10  11
//!         ┌───┬───┬───┬───┬───┬───┬───┬───┬───┬───┬───┬───┐
//!   tag:  │ 1 │ 1 │ - │ 4 │ 4 │ 4 │ - │ - │ - │ 7 │ - │ - │
//!         └───┴───┴───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘
//!                   └─ free run (len 1)  └ largest free run (len 3)
//! ```
//!
//! Every page carries either no tag (free) or the id of the allocation that
//! owns it. Pages of one allocation are always contiguous.

use std::fmt;
use std::num::NonZeroU64;
use std::ops::Range;

/// Id shared by every page of one logical allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocId(NonZeroU64);

impl fmt::Display for AllocId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Monotonic source of allocation ids. Ids are never reused.
#[derive(Debug, Default)]
pub(crate) struct IdCounter {
  issued: u64,
}

impl IdCounter {
  /// Next id, or `None` once the counter would wrap.
  pub(crate) fn issue(&mut self) -> Option<AllocId> {
    let next = self.issued.checked_add(1)?;
    self.issued = next;
    NonZeroU64::new(next).map(AllocId)
  }

  #[cfg(test)]
  pub(crate) fn starting_at(issued: u64) -> Self {
    Self { issued }
  }
}

/// A contiguous range of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
  pub start: usize,
  pub len: usize,
}

impl Run {
  pub fn new(
    start: usize,
    len: usize,
  ) -> Self {
    Self { start, len }
  }

  #[inline]
  pub fn end(&self) -> usize {
    self.start + self.len
  }

  #[inline]
  pub fn pages(&self) -> Range<usize> {
    self.start..self.end()
  }
}

pub(crate) struct PageTable {
  tags: Box<[Option<AllocId>]>,
}

impl PageTable {
  pub(crate) fn new(page_count: usize) -> Self {
    Self {
      tags: vec![None; page_count].into_boxed_slice(),
    }
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.tags.len()
  }

  #[inline]
  pub(crate) fn tag(
    &self,
    page: usize,
  ) -> Option<AllocId> {
    self.tags[page]
  }

  /// Largest run of free pages, lowest start index on ties.
  ///
  /// The whole table is scanned: a run is only replaced by a strictly longer
  /// one, so the first run of the maximum length wins.
  pub(crate) fn largest_free_run(&self) -> Option<Run> {
    self.largest_free_run_reusing(None)
  }

  /// Like [`largest_free_run`](Self::largest_free_run), counting the pages of
  /// `owned` as free. The table is not modified.
  pub(crate) fn largest_free_run_reusing(
    &self,
    owned: Option<Run>,
  ) -> Option<Run> {
    let mut best: Option<Run> = None;
    let mut current = Run::new(0, 0);

    let mut consider = |run: Run| {
      if run.len > 0 && best.is_none_or(|b| run.len > b.len) {
        best = Some(run);
      }
    };

    for (page, tag) in self.tags.iter().enumerate() {
      let reusable = owned.is_some_and(|run| run.pages().contains(&page));
      if tag.is_none() || reusable {
        if current.len == 0 {
          current.start = page;
        }
        current.len += 1;
      } else {
        consider(current);
        current.len = 0;
      }
    }
    consider(current);

    best
  }

  /// Tags every page of `run` with `id`. The pages must be free.
  pub(crate) fn claim(
    &mut self,
    run: Run,
    id: AllocId,
  ) {
    for tag in &mut self.tags[run.pages()] {
      debug_assert!(tag.is_none(), "claiming a reserved page");
      *tag = Some(id);
    }
  }

  /// Clears every page of `run`.
  pub(crate) fn release(
    &mut self,
    run: Run,
  ) {
    for tag in &mut self.tags[run.pages()] {
      *tag = None;
    }
  }

  /// Full page range of the allocation owning `page`, or `None` if the page
  /// is free.
  pub(crate) fn allocation_at(
    &self,
    page: usize,
  ) -> Option<Run> {
    let id = self.tag(page)?;

    let start = self.tags[..page]
      .iter()
      .rposition(|tag| *tag != Some(id))
      .map_or(0, |i| i + 1);
    let end = self.tags[page..]
      .iter()
      .position(|tag| *tag != Some(id))
      .map_or(self.len(), |i| page + i);

    Some(Run::new(start, end - start))
  }

  pub(crate) fn free_pages(&self) -> usize {
    self.tags.iter().filter(|tag| tag.is_none()).count()
  }

  /// Number of distinct live allocations.
  pub(crate) fn live_allocations(&self) -> usize {
    self
      .tags
      .iter()
      .enumerate()
      .filter(|(page, tag)| tag.is_some() && (*page == 0 || self.tags[page - 1] != **tag))
      .count()
  }

  pub(crate) fn reserved(&self) -> impl Iterator<Item = bool> + '_ {
    self.tags.iter().map(Option::is_some)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn id(n: u64) -> AllocId {
    AllocId(NonZeroU64::new(n).unwrap())
  }

  /// Builds a table from a pattern like `"11.444...7.."` (`.` is free).
  fn table(pattern: &str) -> PageTable {
    let mut table = PageTable::new(pattern.len());
    for (page, c) in pattern.chars().enumerate() {
      if let Some(n) = c.to_digit(10) {
        table.tags[page] = Some(id(n as u64));
      }
    }
    table
  }

  #[test]
  fn test_largest_run_on_empty_table() {
    let table = PageTable::new(12);
    assert_eq!(table.largest_free_run(), Some(Run::new(0, 12)));
    assert_eq!(table.free_pages(), 12);
    assert_eq!(table.live_allocations(), 0);
  }

  #[test]
  fn test_largest_run_prefers_lowest_address() {
    // Free runs of 3, 1, 5, 5 pages.
    let table = table("...1.2.....3.....");
    assert_eq!(table.largest_free_run(), Some(Run::new(6, 5)));
  }

  #[test]
  fn test_largest_run_not_first_fit() {
    let table = table("..1....2...");
    assert_eq!(table.largest_free_run(), Some(Run::new(3, 4)));
  }

  #[test]
  fn test_largest_run_at_tail() {
    let table = table("1.2....");
    assert_eq!(table.largest_free_run(), Some(Run::new(3, 4)));
  }

  #[test]
  fn test_largest_run_reusing_owned_pages() {
    let table = table("1..22.....3");
    assert_eq!(table.largest_free_run(), Some(Run::new(5, 5)));
    // Pages 3..5 join the runs on both sides.
    assert_eq!(table.largest_free_run_reusing(Some(Run::new(3, 2))), Some(Run::new(1, 9)));
    assert_eq!(table.tag(3), Some(id(2)));
  }

  #[test]
  fn test_full_table_reusing_owned_pages() {
    let table = table("112233");
    assert_eq!(table.largest_free_run_reusing(Some(Run::new(2, 2))), Some(Run::new(2, 2)));
  }

  #[test]
  fn test_full_table_has_no_run() {
    let table = table("112233");
    assert_eq!(table.largest_free_run(), None);
    assert_eq!(table.free_pages(), 0);
    assert_eq!(table.live_allocations(), 3);
  }

  #[test]
  fn test_allocation_at() {
    let table = table("11.444.77");
    assert_eq!(table.allocation_at(0), Some(Run::new(0, 2)));
    assert_eq!(table.allocation_at(1), Some(Run::new(0, 2)));
    assert_eq!(table.allocation_at(2), None);
    assert_eq!(table.allocation_at(4), Some(Run::new(3, 3)));
    assert_eq!(table.allocation_at(8), Some(Run::new(7, 2)));
  }

  #[test]
  fn test_claim_and_release() {
    let mut table = PageTable::new(6);
    table.claim(Run::new(1, 3), id(9));

    assert_eq!(table.reserved().collect::<Vec<_>>(), [false, true, true, true, false, false]);
    assert_eq!(table.allocation_at(2), Some(Run::new(1, 3)));

    table.release(Run::new(2, 2));
    assert_eq!(table.allocation_at(1), Some(Run::new(1, 1)));
    assert_eq!(table.free_pages(), 5);
  }

  #[test]
  fn test_id_counter_never_reuses() {
    let mut counter = IdCounter::default();
    assert_eq!(counter.issue(), Some(id(1)));
    assert_eq!(counter.issue(), Some(id(2)));

    let mut exhausted = IdCounter::starting_at(u64::MAX);
    assert_eq!(exhausted.issue(), None);
  }
}
