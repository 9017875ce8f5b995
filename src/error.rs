//! Error types for the page allocator.

use std::fmt;

use thiserror::Error;

/// Why a handle was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidHandleReason {
  /// The offset lies outside the arena.
  OutOfBounds,
  /// The offset is not on a page boundary.
  Misaligned,
  /// The page is free: the handle was already released or never issued.
  FreePage,
  /// The page is reserved but is not the first page of its allocation.
  NotAllocationStart,
}

impl fmt::Display for InvalidHandleReason {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let text = match self {
      InvalidHandleReason::OutOfBounds => "outside the arena",
      InvalidHandleReason::Misaligned => "not page aligned",
      InvalidHandleReason::FreePage => "points at a free page",
      InvalidHandleReason::NotAllocationStart => "not the start of an allocation",
    };
    f.write_str(text)
  }
}

/// Errors returned by allocator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
  /// No free run of pages is large enough for the request.
  #[error(
    "out of memory: requested {requested} bytes ({pages_needed} pages), largest free run is {largest_free_run} pages"
  )]
  OutOfMemory {
    requested: usize,
    pages_needed: usize,
    largest_free_run: usize,
  },

  /// Zero-byte allocations are rejected.
  #[error("zero-size allocation")]
  ZeroSize,

  /// The handle does not name a live allocation.
  ///
  /// Through [`PageAllocator::free`](crate::PageAllocator::free) and
  /// [`PageAllocator::resize`](crate::PageAllocator::resize) this is escalated
  /// to a fatal fault and never returned.
  #[error("invalid handle at offset {offset}: {reason}")]
  InvalidHandle {
    offset: usize,
    reason: InvalidHandleReason,
  },

  /// A region access ran past the usable size of the allocation.
  #[error("region access of {len} bytes at {at} exceeds usable size {usable}")]
  RegionOverflow { at: usize, len: usize, usable: usize },

  /// The allocation id counter is exhausted.
  #[error("allocation ids exhausted")]
  IdsExhausted,
}

impl AllocError {
  pub(crate) fn invalid(
    offset: usize,
    reason: InvalidHandleReason,
  ) -> Self {
    AllocError::InvalidHandle { offset, reason }
  }

  /// Whether this error is a contract violation rather than a resource failure.
  pub fn is_fatal(&self) -> bool {
    matches!(self, AllocError::InvalidHandle { .. })
  }
}

/// Rejected arena geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
  #[error("page size must be non-zero")]
  ZeroPageSize,

  #[error("page count must be non-zero")]
  ZeroPageCount,

  #[error("arena of {page_count} pages of {page_size} bytes overflows usize")]
  ArenaTooLarge { page_size: usize, page_count: usize },
}
