//! Arena geometry and allocator configuration.

use crate::error::GeometryError;
use crate::fault::FaultPolicy;

pub const DEFAULT_PAGE_SIZE: usize = 32;
pub const DEFAULT_PAGE_COUNT: usize = 12;

/// Page size and page count of an arena, fixed for the allocator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
  page_size: usize,
  page_count: usize,
}

impl Geometry {
  /// 12 pages of 32 bytes: a 384-byte arena.
  pub const DEFAULT: Geometry = Geometry {
    page_size: DEFAULT_PAGE_SIZE,
    page_count: DEFAULT_PAGE_COUNT,
  };

  pub fn new(
    page_size: usize,
    page_count: usize,
  ) -> Result<Self, GeometryError> {
    if page_size == 0 {
      return Err(GeometryError::ZeroPageSize);
    }
    if page_count == 0 {
      return Err(GeometryError::ZeroPageCount);
    }
    page_size
      .checked_mul(page_count)
      .ok_or(GeometryError::ArenaTooLarge { page_size, page_count })?;

    Ok(Self { page_size, page_count })
  }

  #[inline]
  pub fn page_size(&self) -> usize {
    self.page_size
  }

  #[inline]
  pub fn page_count(&self) -> usize {
    self.page_count
  }

  #[inline]
  pub fn total_size(&self) -> usize {
    self.page_size * self.page_count
  }

  #[inline]
  pub(crate) fn page_offset(
    &self,
    page: usize,
  ) -> usize {
    page * self.page_size
  }
}

impl Default for Geometry {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Everything fixed at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorConfig {
  pub geometry: Geometry,
  pub fault_policy: FaultPolicy,
}
