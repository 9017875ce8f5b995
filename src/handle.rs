use std::fmt;

use crate::error::{AllocError, InvalidHandleReason};
use crate::geometry::Geometry;

/// Opaque reference to the first byte of an allocation.
///
/// A handle is a byte offset into the arena. It is only meaningful while the
/// allocation it names is live. The null handle is `Option::<Handle>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
  /// Builds a handle from a raw arena offset.
  ///
  /// Nothing is checked here; operations on the allocator reject offsets that
  /// do not name a live allocation.
  pub const fn from_offset(offset: usize) -> Self {
    Self(offset)
  }

  pub const fn offset(&self) -> usize {
    self.0
  }

  /// Page index of this handle, rejecting offsets outside the arena or off a
  /// page boundary.
  pub(crate) fn page(
    &self,
    geometry: &Geometry,
  ) -> Result<usize, AllocError> {
    if self.0 >= geometry.total_size() {
      return Err(AllocError::invalid(self.0, InvalidHandleReason::OutOfBounds));
    }
    if self.0 % geometry.page_size() != 0 {
      return Err(AllocError::invalid(self.0, InvalidHandleReason::Misaligned));
    }
    Ok(self.0 / geometry.page_size())
  }
}

impl fmt::Display for Handle {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "0x{:04x}", self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_page_conversion() {
    let geometry = Geometry::DEFAULT;

    assert_eq!(Handle::from_offset(0).page(&geometry), Ok(0));
    assert_eq!(Handle::from_offset(64).page(&geometry), Ok(2));
    assert_eq!(Handle::from_offset(352).page(&geometry), Ok(11));
  }

  #[test]
  fn test_rejects_bad_offsets() {
    let geometry = Geometry::DEFAULT;

    assert_eq!(
      Handle::from_offset(384).page(&geometry),
      Err(AllocError::invalid(384, InvalidHandleReason::OutOfBounds))
    );
    assert_eq!(
      Handle::from_offset(33).page(&geometry),
      Err(AllocError::invalid(33, InvalidHandleReason::Misaligned))
    );
  }

  #[test]
  fn test_display() {
    assert_eq!(Handle::from_offset(96).to_string(), "0x0060");
  }
}
