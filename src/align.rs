/// Number of whole pages needed to hold `size` bytes (ceiling division).
///
/// # Examples
///
/// ```rust
/// use pagealloc::pages_for;
///
/// assert_eq!(pages_for!(0, 32), 0);
/// assert_eq!(pages_for!(1, 32), 1);
/// assert_eq!(pages_for!(32, 32), 1);
/// assert_eq!(pages_for!(40, 32), 2);
/// ```
#[macro_export]
macro_rules! pages_for {
  ($size:expr, $page_size:expr) => {
    usize::div_ceil($size, $page_size)
  };
}

/// Rounds `size` up to the next multiple of the page size.
///
/// # Examples
///
/// ```rust
/// use pagealloc::page_align;
///
/// assert_eq!(page_align!(100, 32), 128);
/// assert_eq!(page_align!(64, 32), 64);
/// ```
#[macro_export]
macro_rules! page_align {
  ($size:expr, $page_size:expr) => {
    $crate::pages_for!($size, $page_size) * ($page_size)
  };
}
