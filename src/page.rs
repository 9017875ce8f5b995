use std::{cmp::Ordering, io};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
  error::{AllocError, InvalidHandleReason},
  fault::{self, FaultPolicy},
  geometry::{AllocatorConfig, Geometry},
  handle::Handle,
  stats::Snapshot,
  table::{IdCounter, PageTable, Run},
};

/// Arena, page table and id counter. Only ever touched under the lock.
struct State {
  arena: Box<[u8]>,
  table: PageTable,
  ids: IdCounter,
}

impl State {
  fn new(geometry: &Geometry) -> Self {
    Self {
      arena: vec![0u8; geometry.total_size()].into_boxed_slice(),
      table: PageTable::new(geometry.page_count()),
      ids: IdCounter::default(),
    }
  }

  /// Picks the pages for a `size`-byte allocation. Pages of `owned` count as
  /// free. Nothing is changed.
  fn place(
    &self,
    geometry: &Geometry,
    size: usize,
    owned: Option<Run>,
  ) -> Result<Run, AllocError> {
    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let pages_needed = crate::pages_for!(size, geometry.page_size());
    let largest = self.table.largest_free_run_reusing(owned);

    match largest {
      Some(free) if pages_needed <= geometry.page_count() && free.len >= pages_needed => {
        Ok(Run::new(free.start, pages_needed))
      }
      _ => {
        let largest_free_run = largest.map_or(0, |free| free.len);
        warn!(size, pages_needed, largest_free_run, "out of memory");
        Err(AllocError::OutOfMemory {
          requested: size,
          pages_needed,
          largest_free_run,
        })
      }
    }
  }

  fn allocate(
    &mut self,
    geometry: &Geometry,
    size: usize,
  ) -> Result<Handle, AllocError> {
    let run = self.place(geometry, size, None)?;

    let id = self.ids.issue().ok_or(AllocError::IdsExhausted)?;
    self.table.claim(run, id);

    let handle = Handle::from_offset(geometry.page_offset(run.start));
    debug!(%id, %handle, start = run.start, pages = run.len, "allocated");

    Ok(handle)
  }

  /// Pages of the live allocation starting at `handle`.
  fn live_run(
    &self,
    geometry: &Geometry,
    handle: Handle,
  ) -> Result<Run, AllocError> {
    let page = handle.page(geometry)?;
    let run = self
      .table
      .allocation_at(page)
      .ok_or(AllocError::invalid(handle.offset(), InvalidHandleReason::FreePage))?;

    if run.start != page {
      return Err(AllocError::invalid(handle.offset(), InvalidHandleReason::NotAllocationStart));
    }

    Ok(run)
  }

  fn free(
    &mut self,
    geometry: &Geometry,
    handle: Handle,
  ) -> Result<(), AllocError> {
    let run = self.live_run(geometry, handle)?;
    self.table.release(run);

    debug!(%handle, start = run.start, pages = run.len, "freed");
    Ok(())
  }

  fn resize(
    &mut self,
    geometry: &Geometry,
    handle: Option<Handle>,
    new_size: usize,
  ) -> Result<Option<Handle>, AllocError> {
    let Some(handle) = handle else {
      return self.allocate(geometry, new_size).map(Some);
    };

    if new_size == 0 {
      self.free(geometry, handle)?;
      return Ok(None);
    }

    let run = self.live_run(geometry, handle)?;
    let cur_size = run.len * geometry.page_size();

    match new_size.cmp(&cur_size) {
      Ordering::Equal => Ok(Some(handle)),
      Ordering::Less => {
        let keep = crate::pages_for!(new_size, geometry.page_size());
        if keep < run.len {
          self.table.release(Run::new(run.start + keep, run.len - keep));
          debug!(%handle, from = run.len, to = keep, "shrunk in place");
        }
        Ok(Some(handle))
      }
      Ordering::Greater => {
        // Placement sees the old pages as free; the table is only touched
        // once a run is found.
        let target = self.place(geometry, new_size, Some(run))?;
        let id = self.ids.issue().ok_or(AllocError::IdsExhausted)?;

        self.table.release(run);
        self.table.claim(target, id);

        let new_handle = Handle::from_offset(geometry.page_offset(target.start));
        let src = handle.offset();
        self.arena.copy_within(src..src + cur_size, new_handle.offset());

        debug!(%id, from = %handle, to = %new_handle, pages = target.len, "grown");
        Ok(Some(new_handle))
      }
    }
  }

  fn region(
    &self,
    geometry: &Geometry,
    handle: Handle,
  ) -> Result<std::ops::Range<usize>, AllocError> {
    let run = self.live_run(geometry, handle)?;
    let start = handle.offset();
    Ok(start..start + run.len * geometry.page_size())
  }

  fn snapshot(
    &self,
    geometry: &Geometry,
  ) -> Snapshot {
    Snapshot {
      geometry: *geometry,
      contents: self.arena.to_vec(),
      reserved: self.table.reserved().collect(),
      live_allocations: self.table.live_allocations(),
      largest_free_run: self.table.largest_free_run().map_or(0, |free| free.len),
    }
  }
}

/// Page-granular allocator over a single fixed-size arena.
///
/// Every operation holds one exclusive lock for its whole duration. Handles
/// are byte offsets into the arena, validated on every use.
pub struct PageAllocator {
  geometry: Geometry,
  fault_policy: FaultPolicy,
  state: Mutex<State>,
}

impl PageAllocator {
  /// Allocator over a zeroed arena of [`Geometry::DEFAULT`], all pages free.
  pub fn new() -> Self {
    Self::with_config(AllocatorConfig::default())
  }

  pub fn with_geometry(geometry: Geometry) -> Self {
    Self::with_config(AllocatorConfig {
      geometry,
      ..AllocatorConfig::default()
    })
  }

  pub fn with_config(config: AllocatorConfig) -> Self {
    debug!(
      page_size = config.geometry.page_size(),
      page_count = config.geometry.page_count(),
      policy = ?config.fault_policy,
      "initialized page allocator"
    );

    Self {
      geometry: config.geometry,
      fault_policy: config.fault_policy,
      state: Mutex::new(State::new(&config.geometry)),
    }
  }

  pub fn geometry(&self) -> Geometry {
    self.geometry
  }

  /// Reserves `ceil(size / page_size)` contiguous pages.
  ///
  /// Placement takes the largest free run in the table, the lowest-addressed
  /// one when several tie. Contents are not zeroed.
  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<Handle, AllocError> {
    let mut state = self.state.lock();
    state.allocate(&self.geometry, size)
  }

  /// Like [`free`](Self::free), but returns an invalid handle as an error
  /// instead of faulting.
  pub fn try_free(
    &self,
    handle: Option<Handle>,
  ) -> Result<(), AllocError> {
    let Some(handle) = handle else {
      return Ok(());
    };

    let mut state = self.state.lock();
    state.free(&self.geometry, handle)
  }

  /// Releases every page of the allocation at `handle`. `None` is a no-op.
  ///
  /// # Panics
  ///
  /// A handle that does not name a live allocation (double free, foreign or
  /// misaligned offset) raises a fault per the configured [`FaultPolicy`]; with
  /// the default policy that is a panic. The lock is released first.
  pub fn free(
    &self,
    handle: Option<Handle>,
  ) {
    if let Err(err) = self.try_free(handle) {
      fault::escalate(self.fault_policy, err);
    }
  }

  /// Like [`resize`](Self::resize), but returns an invalid handle as an error
  /// instead of faulting.
  pub fn try_resize(
    &self,
    handle: Option<Handle>,
    new_size: usize,
  ) -> Result<Option<Handle>, AllocError> {
    let mut state = self.state.lock();
    state.resize(&self.geometry, handle, new_size)
  }

  /// Changes the size of an allocation.
  ///
  /// - `None` allocates `new_size` bytes.
  /// - `new_size == 0` frees `handle` and returns `Ok(None)`.
  /// - The same rounded size returns `handle` unchanged.
  /// - A smaller size keeps the leading pages and releases the rest.
  /// - A larger size allocates a new range, copies the old contents and frees
  ///   the old range. On out-of-memory the original allocation is untouched.
  ///
  /// # Panics
  ///
  /// Faults like [`free`](Self::free) when `handle` is not a live allocation.
  pub fn resize(
    &self,
    handle: Option<Handle>,
    new_size: usize,
  ) -> Result<Option<Handle>, AllocError> {
    match self.try_resize(handle, new_size) {
      Err(err) if err.is_fatal() => fault::escalate(self.fault_policy, err),
      result => result,
    }
  }

  /// Bytes usable through `handle`, a multiple of the page size. `0` for
  /// `None` or anything that is not a live allocation.
  pub fn usable_size(
    &self,
    handle: Option<Handle>,
  ) -> usize {
    let Some(handle) = handle else {
      return 0;
    };

    let state = self.state.lock();
    state
      .live_run(&self.geometry, handle)
      .map_or(0, |run| run.len * self.geometry.page_size())
  }

  /// Runs `f` over the usable bytes of the allocation.
  ///
  /// The lock is held while `f` runs; calling back into the allocator from
  /// `f` deadlocks.
  pub fn with_region<R>(
    &self,
    handle: Handle,
    f: impl FnOnce(&[u8]) -> R,
  ) -> Result<R, AllocError> {
    let state = self.state.lock();
    let range = state.region(&self.geometry, handle)?;
    Ok(f(&state.arena[range]))
  }

  /// Mutable counterpart of [`with_region`](Self::with_region).
  pub fn with_region_mut<R>(
    &self,
    handle: Handle,
    f: impl FnOnce(&mut [u8]) -> R,
  ) -> Result<R, AllocError> {
    let mut state = self.state.lock();
    let range = state.region(&self.geometry, handle)?;
    Ok(f(&mut state.arena[range]))
  }

  /// Copies `bytes` into the allocation starting `at` bytes in.
  pub fn write(
    &self,
    handle: Handle,
    at: usize,
    bytes: &[u8],
  ) -> Result<(), AllocError> {
    self.with_region_mut(handle, |region| -> Result<(), AllocError> {
      let usable = region.len();
      let end = at
        .checked_add(bytes.len())
        .filter(|end| *end <= usable)
        .ok_or(AllocError::RegionOverflow {
          at,
          len: bytes.len(),
          usable,
        })?;

      region[at..end].copy_from_slice(bytes);
      Ok(())
    })?
  }

  /// Copy of the allocation's usable bytes.
  pub fn read(
    &self,
    handle: Handle,
  ) -> Result<Vec<u8>, AllocError> {
    self.with_region(handle, <[u8]>::to_vec)
  }

  /// Copies the arena and page table under the lock.
  pub fn snapshot(&self) -> Snapshot {
    let state = self.state.lock();
    state.snapshot(&self.geometry)
  }

  /// Writes the diagnostics report to `out`.
  pub fn dump_diagnostics<W: io::Write>(
    &self,
    out: &mut W,
  ) -> io::Result<()> {
    let snapshot = self.snapshot();
    write!(out, "{snapshot}")
  }

  /// Prints the diagnostics report to stdout.
  pub fn print_stats(&self) {
    let _ = self.dump_diagnostics(&mut io::stdout().lock());
  }
}

impl Default for PageAllocator {
  fn default() -> Self {
    Self::new()
  }
}
