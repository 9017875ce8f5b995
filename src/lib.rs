//! # pagealloc - A Page-Granular Arena Allocator
//!
//! This crate provides a **page allocator** over a single fixed-size byte arena.
//! The arena is carved into equal pages; every allocation is a contiguous run
//! of whole pages, and a page table records which allocation owns each page.
//!
//! ## Overview
//!
//! ```text
//!   Arena (12 pages x 32 bytes):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              ARENA                                   │
//!   │                                                                      │
//!   │   ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┬───┐  │
//!   │   │ A1  │ A1  │ A2  │ A2  │ A2  │ A2  │     │     │     │     │...│  │
//!   │   └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┴───┘  │
//!   │     ▲           ▲                       └──── largest free run ────┘ │
//!   │     │           │                                                    │
//!   │   handle      handle                                                 │
//!   │   0x0000      0x0040                                                 │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Page table:   [ 1 | 1 | 2 | 2 | 2 | 2 | - | - | - | - | - | - ]
//! ```
//!
//! Allocation always takes the **largest** free run, and the lowest-addressed
//! one when several runs share that length.
//!
//! ## Crate Structure
//!
//! ```text
//!   pagealloc
//!   ├── align      - Page rounding macros (pages_for!, page_align!)
//!   ├── error      - AllocError, GeometryError
//!   ├── fault      - Escalation of invalid-handle faults
//!   ├── geometry   - Page size / page count, AllocatorConfig
//!   ├── handle     - Checked arena offsets
//!   ├── page       - PageAllocator implementation
//!   ├── stats      - Diagnostics snapshot
//!   └── table      - Page ownership table and run search
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use pagealloc::PageAllocator;
//!
//! let allocator = PageAllocator::new();
//!
//! let handle = allocator.allocate(40).unwrap();
//! assert_eq!(allocator.usable_size(Some(handle)), 64);
//!
//! allocator.write(handle, 0, b"hello").unwrap();
//!
//! let handle = allocator.resize(Some(handle), 100).unwrap().unwrap();
//! assert_eq!(&allocator.read(handle).unwrap()[..5], b"hello");
//!
//! allocator.free(Some(handle));
//! ```
//!
//! ## Resize
//!
//! ```text
//!   shrink:   [ 7 | 7 | 7 | 7 ]  ->  [ 7 | 7 | - | - ]   same handle
//!
//!   grow:     [ 7 | 7 | - | - | 3 ]  ->  [ 8 | 8 | 8 | 8 | 3 ]   same handle
//!
//!             [ 7 | 7 | 3 | - | - | - ]
//!                      │
//!                      ▼  place, copy, release
//!             [ - | - | 3 | 8 | 8 | 8 ]                 new handle
//! ```
//!
//! A grow searches the table as if its own pages were already free, so it
//! stays in place when the run around it is the best fit. A grow that cannot
//! find room fails with [`AllocError::OutOfMemory`] and the original
//! allocation stays as it was.
//!
//! ## Faults
//!
//! Freeing or resizing through a handle that is not a live allocation (double
//! free, foreign or misaligned offset) is a contract violation. It is raised
//! as a fatal fault per [`FaultPolicy`] after the allocator lock is released.
//! `try_free` and `try_resize` return it as an error instead.
//!
//! ## Limitations
//!
//! - **Fixed size**: the arena never grows
//! - **Page granularity**: the smallest allocation is one page
//! - **One lock**: every operation serializes on a single mutex

pub mod align;
mod error;
mod fault;
mod geometry;
mod handle;
mod page;
mod stats;
mod table;

pub use error::{AllocError, GeometryError, InvalidHandleReason};
pub use fault::FaultPolicy;
pub use geometry::{AllocatorConfig, DEFAULT_PAGE_COUNT, DEFAULT_PAGE_SIZE, Geometry};
pub use handle::Handle;
pub use page::PageAllocator;
pub use stats::{PLACEHOLDER, Snapshot, printable};
