use std::io::Read;

use pagealloc::{AllocError, PageAllocator};
use tracing_subscriber::EnvFilter;

/// Waits until the user presses ENTER when `--pause` was given.
/// Useful for following the allocation table step by step.
fn block_until_enter_pressed(pause: bool) {
  if !pause {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn main() -> Result<(), AllocError> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let pause = std::env::args().any(|arg| arg == "--pause");

  // 12 pages of 32 bytes, all free and zeroed.
  let allocator = PageAllocator::new();
  allocator.print_stats();
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 1) Allocate 40 bytes: rounds up to two pages at the start of the arena.
  // --------------------------------------------------------------------
  let first = allocator.allocate(40)?;
  allocator.write(first, 0, b"first allocation, two pages long")?;
  println!(
    "\n[1] allocate(40) -> {first}, usable {}",
    allocator.usable_size(Some(first))
  );
  allocator.print_stats();
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 2) Allocate 100 bytes: four pages, right after the first block.
  // --------------------------------------------------------------------
  let second = allocator.allocate(100)?;
  allocator.write(second, 0, b"second allocation")?;
  println!(
    "\n[2] allocate(100) -> {second}, usable {}",
    allocator.usable_size(Some(second))
  );
  allocator.print_stats();
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 3) Shrink the second block to one page; the tail goes back to the table.
  // --------------------------------------------------------------------
  let second = allocator.resize(Some(second), 20)?.unwrap_or(second);
  println!(
    "\n[3] resize({second}, 20), usable {}",
    allocator.usable_size(Some(second))
  );
  allocator.print_stats();
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 4) Grow the first block to five pages. It no longer fits where it is,
  //    so it is copied into the largest free run.
  // --------------------------------------------------------------------
  let grown = allocator.resize(Some(first), 150)?.unwrap_or(first);
  println!(
    "\n[4] resize({first}, 150) -> {grown}, usable {}",
    allocator.usable_size(Some(grown))
  );
  allocator.print_stats();
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 5) Ask for more than is left: fails without touching anything.
  // --------------------------------------------------------------------
  match allocator.allocate(300) {
    Ok(handle) => println!("\n[5] allocate(300) -> {handle}"),
    Err(err) => println!("\n[5] allocate(300) failed: {err}"),
  }

  // --------------------------------------------------------------------
  // 6) A double free is a fault. `try_free` reports it instead.
  // --------------------------------------------------------------------
  allocator.free(Some(second));
  match allocator.try_free(Some(second)) {
    Ok(()) => println!("[6] second free accepted?"),
    Err(err) => println!("[6] second free rejected: {err}"),
  }

  // --------------------------------------------------------------------
  // 7) Release everything.
  // --------------------------------------------------------------------
  allocator.resize(Some(grown), 0)?;
  allocator.free(None);
  println!("\n[7] all released");
  allocator.print_stats();

  Ok(())
}
