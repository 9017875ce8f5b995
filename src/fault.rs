//! Escalation of contract violations.
//!
//! Freeing or resizing through a handle that does not name a live allocation
//! is never silently ignored. The allocator releases its lock first and then
//! hands the error to [`escalate`], which terminates the offending path
//! according to the configured [`FaultPolicy`].

use libc::{SIGSEGV, raise};

use crate::error::AllocError;

/// How an invalid-handle fault is raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FaultPolicy {
  /// Panic the calling thread.
  #[default]
  Panic,
  /// Abort the process.
  Abort,
  /// Raise `SIGSEGV` on the calling thread, as a protection violation would.
  Signal,
}

/// Raises the fault for `err`. Never returns.
#[cold]
#[track_caller]
pub(crate) fn escalate(
  policy: FaultPolicy,
  err: AllocError,
) -> ! {
  tracing::error!(error = %err, ?policy, "invalid handle fault");

  match policy {
    FaultPolicy::Panic => panic!("page allocator fault: {err}"),
    FaultPolicy::Abort => std::process::abort(),
    FaultPolicy::Signal => {
      // A handler may return; the path still must not continue.
      unsafe {
        raise(SIGSEGV);
      }
      std::process::abort()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::InvalidHandleReason;

  #[test]
  #[should_panic(expected = "page allocator fault: invalid handle at offset 32")]
  fn test_panic_policy() {
    escalate(
      FaultPolicy::Panic,
      AllocError::invalid(32, InvalidHandleReason::FreePage),
    );
  }

  #[test]
  fn test_default_policy_panics() {
    assert_eq!(FaultPolicy::default(), FaultPolicy::Panic);
  }
}
