//! Stack growth for the recursive passes.
//!
//! The parser, resolver, evaluator and printer all recurse once per nesting
//! level of the source.  Wrapping those entry points in
//! [`ensure_sufficient_stack`] moves the work onto a fresh heap-allocated
//! segment whenever less than [`RED_ZONE`] bytes remain, so deeply nested
//! programs run on threads with small default stacks.

/// Remaining stack below which a new segment is allocated.
pub const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated segment.
pub const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
