//! Pluggable context-switch backends.
//!
//! Every backend provides the same four things: a `Context` type embedded in
//! the channel record, `bootstrap` (create a child execution context rooted
//! at a stack block and enter it), `swap` (trade the running context for the
//! saved one), and `retire` (tear down whatever per-coroutine state remains
//! once the child has terminated). Programs that obey the API contract
//! cannot tell the backends apart, other than by timing.
//!
//! The default is the native assembly backend. The `threads` and `ucontext`
//! features substitute the portable fallbacks, which trade switch latency
//! for not needing per-architecture assembly.

#[cfg(feature = "threads")]
mod thread;
#[cfg(feature = "threads")]
pub(crate) use thread::{bootstrap, retire, swap, Context, STACK_ALIGNMENT};

#[cfg(all(feature = "ucontext", not(feature = "threads")))]
mod ucontext;
#[cfg(all(feature = "ucontext", not(feature = "threads")))]
pub(crate) use ucontext::{bootstrap, retire, swap, Context, STACK_ALIGNMENT};

#[cfg(not(any(feature = "threads", feature = "ucontext")))]
mod native;
#[cfg(not(any(feature = "threads", feature = "ucontext")))]
pub(crate) use native::{bootstrap, retire, swap, Context, STACK_ALIGNMENT};
