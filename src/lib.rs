//! Stackful, asymmetric, cooperative coroutines.
//!
//! Each coroutine owns a full call stack, so it can suspend and resume from
//! any nesting depth while its locals keep their values. Only one coroutine
//! in a lineage runs at any instant; control moves between a parent and one
//! of its immediate children through an explicit context switch, never
//! through a scheduler. A switch costs a handful of instructions, which
//! makes the crate usable from hard-realtime callbacks where a kernel
//! thread hand-off would blow the deadline.
//!
//! A parent and a child are paired by a [`Channel`]: a small record holding
//! the suspended party's execution context and a single-slot rendezvous
//! cell. The record lives at the high end of the child's own stack block, so
//! its lifetime is exactly the lifetime of that block.
//!
//! # Examples
//!
//! ### Generator
//! The child repeatedly passes data up; the parent consumes until the child
//! returns, which surfaces as `None`.
//! ```
//! use core::ptr::NonNull;
//! use switchback::{create, recv, yield_to, Channel, Payload};
//!
//! fn naturals(parent: NonNull<Channel>, _arg: Payload) {
//!     for num in 0..4usize {
//!         unsafe { yield_to(parent, Some(NonNull::from(&num).cast())) };
//!     }
//! }
//!
//! let child = unsafe { create(naturals, None) };
//!
//! let mut sum = 0;
//! while let Some(datum) = unsafe { recv(child) } {
//!     sum += unsafe { *datum.cast::<usize>().as_ptr() };
//! }
//! assert_eq!(sum, 6);
//! ```
//!
//! ### Caller-supplied stack
//! On targets without an allocator, the caller provides the stack block and
//! must keep it alive for as long as the channel is in use.
//! ```
//! use core::ptr::NonNull;
//! use switchback::{close_and_join, create_given_memory, Channel, Payload};
//!
//! fn idle(_parent: NonNull<Channel>, _arg: Payload) {}
//!
//! let mut block = [0u8; 32 * 1024];
//! let child = unsafe {
//!     create_given_memory(idle, None, NonNull::new(block.as_mut_ptr()).unwrap(), block.len())
//! };
//! unsafe { close_and_join(child) };
//! ```
//!
//! # Safety model
//!
//! The operations are primitives: misuse (switching into a channel after its
//! block was reclaimed, transferring from a coroutine that is not one of the
//! channel's two parties, overflowing a stack sized too small) is undefined
//! behavior and is not detected. Every entry point is `unsafe` and documents
//! its contract. A panic that escapes a child's entry function aborts the
//! process.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

mod backend;
mod channel;
#[cfg(all(feature = "std", unix))]
mod stack;

pub use channel::{
    close_and_join, create_given_memory, recv, switch, yield_to, Channel, Entry, Payload,
    CHANNEL_SIZE,
};

#[cfg(all(feature = "std", unix))]
pub use channel::create;

/// Alignment of the channel record within its stack block.
///
/// [`create_given_memory`] aligns the record (and therefore the top of the
/// child stack) down to this boundary. Callers reserving static storage
/// should size blocks as [`CHANNEL_SIZE`] `+ STACK_ALIGNMENT` plus the
/// child's worst-case stack depth.
pub const STACK_ALIGNMENT: usize = backend::STACK_ALIGNMENT;
