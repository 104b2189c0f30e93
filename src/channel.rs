//! The parent/child rendezvous record and the operations on it.
//!
//! A channel's identity is its address: the record is created inside the
//! child's stack block and the parent keeps the only long-lived pointer to
//! it. At any moment the record holds the execution context of whichever of
//! the two parties is suspended, plus a single-slot cell through which the
//! parties exchange one pointer-sized datum per switch.

use core::cell::Cell;
use core::mem;
use core::ptr::{self, NonNull};

use crate::backend;

/// A pointer-sized datum carried through the rendezvous cell.
///
/// `None` is the end-of-stream marker: a parent sends it to tell a child to
/// wind down, and [`recv`] returns it once the peer has terminated. It is
/// never a user datum.
pub type Payload = Option<NonNull<()>>;

/// A child coroutine's top-level function.
///
/// Receives the channel back to its parent and the argument the parent
/// passed at creation. Returning from this function terminates the child.
pub type Entry = fn(NonNull<Channel>, Payload);

/// Contents of the rendezvous cell.
///
/// `Empty` means the receiver has taken the previous datum and the sender
/// has not yet placed a new one. `Filled(None)` is the end-of-stream token.
#[derive(Debug, Copy, Clone)]
pub(crate) enum Slot {
    Empty,
    Filled(Payload),
}

/// How to give a dynamically allocated stack block back, recorded by the
/// allocating constructor and run once the child has terminated.
#[derive(Copy, Clone)]
pub(crate) struct Release {
    pub(crate) block: *mut u8,
    pub(crate) len: usize,
    pub(crate) release: unsafe fn(*mut u8, usize),
}

/// The rendezvous object pairing a parent coroutine with one child.
///
/// Plain data; both parties reach it by pointer. The record lives at the
/// high end of the child's stack block, aligned down to
/// [`STACK_ALIGNMENT`](crate::STACK_ALIGNMENT), with the child's stack
/// growing away from it.
#[repr(C)]
pub struct Channel {
    // Must stay the first field: the native backend addresses the context
    // area through the channel pointer.
    pub(crate) context: backend::Context,
    pub(crate) entry: Cell<Option<Entry>>,
    pub(crate) value: Cell<Slot>,
    pub(crate) release: Cell<Option<Release>>,
}

/// Size of the channel record, for sizing statically reserved blocks passed
/// to [`create_given_memory`].
pub const CHANNEL_SIZE: usize = mem::size_of::<Channel>();

/// Body of the springboard: runs on the fresh child stack, pulls the
/// argument out of the rendezvous cell, runs the child to completion, and
/// marks the channel terminated. The backend wraps this with its own final
/// one-way transfer back to the parent.
pub(crate) unsafe fn run_child(ch: *mut Channel) {
    let channel = &*ch;

    let arg = match channel.value.replace(Slot::Empty) {
        Slot::Filled(payload) => payload,
        Slot::Empty => None,
    };

    let entry = channel.entry.get().expect("springboard entered twice");
    entry(NonNull::new_unchecked(ch), arg);

    // The parent may be blocked in `recv` watching for this.
    channel.entry.set(None);
}

/// Starts `entry` as a child coroutine whose stack lives in `block`.
///
/// The channel record is placed at the aligned high end of the block; the
/// child's stack grows downward from just below it. The child runs until its
/// first transfer back to the parent, at which point this returns the
/// channel pointer.
///
/// # Safety
///
/// `block` must be valid for reads and writes for `len` bytes, must outlive
/// every use of the returned channel, and `len` must cover the record plus
/// the deepest call chain the child will run. Stack overflow inside the
/// child is not detected.
pub unsafe fn create_given_memory(
    entry: Entry,
    arg: Payload,
    block: NonNull<u8>,
    len: usize,
) -> NonNull<Channel> {
    let base = block.as_ptr() as usize;
    debug_assert!(len > CHANNEL_SIZE + crate::STACK_ALIGNMENT);

    // Position the record at the top of the block, respecting alignment.
    let addr = (base + len - CHANNEL_SIZE) & !(crate::STACK_ALIGNMENT - 1);
    let ch = addr as *mut Channel;

    ptr::write(
        ch,
        Channel {
            context: backend::Context::new(),
            entry: Cell::new(Some(entry)),
            value: Cell::new(Slot::Filled(arg)),
            release: Cell::new(None),
        },
    );

    backend::bootstrap(ch, block.as_ptr());

    // Control flow returns here via the child's first transfer.
    NonNull::new_unchecked(ch)
}

/// Starts `entry` as a child coroutine on a freshly mapped 512 KiB stack.
///
/// The stack is guard-paged, so overflow faults instead of silently
/// corrupting neighboring memory. The mapping is reclaimed automatically
/// when the parent observes termination (inside [`recv`] or
/// [`close_and_join`]). Allocation failure is fatal.
///
/// # Safety
///
/// The returned channel must not be used after the parent has observed
/// termination, and only the channel's two parties may operate on it.
#[cfg(all(feature = "std", unix))]
pub unsafe fn create(entry: Entry, arg: Payload) -> NonNull<Channel> {
    let (block, len) = crate::stack::map().expect("failed to map coroutine stack");

    let ch = create_given_memory(entry, arg, block, len);
    ch.as_ref().release.set(Some(Release {
        block: block.as_ptr(),
        len,
        release: crate::stack::unmap,
    }));

    ch
}

/// Places `payload` in the rendezvous cell and transfers control to the
/// peer. Returns when the peer transfers back.
///
/// `None` is the end-of-stream marker; a well-behaved peer reacts to it by
/// falling out of its consume loop and returning.
///
/// # Safety
///
/// The caller must be one of the channel's two parties and the channel's
/// block must still be live.
pub unsafe fn yield_to(ch: NonNull<Channel>, payload: Payload) {
    ch.as_ref().value.set(Slot::Filled(payload));
    backend::swap(ch.as_ptr());
}

/// Takes the next datum from the peer, blocking (by transferring control)
/// until one is available.
///
/// Returns `None` once the peer has terminated; at that point any backing
/// memory recorded by [`create`] has been reclaimed and the channel pointer
/// must not be used again.
///
/// # Safety
///
/// The caller must be one of the channel's two parties and the channel's
/// block must still be live.
pub unsafe fn recv(ch: NonNull<Channel>) -> Payload {
    let channel = ch.as_ref();

    if channel.entry.get().is_some() && matches!(channel.value.get(), Slot::Empty) {
        backend::swap(ch.as_ptr());
    }

    // The peer either deposited a datum or terminated while we were away.
    if channel.entry.get().is_none() {
        backend::retire(ch.as_ptr());
        if let Some(hook) = channel.release.take() {
            (hook.release)(hook.block, hook.len);
        }
        return None;
    }

    match channel.value.replace(Slot::Empty) {
        Slot::Filled(payload) => payload,
        Slot::Empty => None,
    }
}

/// Tells a child awaiting input that no more is coming, then reclaims it.
///
/// Feeds the child end-of-stream markers until it returns, then runs the
/// release hook if any. Terminates because a well-behaved child exits its
/// consume loop on the first `None`. Safe to call on a channel whose child
/// has already terminated but not yet been released.
///
/// # Safety
///
/// The caller must be the channel's parent and the channel's block must
/// still be live.
pub unsafe fn close_and_join(ch: NonNull<Channel>) {
    while ch.as_ref().entry.get().is_some() {
        yield_to(ch, None);
    }

    backend::retire(ch.as_ptr());
    if let Some(hook) = ch.as_ref().release.take() {
        (hook.release)(hook.block, hook.len);
    }
}

/// Raw hand-off: transfers control to the peer without touching the
/// rendezvous cell. Does nothing if the child has already terminated.
///
/// # Safety
///
/// The caller must be one of the channel's two parties and the channel's
/// block must still be live.
pub unsafe fn switch(ch: NonNull<Channel>) {
    if ch.as_ref().entry.get().is_some() {
        backend::swap(ch.as_ptr());
    }
}
