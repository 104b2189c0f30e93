//! OS-context fallback backend.
//!
//! Binds the platform's `getcontext`/`makecontext`/`swapcontext` API instead
//! of carrying per-architecture assembly. The inactive party's `ucontext_t`
//! lives on its own stack rather than inside the channel, keeping the record
//! small. Switch cost rises (some libcs also save the signal mask), but the
//! observable semantics are identical to the native backend.

use std::cell::Cell;
use std::{mem, ptr};

use crate::channel::{self, Channel};

pub(crate) const STACK_ALIGNMENT: usize = 64;

pub(crate) struct Context {
    /// Whichever `ucontext_t` should be swapped to on the next transfer.
    inactive: Cell<*mut libc::ucontext_t>,
}

impl Context {
    pub(crate) fn new() -> Self {
        Context {
            inactive: Cell::new(ptr::null_mut()),
        }
    }
}

unsafe fn swap_symmetric(ch: *mut Channel) {
    let mut resume_here: libc::ucontext_t = mem::zeroed();
    let previous = (*ch).context.inactive.replace(&mut resume_here);
    libc::swapcontext(&mut resume_here, previous);
}

extern "C" fn springboard(hi: libc::c_uint, lo: libc::c_uint) {
    // makecontext arguments are ints, so the channel pointer travels split.
    let addr = ((hi as usize) << 16 << 16) | lo as usize;
    let ch = addr as *mut Channel;

    unsafe {
        channel::run_child(ch);

        // Jump out of this context forever. uc_link is no substitute: where
        // the parent waits was not yet known when the context was made.
        libc::setcontext((*ch).context.inactive.get());
    }
    unreachable!("terminated coroutine resumed");
}

pub(crate) unsafe fn bootstrap(ch: *mut Channel, stack_base: *mut u8) {
    let mut target: libc::ucontext_t = mem::zeroed();
    libc::getcontext(&mut target);
    target.uc_stack.ss_sp = stack_base as *mut libc::c_void;
    target.uc_stack.ss_size = ch as usize - stack_base as usize;
    target.uc_stack.ss_flags = 0;

    let addr = ch as usize;
    let entry: extern "C" fn() =
        mem::transmute(springboard as extern "C" fn(libc::c_uint, libc::c_uint));
    libc::makecontext(
        &mut target,
        entry,
        2,
        ((addr >> 16) >> 16) as libc::c_uint,
        addr as libc::c_uint,
    );

    (*ch).context.inactive.set(&mut target);
    swap_symmetric(ch);
}

pub(crate) unsafe fn swap(ch: *mut Channel) {
    swap_symmetric(ch);
}

pub(crate) unsafe fn retire(_ch: *mut Channel) {}
