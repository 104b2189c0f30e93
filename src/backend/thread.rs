//! Kernel-thread fallback backend.
//!
//! Runs each coroutine on a dedicated thread and implements `swap` as a
//! token hand-off under a per-channel mutex, so exactly one of the two
//! parties runs at any instant. Round-trip cost is orders of magnitude above
//! the native backend and hard-realtime bounds are gone, but any program
//! that obeys the API contract behaves identically.

use std::cell::Cell;
use std::sync::{Condvar, Mutex};
use std::thread;

use crate::channel::{self, Channel};

pub(crate) const STACK_ALIGNMENT: usize = 64;

/// Stack size given to each coroutine thread.
const THREAD_STACK_BYTES: usize = 512 * 1024;

pub(crate) struct Context {
    /// Binary tokens standing in for a pair of counting semaphores; strict
    /// alternation means at most one post is ever outstanding.
    turn: Mutex<[bool; 2]>,
    handed_over: Condvar,
    in_child: Cell<bool>,
    thread: Cell<Option<thread::JoinHandle<()>>>,
}

impl Context {
    pub(crate) fn new() -> Self {
        Context {
            turn: Mutex::new([false; 2]),
            handed_over: Condvar::new(),
            in_child: Cell::new(true),
            thread: Cell::new(None),
        }
    }

    fn post(&self, token: usize) {
        let mut turn = self.turn.lock().unwrap();
        turn[token] = true;
        self.handed_over.notify_all();
    }

    fn wait(&self, token: usize) {
        let mut turn = self.turn.lock().unwrap();
        while !turn[token] {
            turn = self.handed_over.wait(turn).unwrap();
        }
        turn[token] = false;
    }
}

struct SendPtr(*mut Channel);

// SAFETY: the token hand-off guarantees the two threads never touch the
// record at the same time, and every hand-off synchronizes through the
// channel's mutex.
unsafe impl Send for SendPtr {}

fn springboard(ch: SendPtr) {
    let ch = ch.0;
    unsafe {
        channel::run_child(ch);

        // The parent may be blocked in its last transfer; let it go.
        (*ch).context.post(0);
    }
}

pub(crate) unsafe fn bootstrap(ch: *mut Channel, _stack_base: *mut u8) {
    let springboard_channel = SendPtr(ch);

    let handle = thread::Builder::new()
        .stack_size(THREAD_STACK_BYTES)
        .spawn(move || springboard(springboard_channel))
        .expect("failed to spawn coroutine thread");

    let context = &(*ch).context;
    context.thread.set(Some(handle));

    // The child runs immediately; block until its first transfer back.
    context.wait(0);
}

pub(crate) unsafe fn swap(ch: *mut Channel) {
    let context = &(*ch).context;
    let in_child_at_entry = context.in_child.get();
    context.in_child.set(!in_child_at_entry);

    context.post(usize::from(!in_child_at_entry));
    context.wait(usize::from(in_child_at_entry));
}

pub(crate) unsafe fn retire(ch: *mut Channel) {
    if let Some(handle) = (*ch).context.thread.take() {
        let _ = handle.join();
    }
}
