//! Stack memory for the allocating constructor.
//!
//! Each dynamically created coroutine gets one anonymous mapping: a guard
//! page at the low end, in the path of downward growth, and the usable
//! stack above it. Nothing here owns the block past creation; the mapping
//! travels through the channel's release hook and comes back to [`unmap`]
//! once the parent has observed termination.

use std::io;
use std::ptr::{self, NonNull};

/// Usable stack space above the guard page.
const USABLE_BYTES: usize = 512 * 1024;

fn page_size() -> usize {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

/// Maps a fresh stack block, guard page included and already protected.
/// Physical pages are only committed as the child actually recurses.
///
/// The block must be handed to [`unmap`] exactly once; the channel's
/// release hook is the one place that does so.
pub(crate) fn map() -> io::Result<(NonNull<u8>, usize)> {
    let page = page_size();
    let len = USABLE_BYTES.div_ceil(page) * page + page;

    let base = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if base == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }

    if unsafe { libc::mprotect(base, page, libc::PROT_NONE) } == -1 {
        let failure = io::Error::last_os_error();
        unsafe { unmap(base as *mut u8, len) };
        return Err(failure);
    }

    Ok((unsafe { NonNull::new_unchecked(base as *mut u8) }, len))
}

/// Release-hook counterpart to [`map`].
pub(crate) unsafe fn unmap(block: *mut u8, len: usize) {
    let rc = libc::munmap(block as *mut libc::c_void, len);
    debug_assert_eq!(rc, 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_covers_default_stack_plus_guard() {
        let (block, len) = map().unwrap();

        assert!(len > USABLE_BYTES);
        assert_eq!(len % page_size(), 0);

        unsafe { unmap(block.as_ptr(), len) };
    }

    #[test]
    fn top_of_block_holds_the_channel_record() {
        let (block, len) = map().unwrap();

        // the record goes at the high end; that memory must be usable
        unsafe {
            let top = block.as_ptr().add(len);
            top.sub(1).write(0x5a);
            assert_eq!(top.sub(1).read(), 0x5a);

            unmap(block.as_ptr(), len);
        }
    }

    #[test]
    fn survives_a_map_unmap_churn() {
        for _ in 0..64 {
            let (block, len) = map().unwrap();
            unsafe { unmap(block.as_ptr(), len) };
        }
    }

    #[test]
    #[ignore = "faults the process by design"]
    fn guard_page_rejects_writes() {
        let (block, _len) = map().unwrap();

        unsafe { block.as_ptr().write(0x5a) };
    }
}
