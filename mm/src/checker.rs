//! Heap integrity checker.
//!
//! Debug-only consistency checks over an [`Allocator`]'s state: every free
//! block classified into the right bucket, headers and footers agreeing,
//! no two adjacent free blocks (a missed coalesce), no free-list link
//! pointing at its own owner. None of this runs on the fast path; it exists
//! to catch a broken invariant near where it was introduced rather than
//! three allocations later.

use segalloc_lib::klog_error;

use crate::alloc::Allocator;
use crate::block;
use crate::error::IntegrityError;
use crate::free_list::{self, NUM_CLASSES, bucket};
use crate::heap::HeapProvider;

impl<P: HeapProvider> Allocator<P> {
    /// Walk every segregated list and verify each member is tagged free,
    /// agrees with its own footer, classifies into the list it's in, and
    /// doesn't link to itself.
    pub fn check_free_lists(&self) -> Result<(), IntegrityError> {
        for idx in 0..NUM_CLASSES {
            let mut cur = self.lists().head(idx);
            while cur != 0 {
                let bp = unsafe { self.base().add(cur as usize) };

                if unsafe { !block::tags_agree(bp) } {
                    return Err(IntegrityError::HeaderFooterMismatch { bp: bp as usize });
                }
                if unsafe { block::is_allocated(bp) } {
                    return Err(IntegrityError::AllocatedInFreeList { bp: bp as usize });
                }
                let size = unsafe { block::block_size(bp) };
                let expected = bucket(size);
                if expected != idx {
                    return Err(IntegrityError::MisclassifiedBucket {
                        bp: bp as usize,
                        list: idx,
                        expected,
                    });
                }

                let next = unsafe { free_list::get_next(bp) };
                let prev = unsafe { free_list::get_prev(bp) };
                if next == cur || prev == cur {
                    return Err(IntegrityError::SelfReferencingLink { bp: bp as usize });
                }
                cur = next;
            }
        }
        Ok(())
    }

    /// Walk the heap block-by-block from the first real block (just past
    /// the prologue) to the epilogue, verifying tags and that no two
    /// consecutive blocks are both free.
    pub fn check_heap(&self) -> Result<(), IntegrityError> {
        let mut bp = unsafe { self.base().add(2 * block::WSIZE) };
        let mut prev_free: Option<*mut u8> = None;

        loop {
            let size = unsafe { block::block_size(bp) };
            if size == 0 {
                break; // epilogue
            }
            if unsafe { !block::tags_agree(bp) } {
                return Err(IntegrityError::HeaderFooterMismatch { bp: bp as usize });
            }

            let is_free = unsafe { !block::is_allocated(bp) };
            if is_free {
                if let Some(prev_bp) = prev_free {
                    return Err(IntegrityError::AdjacentFreeBlocks {
                        first: prev_bp as usize,
                        second: bp as usize,
                    });
                }
                prev_free = Some(bp);
            } else {
                prev_free = None;
            }

            bp = unsafe { block::next_blkp(bp) };
        }
        Ok(())
    }

    /// Run both checks; in debug builds, log and panic on the first
    /// violation found. Compiles to nothing meaningful to call in release
    /// builds beyond the two checks themselves, so callers gate the call
    /// site with `cfg!(debug_assertions)` rather than relying on this
    /// function to no-op.
    pub fn assert_consistent(&self) {
        if let Err(e) = self.check_free_lists() {
            klog_error!("segalloc: free-list integrity violation: {}", e);
            if cfg!(debug_assertions) {
                panic!("free-list integrity violation: {}", e);
            }
        }
        if let Err(e) = self.check_heap() {
            klog_error!("segalloc: heap integrity violation: {}", e);
            if cfg!(debug_assertions) {
                panic!("heap integrity violation: {}", e);
            }
        }
    }
}
