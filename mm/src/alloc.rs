//! Allocation and reallocation policy, tied together with the heap layout
//! manager, the segregated free-list index, and the coalescer into a single
//! [`Allocator`].
//!
//! The allocator is generic over [`HeapProvider`] and holds no global state
//! of its own — callers that want process-wide single-heap semantics wrap
//! one instance behind whatever synchronization their environment needs
//! (see `segalloc-userland` for the C-ABI-flavored wrapper).

use segalloc_lib::{align_up_usize, klog_debug, klog_warn};

use crate::block::{self, DSIZE, MIN_BLOCK_SIZE, WSIZE};
use crate::error::{AllocError, AllocResult};
use crate::free_list::{self, FreeLists, NUM_CLASSES, bucket};
use crate::heap::HeapProvider;

/// Bytes requested from the heap provider when no free block is large
/// enough and a bucket-by-bucket search has already failed.
const CHUNK: usize = 4096;

/// Running counters, purely observational — nothing in the allocation path
/// depends on them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocatorStats {
    pub allocate_calls: u64,
    pub free_calls: u64,
    pub reallocate_calls: u64,
    pub heap_extensions: u64,
    pub live_bytes: u64,
}

/// A segregated free-list allocator over a single contiguous heap.
pub struct Allocator<P: HeapProvider> {
    provider: P,
    /// Address of the prologue block's bp. Free-list links are stored as
    /// 4-byte offsets relative to this address.
    base: *mut u8,
    lists: FreeLists,
    stats: AllocatorStats,
}

impl<P: HeapProvider> Allocator<P> {
    /// Construct a new allocator, initializing the heap through `provider`.
    pub fn new(provider: P) -> AllocResult<Self> {
        let mut this = Self {
            provider,
            base: core::ptr::null_mut(),
            lists: FreeLists::new(),
            stats: AllocatorStats::default(),
        };
        this.initialize()?;
        Ok(this)
    }

    /// (Re-)lay out the heap: prologue, epilogue, and an initial chunk.
    ///
    /// Idempotent from the caller's point of view — running it again
    /// resets the allocator's own bookkeeping, though the underlying
    /// `HeapProvider` is not rewound (that is its own concern; see §5 of
    /// the design notes this crate follows).
    pub fn initialize(&mut self) -> AllocResult<()> {
        self.lists = FreeLists::new();
        self.stats = AllocatorStats::default();

        let prefix = self
            .provider
            .heap_extend(4 * WSIZE)
            .ok_or(AllocError::OutOfMemory)?;
        unsafe {
            block::put_word(prefix, 0); // alignment pad
            block::put_word(prefix.add(WSIZE), block::pack(DSIZE, true)); // prologue header
            block::put_word(prefix.add(2 * WSIZE), block::pack(DSIZE, true)); // prologue footer
            block::set_epilogue(prefix.add(3 * WSIZE)); // epilogue header
        }
        self.base = unsafe { prefix.add(2 * WSIZE) };
        klog_debug!("segalloc: heap initialized, base={:p}", self.base);

        self.extend_heap(CHUNK / WSIZE)?;
        Ok(())
    }

    // -- offset <-> pointer -------------------------------------------------

    fn offset_of(&self, bp: *mut u8) -> u32 {
        (bp as usize - self.base as usize) as u32
    }

    fn ptr_of(&self, offset: u32) -> *mut u8 {
        unsafe { self.base.add(offset as usize) }
    }

    // -- heap layout manager --------------------------------------------------

    /// Request more memory from the provider and fold it into the free-list
    /// index as a single new free block.
    fn extend_heap(&mut self, words: usize) -> AllocResult<*mut u8> {
        let words = if words % 2 != 0 { words + 1 } else { words };
        let size = words * WSIZE;

        let bp = self
            .provider
            .heap_extend(size)
            .ok_or(AllocError::OutOfMemory)?;
        unsafe {
            block::set_tags(bp, size, false);
            block::set_epilogue(block::next_blkp(bp));
        }
        self.stats.heap_extensions += 1;
        klog_debug!("segalloc: extended heap by {} bytes", size);
        Ok(unsafe { self.insert_free_block(bp) })
    }

    // -- segregated free-list index ------------------------------------------

    /// Coalesce `bp` with its free neighbors, then push the result onto the
    /// front of its bucket's list.
    unsafe fn insert_free_block(&mut self, bp: *mut u8) -> *mut u8 {
        let bp = unsafe { self.coalesce(bp) };
        let size = unsafe { block::block_size(bp) };
        let idx = bucket(size);

        let head = self.lists.head(idx);
        unsafe {
            free_list::set_prev(bp, 0);
            free_list::set_next(bp, head);
        }
        if head != 0 {
            let head_bp = self.ptr_of(head);
            unsafe { free_list::set_prev(head_bp, self.offset_of(bp)) };
        }
        self.lists.set_head(idx, self.offset_of(bp));
        bp
    }

    /// Splice `bp` out of the list its own size classifies it into.
    unsafe fn remove_free_block(&mut self, bp: *mut u8) {
        let size = unsafe { block::block_size(bp) };
        let idx = bucket(size);
        let prev = unsafe { free_list::get_prev(bp) };
        let next = unsafe { free_list::get_next(bp) };

        if prev != 0 {
            unsafe { free_list::set_next(self.ptr_of(prev), next) };
        } else {
            self.lists.set_head(idx, next);
        }
        if next != 0 {
            unsafe { free_list::set_prev(self.ptr_of(next), prev) };
        }
        unsafe {
            free_list::set_prev(bp, 0);
            free_list::set_next(bp, 0);
        }
    }

    /// First-fit search: scan buckets in ascending order starting at
    /// `bucket(asize)`, and within a bucket walk insertion order (LIFO).
    unsafe fn find_fit(&self, asize: usize) -> Option<*mut u8> {
        for idx in bucket(asize)..NUM_CLASSES {
            let mut cur = self.lists.head(idx);
            while cur != 0 {
                let bp = self.ptr_of(cur);
                if unsafe { block::block_size(bp) } >= asize {
                    return Some(bp);
                }
                cur = unsafe { free_list::get_next(bp) };
            }
        }
        None
    }

    // -- coalescer ------------------------------------------------------------

    /// Merge `bp` (already tagged free, not yet in any list) with whichever
    /// of its physical neighbors are also free.
    unsafe fn coalesce(&mut self, bp: *mut u8) -> *mut u8 {
        unsafe {
            let prev_footer = block::get_word(bp.sub(DSIZE));
            let prev_alloc = block::unpack_alloc(prev_footer);

            let next_bp = block::next_blkp(bp);
            let next_header = block::get_word(block::hdrp(next_bp));
            let next_alloc = block::unpack_alloc(next_header);

            let size = block::block_size(bp);

            match (prev_alloc, next_alloc) {
                (true, true) => bp,
                (true, false) => {
                    let next_size = block::unpack_size(next_header);
                    self.remove_free_block(next_bp);
                    block::set_tags(bp, size + next_size, false);
                    bp
                }
                (false, true) => {
                    let prev_size = block::unpack_size(prev_footer);
                    let prev_bp = block::prev_blkp(bp);
                    self.remove_free_block(prev_bp);
                    block::set_tags(prev_bp, prev_size + size, false);
                    prev_bp
                }
                (false, false) => {
                    let prev_size = block::unpack_size(prev_footer);
                    let next_size = block::unpack_size(next_header);
                    let prev_bp = block::prev_blkp(bp);
                    self.remove_free_block(prev_bp);
                    self.remove_free_block(next_bp);
                    block::set_tags(prev_bp, prev_size + size + next_size, false);
                    prev_bp
                }
            }
        }
    }

    // -- allocation policy ------------------------------------------------------

    /// Round a payload request up to a block size that leaves room for the
    /// header/footer overhead, or `None` if `n` can't be satisfied at all
    /// (zero, or overflowing once overhead is added).
    fn adjusted_size(n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        if n <= DSIZE {
            return Some(MIN_BLOCK_SIZE);
        }
        let with_overhead = n.checked_add(DSIZE)?;
        Some(align_up_usize(with_overhead, DSIZE))
    }

    /// Allocate `n` bytes, returning a payload pointer or null.
    pub fn allocate(&mut self, n: usize) -> *mut u8 {
        self.stats.allocate_calls += 1;
        let Some(asize) = Self::adjusted_size(n) else {
            return core::ptr::null_mut();
        };

        if let Some(bp) = unsafe { self.find_fit(asize) } {
            return unsafe { self.place(bp, asize) };
        }

        let extend_words = asize.max(CHUNK) / WSIZE;
        match self.extend_heap(extend_words) {
            Ok(bp) => unsafe { self.place(bp, asize) },
            Err(_) => {
                klog_warn!("segalloc: out of memory allocating {} bytes", n);
                core::ptr::null_mut()
            }
        }
    }

    /// Turn the free block at `bp` (size >= `asize`) into an allocated
    /// block of exactly `asize`, splitting off a free remainder when one
    /// would be large enough to address.
    unsafe fn place(&mut self, bp: *mut u8, asize: usize) -> *mut u8 {
        let size = unsafe { block::block_size(bp) };
        unsafe { self.remove_free_block(bp) };

        if size - asize >= MIN_BLOCK_SIZE {
            unsafe {
                block::set_tags(bp, asize, true);
                let remainder = block::next_blkp(bp);
                block::set_tags(remainder, size - asize, false);
                self.insert_free_block(remainder);
            }
        } else {
            unsafe { block::set_tags(bp, size, true) };
        }

        self.stats.live_bytes += asize as u64;
        bp
    }

    /// Free a previously allocated block. Null is a no-op.
    pub fn free(&mut self, bp: *mut u8) {
        if bp.is_null() {
            return;
        }
        self.stats.free_calls += 1;
        unsafe {
            let size = block::block_size(bp);
            self.stats.live_bytes = self.stats.live_bytes.saturating_sub(size as u64);
            block::set_tags(bp, size, false);
            self.insert_free_block(bp);
        }
    }

    /// Resize a previously allocated block.
    ///
    /// A null `bp` behaves like [`Allocator::allocate`]; `n == 0` behaves
    /// like [`Allocator::free`] and returns null.
    pub fn reallocate(&mut self, bp: *mut u8, n: usize) -> *mut u8 {
        if bp.is_null() {
            return self.allocate(n);
        }
        if n == 0 {
            self.free(bp);
            return core::ptr::null_mut();
        }
        self.stats.reallocate_calls += 1;

        let Some(asize) = Self::adjusted_size(n) else {
            return core::ptr::null_mut();
        };
        let cur = unsafe { block::block_size(bp) };
        if cur >= asize {
            // Intentionally no shrink-split: speed over reclamation.
            return bp;
        }

        if let Some(new_bp) = unsafe { self.try_extend_in_place(bp, cur, asize) } {
            return new_bp;
        }

        let new_bp = self.allocate(n);
        if new_bp.is_null() {
            return core::ptr::null_mut();
        }
        let payload_capacity = cur - DSIZE;
        let copy_len = payload_capacity.min(n);
        unsafe { core::ptr::copy_nonoverlapping(bp, new_bp, copy_len) };
        self.free(bp);
        new_bp
    }

    /// Fuse `bp` with its following block if that block is free and large
    /// enough, without re-splitting the remainder.
    unsafe fn try_extend_in_place(&mut self, bp: *mut u8, cur: usize, asize: usize) -> Option<*mut u8> {
        unsafe {
            let next_bp = block::next_blkp(bp);
            let next_header = block::get_word(block::hdrp(next_bp));
            if block::unpack_alloc(next_header) {
                return None;
            }
            let next_size = block::unpack_size(next_header);
            if cur + next_size < asize {
                return None;
            }
            self.remove_free_block(next_bp);
            block::set_tags(bp, cur + next_size, true);
            Some(bp)
        }
    }

    // -- introspection ----------------------------------------------------------

    pub fn stats(&self) -> AllocatorStats {
        self.stats
    }

    /// The fixed base address that free-list link offsets are relative to
    /// (the prologue block's bp). Exposed for the integrity checker and
    /// tests.
    pub fn base(&self) -> *mut u8 {
        self.base
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub(crate) fn lists(&self) -> &FreeLists {
        &self.lists
    }
}
