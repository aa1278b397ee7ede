//! Boundary-tag block encoding.
//!
//! Purely arithmetic accessors over the heap's byte layout: no state lives
//! here beyond the bytes the caller points us at. A block pointer (`bp`)
//! always names the first byte of a block's payload, i.e. the byte right
//! after its header word.
//!
//! ```text
//! [ header (W) | payload/links... | footer (W) ]
//!               ^
//!               bp
//! ```
//!
//! Every size used here is the block's *total* size (header + payload +
//! footer), always a multiple of [`DSIZE`].

use core::ptr;

/// Word size: the width of a header/footer tag and of a free-list link.
pub const WSIZE: usize = 4;
/// Double-word size: the allocator's alignment unit and minimum block size
/// component.
pub const DSIZE: usize = 8;
/// Minimum total size of any block (header + footer + room for two links).
pub const MIN_BLOCK_SIZE: usize = 2 * DSIZE;

/// Pack a size and an allocation bit into a single tag word.
///
/// `size` must already be a multiple of 8; its low 3 bits are assumed zero
/// and get OR'd with the allocation bit.
#[inline(always)]
pub const fn pack(size: usize, alloc: bool) -> u32 {
    (size as u32) | (alloc as u32)
}

#[inline(always)]
pub const fn unpack_size(word: u32) -> usize {
    (word & !0x7) as usize
}

#[inline(always)]
pub const fn unpack_alloc(word: u32) -> bool {
    (word & 0x1) != 0
}

/// Read a tag or link word at `addr`.
///
/// # Safety
/// `addr` must point to 4 readable bytes within the heap region.
#[inline]
pub unsafe fn get_word(addr: *const u8) -> u32 {
    unsafe { (addr as *const u32).read_unaligned() }
}

/// Write a tag or link word at `addr`.
///
/// # Safety
/// `addr` must point to 4 writable bytes within the heap region.
#[inline]
pub unsafe fn put_word(addr: *mut u8, value: u32) {
    unsafe { (addr as *mut u32).write_unaligned(value) }
}

/// Address of `bp`'s header word.
#[inline]
pub unsafe fn hdrp(bp: *mut u8) -> *mut u8 {
    unsafe { bp.sub(WSIZE) }
}

/// Address of `bp`'s footer word, given its total size.
#[inline]
pub unsafe fn ftrp_for_size(bp: *mut u8, size: usize) -> *mut u8 {
    unsafe { bp.add(size - DSIZE) }
}

/// Address of `bp`'s footer word, reading its size from the header.
#[inline]
pub unsafe fn ftrp(bp: *mut u8) -> *mut u8 {
    unsafe { ftrp_for_size(bp, block_size(bp)) }
}

/// Total size of the block starting at `bp`, read from its header.
#[inline]
pub unsafe fn block_size(bp: *mut u8) -> usize {
    unsafe { unpack_size(get_word(hdrp(bp))) }
}

/// Whether the block starting at `bp` is currently allocated.
#[inline]
pub unsafe fn is_allocated(bp: *mut u8) -> bool {
    unsafe { unpack_alloc(get_word(hdrp(bp))) }
}

/// bp of the block physically following `bp`.
#[inline]
pub unsafe fn next_blkp(bp: *mut u8) -> *mut u8 {
    unsafe { bp.add(block_size(bp)) }
}

/// bp of the block physically preceding `bp`, read via its footer.
///
/// The word immediately before `bp`'s header is the previous block's
/// footer — this is what makes backward traversal O(1).
#[inline]
pub unsafe fn prev_blkp(bp: *mut u8) -> *mut u8 {
    unsafe {
        let prev_footer = get_word(bp.sub(DSIZE));
        bp.sub(unpack_size(prev_footer))
    }
}

/// Stamp both header and footer of `bp` with `(size, alloc)`.
///
/// # Safety
/// `bp` must name a block whose header and footer (at `bp - WSIZE` and
/// `bp + size - DSIZE`) lie within the heap region.
#[inline]
pub unsafe fn set_tags(bp: *mut u8, size: usize, alloc: bool) {
    unsafe {
        put_word(hdrp(bp), pack(size, alloc));
        put_word(ftrp_for_size(bp, size), pack(size, alloc));
    }
}

/// Write a size-0/alloc-1 header at `bp`. Used for the epilogue sentinel.
#[inline]
pub unsafe fn set_epilogue(bp: *mut u8) {
    unsafe { put_word(hdrp(bp), pack(0, true)) }
}

/// `true` if the header and footer of `bp` agree exactly.
#[inline]
pub unsafe fn tags_agree(bp: *mut u8) -> bool {
    unsafe {
        let header = get_word(hdrp(bp));
        let footer = get_word(ftrp_for_size(bp, unpack_size(header)));
        header == footer
    }
}

/// Zero out `n` bytes starting at `dst`. Exposed for callers that want
/// deterministic (rather than indeterminate) payload contents in tests.
///
/// # Safety
/// `dst` must point to `n` writable bytes.
#[inline]
pub unsafe fn zero(dst: *mut u8, n: usize) {
    unsafe { ptr::write_bytes(dst, 0, n) }
}
