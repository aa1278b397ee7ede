//! The process-wide heap: a single [`Allocator`] over a static backing
//! arena, guarded by a spinlock so both Rust callers and the C-ABI surface
//! in [`super::ffi`] can share it.

#![allow(static_mut_refs)]

use core::ffi::c_void;
use core::ptr;

use spin::{Mutex, Once};

use segalloc_lib::klog_info;
use segalloc_mm::{Allocator, SliceHeapProvider};

/// Total size of the static arena backing the process heap.
///
/// The allocator grows into this arena a chunk at a time as demand
/// requires; the raw heap provider itself never grows past it.
const HEAP_SIZE: usize = 2 * 1024 * 1024;

/// The arena must be at least 8-byte aligned for the allocator's
/// double-word alignment guarantee; 16 matches what a real `brk`-backed
/// heap would give for free.
#[repr(C, align(16))]
struct AlignedHeap([u8; HEAP_SIZE]);

static mut HEAP: AlignedHeap = AlignedHeap([0; HEAP_SIZE]);

type GlobalAllocator = Allocator<SliceHeapProvider<'static>>;

static ALLOCATOR: Once<Mutex<GlobalAllocator>> = Once::new();

fn global() -> &'static Mutex<GlobalAllocator> {
    ALLOCATOR.call_once(|| {
        let region: &'static mut [u8] = unsafe { &mut *ptr::addr_of_mut!(HEAP.0) };
        let provider = SliceHeapProvider::new(region);
        Mutex::new(Allocator::new(provider).expect("static heap arena failed to initialize"))
    })
}

/// Re-initialize the process heap. Idempotent: abandons any still-live
/// allocations and resets the free-list state against the same arena.
pub fn initialize() -> i32 {
    match global().lock().initialize() {
        Ok(()) => {
            klog_info!("segalloc-userland: process heap ready ({} byte arena)", HEAP_SIZE);
            0
        }
        Err(_) => -1,
    }
}

pub fn alloc(size: usize) -> *mut c_void {
    global().lock().allocate(size) as *mut c_void
}

pub fn dealloc(ptr: *mut c_void) {
    global().lock().free(ptr as *mut u8)
}

pub fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
    global().lock().reallocate(ptr as *mut u8, size) as *mut c_void
}

pub fn calloc(nmemb: usize, size: usize) -> *mut c_void {
    let total = match nmemb.checked_mul(size) {
        Some(t) => t,
        None => return ptr::null_mut(),
    };

    let p = alloc(total);
    if !p.is_null() {
        unsafe { ptr::write_bytes(p as *mut u8, 0, total) };
    }
    p
}
