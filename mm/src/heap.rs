//! The raw heap provider interface.
//!
//! This is the allocator's sole external collaborator: something that can
//! hand out more heap memory on request, the way `sbrk`/`brk` hands a
//! process more address space. The allocator never assumes anything about
//! where the memory comes from beyond this trait.

/// Grows (or, for the reference implementation, merely extends a
/// pre-reserved region of) the heap on request.
///
/// Implementations must preserve the contents of any previously returned
/// region — `heap_extend` only ever hands out *new* memory past the
/// current break.
pub trait HeapProvider {
    /// Move the break forward by `bytes`, returning the *previous* break on
    /// success. Returns `None` (the FAIL sentinel) if the heap cannot grow
    /// by that amount.
    fn heap_extend(&mut self, bytes: usize) -> Option<*mut u8>;

    /// The address of the very first byte ever handed out. Used only by
    /// tests and the integrity checker to bound a full heap walk.
    fn heap_start(&self) -> *mut u8;

    /// The current break (one past the last byte handed out).
    fn heap_end(&self) -> *mut u8;
}

/// Reference `HeapProvider` backed by a caller-supplied byte slice.
///
/// This stands in for whatever a real deployment would use (a syscall to
/// the kernel, a `mmap`-reserved arena, …) — that collaborator is out of
/// scope for this crate, so tests and the demo driver use this instead.
/// The slice is never resized; `heap_extend` simply fails once it is
/// exhausted, which is how a bounded growable heap is meant to behave.
pub struct SliceHeapProvider<'a> {
    region: &'a mut [u8],
    brk: usize,
}

impl<'a> SliceHeapProvider<'a> {
    pub fn new(region: &'a mut [u8]) -> Self {
        Self { region, brk: 0 }
    }

    /// Bytes already handed out.
    pub fn used(&self) -> usize {
        self.brk
    }

    /// Total capacity of the backing region.
    pub fn capacity(&self) -> usize {
        self.region.len()
    }
}

impl<'a> HeapProvider for SliceHeapProvider<'a> {
    fn heap_extend(&mut self, bytes: usize) -> Option<*mut u8> {
        let new_brk = self.brk.checked_add(bytes)?;
        if new_brk > self.region.len() {
            return None;
        }
        let prev = self.brk;
        self.brk = new_brk;
        Some(unsafe { self.region.as_mut_ptr().add(prev) })
    }

    fn heap_start(&self) -> *mut u8 {
        self.region.as_ptr() as *mut u8
    }

    fn heap_end(&self) -> *mut u8 {
        unsafe { self.region.as_ptr().add(self.brk) as *mut u8 }
    }
}
