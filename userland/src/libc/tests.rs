//! These tests share the process-wide static heap, so they serialize
//! against a lock of their own rather than relying on `initialize()` alone
//! — two tests racing past `initialize()` concurrently would each reset
//! the heap out from under the other's allocations.

use core::ffi::c_void;
use spin::Mutex;

use super::{alloc, calloc, dealloc, initialize, realloc};

static TEST_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn basic_alloc_free_reuse() {
    let _guard = TEST_LOCK.lock();
    assert_eq!(initialize(), 0);

    let a1 = alloc(40);
    let a2 = alloc(40);
    assert!(!a1.is_null() && !a2.is_null());
    dealloc(a1);
    let a3 = alloc(40);
    assert_eq!(a3, a1);
}

#[test]
fn calloc_zeroes_the_returned_region() {
    let _guard = TEST_LOCK.lock();
    assert_eq!(initialize(), 0);

    let p = calloc(16, 4) as *mut u8;
    assert!(!p.is_null());
    let bytes = unsafe { core::slice::from_raw_parts(p, 64) };
    assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn calloc_overflow_returns_null() {
    let _guard = TEST_LOCK.lock();
    assert_eq!(initialize(), 0);

    assert!(calloc(usize::MAX, 2).is_null());
}

#[test]
fn realloc_null_and_zero_match_alloc_and_free() {
    let _guard = TEST_LOCK.lock();
    assert_eq!(initialize(), 0);

    let grown = realloc(core::ptr::null_mut(), 32);
    assert!(!grown.is_null());

    let shrunk_to_nothing = realloc(grown, 0);
    assert!(shrunk_to_nothing.is_null());
}

#[test]
fn c_abi_exports_round_trip_through_the_same_heap() {
    let _guard = TEST_LOCK.lock();
    assert_eq!(initialize(), 0);

    let p = super::ffi::malloc(64) as *mut u8;
    assert!(!p.is_null());
    unsafe { core::ptr::write_bytes(p, 0x42, 64) };
    super::ffi::free(p as *mut c_void);
}
