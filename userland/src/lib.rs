#![cfg_attr(not(test), no_std)]
#![allow(unsafe_op_in_unsafe_fn)]

//! A minimal C runtime malloc surface backed by the segregated free-list
//! allocator: a single process-wide heap, guarded by a lock, reachable
//! both from ordinary Rust code and from C via `libc::ffi`.

pub mod libc;

pub use libc::{alloc, calloc, dealloc, initialize, realloc};
