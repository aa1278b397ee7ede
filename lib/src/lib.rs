#![cfg_attr(not(test), no_std)]
#![allow(unsafe_op_in_unsafe_fn)]

//! Small ambient utilities shared by the allocator crates: alignment helpers
//! and a level-gated logging facade. Nothing here is specific to the
//! segregated free-list design; it is the same kind of scaffolding a kernel
//! crate would keep in its lowest-level `lib` crate.

pub mod alignment;
pub mod klog;

#[doc(hidden)]
pub use paste;

pub use alignment::{align_down_u64, align_down_usize, align_up_u64, align_up_usize};
pub use alignment::{align_down_usize as align_down, align_up_usize as align_up};
pub use klog::{
    KlogLevel, klog_get_level, klog_init, klog_is_enabled, klog_register_backend, klog_set_level,
};
