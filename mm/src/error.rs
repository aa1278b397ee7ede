//! Error types for the allocator.

use core::fmt;

/// Failure producing or growing the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The raw heap provider refused to grow the heap by the requested
    /// amount.
    OutOfMemory,
    /// The request itself cannot be satisfied (e.g. a size that overflows
    /// `usize` once header/footer overhead is added).
    InvalidRequest,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "raw heap provider could not grow the heap"),
            Self::InvalidRequest => write!(f, "allocation request is invalid"),
        }
    }
}

/// Convenience result type for allocator setup operations.
pub type AllocResult<T = ()> = Result<T, AllocError>;

/// An invariant violation found by the integrity checker.
///
/// This is a debug-mode-only diagnostic: production paths never construct
/// one. See [`crate::Allocator::check_free_lists`] and
/// [`crate::Allocator::check_heap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityError {
    /// A block's header and footer tag words disagree.
    HeaderFooterMismatch { bp: usize },
    /// A free block's size does not classify into the list it was found in.
    MisclassifiedBucket {
        bp: usize,
        list: usize,
        expected: usize,
    },
    /// A block found in a free list has its allocation bit set.
    AllocatedInFreeList { bp: usize },
    /// A free-list link points back at the block that owns it.
    SelfReferencingLink { bp: usize },
    /// Two physically adjacent blocks are both free (a missed coalesce).
    AdjacentFreeBlocks { first: usize, second: usize },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderFooterMismatch { bp } => {
                write!(f, "header/footer mismatch at block {:#x}", bp)
            }
            Self::MisclassifiedBucket { bp, list, expected } => write!(
                f,
                "block {:#x} found in list {} but classifies to {}",
                bp, list, expected
            ),
            Self::AllocatedInFreeList { bp } => {
                write!(f, "allocated block {:#x} found in a free list", bp)
            }
            Self::SelfReferencingLink { bp } => {
                write!(f, "block {:#x} links to itself", bp)
            }
            Self::AdjacentFreeBlocks { first, second } => write!(
                f,
                "adjacent free blocks {:#x} and {:#x} were not coalesced",
                first, second
            ),
        }
    }
}
