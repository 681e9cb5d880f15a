use core::alloc::Layout;

use thiserror::Error;

/// The error type for fallible growth of a table.
///
/// Returned by [`HashMap::try_insert`], [`HashMap::try_reserve`] and the
/// other `try_` operations. When one of these is returned the container is
/// left exactly as it was before the call.
///
/// [`HashMap::try_insert`]: crate::HashMap::try_insert
/// [`HashMap::try_reserve`]: crate::HashMap::try_reserve
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TryReserveError {
    /// The requested number of slots exceeds [`MAX_CAPACITY`].
    ///
    /// [`MAX_CAPACITY`]: crate::growth::MAX_CAPACITY
    #[error("capacity overflow: {requested} slots requested, at most {} supported", crate::growth::MAX_CAPACITY)]
    CapacityOverflow {
        /// The number of slots (or elements) that was asked for.
        requested: usize,
    },
    /// The allocator reported a failure.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocError {
        /// The layout of the allocation request that failed.
        layout: Layout,
    },
}

impl TryReserveError {
    /// Aborts or panics the way the infallible operations do.
    #[cold]
    #[inline(never)]
    pub(crate) fn handle(self) -> ! {
        match self {
            TryReserveError::CapacityOverflow { .. } => panic!("{}", self),
            TryReserveError::AllocError { layout } => alloc::alloc::handle_alloc_error(layout),
        }
    }
}

/// The error type returned by [`MapBuilder::build`].
///
/// [`MapBuilder::build`]: crate::MapBuilder::build
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BuildError {
    /// The load factor was outside `(0, 1]` or not a number.
    #[error("load factor must be in (0, 1], got {0}")]
    InvalidLoadFactor(f32),
    /// The initial table could not be allocated.
    #[error(transparent)]
    Reserve(#[from] TryReserveError),
}
