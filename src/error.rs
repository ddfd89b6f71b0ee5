//! Error types for fallible allocation and configuration.
//!
//! Allocation failure is the only recoverable error the containers report.
//! Every operation that may allocate either completes or leaves the
//! container exactly as it was and returns `TryReserveError`.

use core::alloc::Layout;
use thiserror::Error;

/// Failure to obtain backing storage.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TryReserveError {
    /// The requested capacity does not fit in `isize::MAX` bytes.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator refused the request.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocError {
        /// Layout of the allocation that failed.
        layout: Layout,
    },
}

/// Invalid per-instance configuration.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("max load factor must lie in (0, 1], got {0}")]
    MaxLoadOutOfRange(f32),
}

/// Grow `v` so that `additional` more elements fit, with amortized doubling.
pub(crate) fn try_reserve<T>(v: &mut Vec<T>, additional: usize) -> Result<(), TryReserveError> {
    if v.capacity() - v.len() >= additional {
        return Ok(());
    }
    let wanted = v
        .len()
        .checked_add(additional)
        .ok_or(TryReserveError::CapacityOverflow)?;
    let layout = Layout::array::<T>(wanted).map_err(|_| TryReserveError::CapacityOverflow)?;
    v.try_reserve(additional)
        .map_err(|_| TryReserveError::AllocError { layout })
}

/// Grow `v` so that exactly `additional` more elements fit.
pub(crate) fn try_reserve_exact<T>(
    v: &mut Vec<T>,
    additional: usize,
) -> Result<(), TryReserveError> {
    if v.capacity() - v.len() >= additional {
        return Ok(());
    }
    let wanted = v
        .len()
        .checked_add(additional)
        .ok_or(TryReserveError::CapacityOverflow)?;
    let layout = Layout::array::<T>(wanted).map_err(|_| TryReserveError::CapacityOverflow)?;
    v.try_reserve_exact(additional)
        .map_err(|_| TryReserveError::AllocError { layout })
}

/// Unwrap an allocation result the way `Vec` does for its infallible API:
/// abort through the allocation error handler, or panic on overflow.
pub(crate) fn infallible<T>(r: Result<T, TryReserveError>) -> T {
    match r {
        Ok(t) => t,
        Err(TryReserveError::CapacityOverflow) => panic!("capacity overflow"),
        Err(TryReserveError::AllocError { layout }) => std::alloc::handle_alloc_error(layout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_reports_overflow_without_touching_vec() {
        let mut v: Vec<u64> = vec![1, 2, 3];
        let err = try_reserve(&mut v, usize::MAX).unwrap_err();
        assert_eq!(err, TryReserveError::CapacityOverflow);
        assert_eq!(v, [1, 2, 3]);

        let err = try_reserve_exact(&mut v, isize::MAX as usize).unwrap_err();
        assert_eq!(err, TryReserveError::CapacityOverflow);
        assert_eq!(v, [1, 2, 3]);
    }

    #[test]
    fn reserve_within_capacity_is_noop() {
        let mut v: Vec<u8> = Vec::with_capacity(16);
        let cap = v.capacity();
        try_reserve_exact(&mut v, 16).unwrap();
        try_reserve(&mut v, 4).unwrap();
        assert_eq!(v.capacity(), cap);
    }

    #[test]
    fn display_messages() {
        let layout = Layout::array::<u32>(4).unwrap();
        assert_eq!(
            TryReserveError::AllocError { layout }.to_string(),
            "memory allocation of 16 bytes failed"
        );
        assert_eq!(
            ConfigError::MaxLoadOutOfRange(1.5).to_string(),
            "max load factor must lie in (0, 1], got 1.5"
        );
    }
}
