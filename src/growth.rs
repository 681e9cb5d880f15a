use crate::error::TryReserveError;

/// Smallest number of slots a table is ever allocated with.
pub const MIN_CAPACITY: usize = 4;

/// Largest number of slots a table may grow to.
///
/// Slot homes are cached as `u32`, and `u32::MAX` is reserved to mark empty
/// slots, so this must stay below `2^32`.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Number of slots used by [`HashMap::new`](crate::HashMap::new).
pub const DEFAULT_CAPACITY: usize = 16;

/// Load factor used when none is configured.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Decides how far a table grows once it reaches its resize threshold.
///
/// The returned value is a *lower bound* on the new slot count: the table
/// rounds it up to a power of two, and never below what is needed to hold
/// `occupied + additional` entries at the configured load factor.
pub trait GrowthPolicy {
    /// Returns the desired number of slots for a table that currently has
    /// `current` slots, `occupied` live entries, and must make room for
    /// `additional` more.
    fn grow(
        &self,
        current: usize,
        occupied: usize,
        additional: usize,
    ) -> Result<usize, TryReserveError>;
}

/// Grows proportionally to the current size, bounded by an absolute minimum
/// and maximum increment.
///
/// ```rust
/// use robin_map::growth::BoundedProportional;
/// use robin_map::growth::GrowthPolicy;
///
/// let policy = BoundedProportional::default();
/// assert_eq!(policy.grow(1024, 768, 1), Ok(1536));
/// // The minimum increment wins for small tables.
/// assert_eq!(policy.grow(4, 3, 1), Ok(14));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundedProportional {
    min_grow: usize,
    max_grow: usize,
    ratio: f32,
}

impl BoundedProportional {
    /// Default minimum number of slots added by a single growth step.
    pub const DEFAULT_MIN_GROW: usize = 10;

    /// Default growth ratio.
    pub const DEFAULT_RATIO: f32 = 1.5;

    /// Creates a policy growing by `current * (ratio - 1)` slots, clamped to
    /// `[min_grow, max_grow]`.
    ///
    /// # Panics
    ///
    /// Panics if `ratio < 1.0`, if it is not a number, or if
    /// `min_grow > max_grow`.
    pub fn new(min_grow: usize, max_grow: usize, ratio: f32) -> Self {
        assert!(ratio >= 1.0, "growth ratio must be at least 1.0, got {ratio}");
        assert!(
            min_grow <= max_grow,
            "minimum growth {min_grow} exceeds maximum growth {max_grow}"
        );
        Self {
            min_grow,
            max_grow,
            ratio,
        }
    }
}

impl Default for BoundedProportional {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_GROW, MAX_CAPACITY, Self::DEFAULT_RATIO)
    }
}

impl GrowthPolicy for BoundedProportional {
    fn grow(
        &self,
        current: usize,
        occupied: usize,
        additional: usize,
    ) -> Result<usize, TryReserveError> {
        let by = ((current as f64) * (self.ratio as f64 - 1.0)) as usize;
        let by = by.clamp(self.min_grow, self.max_grow);

        let required = occupied
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow {
                requested: usize::MAX,
            })?;
        let target = current.saturating_add(by).max(required);
        if target > MAX_CAPACITY {
            return Err(TryReserveError::CapacityOverflow { requested: target });
        }

        Ok(target)
    }
}

/// Returns `true` if `load_factor` is usable by a table.
#[inline]
pub(crate) fn is_valid_load_factor(load_factor: f32) -> bool {
    load_factor > 0.0 && load_factor <= 1.0
}

/// Number of slots needed to hold `elements` entries without growing.
///
/// Always leaves at least one slot empty.
pub(crate) fn min_buffer_size(elements: usize, load_factor: f32) -> Result<usize, TryReserveError> {
    debug_assert!(is_valid_load_factor(load_factor));

    let length = elements as f64 / load_factor as f64;
    if length > MAX_CAPACITY as f64 {
        return Err(TryReserveError::CapacityOverflow {
            requested: elements,
        });
    }

    let mut length = ceil(length);
    if length == elements {
        length += 1;
    }

    let length = length.max(MIN_CAPACITY).next_power_of_two();
    if length > MAX_CAPACITY {
        return Err(TryReserveError::CapacityOverflow {
            requested: elements,
        });
    }

    Ok(length)
}

/// Number of live entries a table of `capacity` slots may hold.
#[inline]
pub(crate) fn resize_threshold(capacity: usize, load_factor: f32) -> usize {
    debug_assert!(capacity.is_power_of_two());

    ceil(capacity as f64 * load_factor as f64).min(capacity - 1)
}

// `f64::ceil` lives in std; this only needs to handle non-negative values.
#[inline]
fn ceil(value: f64) -> usize {
    let truncated = value as usize;
    if (truncated as f64) < value {
        truncated + 1
    } else {
        truncated
    }
}

/// Rounds a requested slot count to a valid table size.
pub(crate) fn round_capacity(requested: usize) -> Result<usize, TryReserveError> {
    if requested > MAX_CAPACITY {
        return Err(TryReserveError::CapacityOverflow { requested });
    }

    Ok(requested.max(MIN_CAPACITY).next_power_of_two())
}
