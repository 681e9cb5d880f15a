use crate::error::BuildError;
use crate::growth::BoundedProportional;
use crate::growth::DEFAULT_CAPACITY;
use crate::growth::DEFAULT_LOAD_FACTOR;
use crate::growth::is_valid_load_factor;
use crate::growth::min_buffer_size;
use crate::hash_map::HashMap;
use crate::hash_set::HashSet;
use crate::hash_table::HashTable;
use crate::strategy::DefaultStrategy;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Sizing {
    Slots(usize),
    Elements(usize),
}

/// Configures and creates [`HashMap`]s and [`HashSet`]s.
///
/// Every option has a default: 16 slots, a load factor of 0.75, hash
/// perturbation enabled, [`DefaultStrategy`] and [`BoundedProportional`]
/// growth.
///
/// # Examples
///
/// ```rust
/// use robin_map::MapBuilder;
/// use robin_map::growth::BoundedProportional;
///
/// let mut map = MapBuilder::new()
///     .expected_elements(500)
///     .load_factor(0.5)
///     .growth_policy(BoundedProportional::new(64, 4096, 2.0))
///     .build()
///     .unwrap();
///
/// map.insert("answer", 42);
/// assert!(map.resize_threshold() >= 500);
/// assert_eq!(map.load_factor(), 0.5);
/// ```
#[derive(Clone, Debug)]
pub struct MapBuilder<S = DefaultStrategy, G = BoundedProportional> {
    sizing: Sizing,
    load_factor: f32,
    perturb: bool,
    strategy: S,
    growth: G,
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl MapBuilder<DefaultStrategy, BoundedProportional> {
    /// Creates a builder using the default strategy.
    pub fn new() -> Self {
        Self::with_strategy(DefaultStrategy::default())
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl Default for MapBuilder<DefaultStrategy, BoundedProportional> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MapBuilder<S, BoundedProportional> {
    /// Creates a builder hashing and comparing keys with `strategy`.
    pub fn with_strategy(strategy: S) -> Self {
        Self {
            sizing: Sizing::Slots(DEFAULT_CAPACITY),
            load_factor: DEFAULT_LOAD_FACTOR,
            perturb: true,
            strategy,
            growth: BoundedProportional::default(),
        }
    }
}

impl<S, G> MapBuilder<S, G> {
    /// Sets the initial number of slots, rounded up to a power of two.
    ///
    /// Overrides [`expected_elements`](Self::expected_elements).
    pub fn initial_capacity(mut self, slots: usize) -> Self {
        self.sizing = Sizing::Slots(slots);
        self
    }

    /// Sizes the table so that `elements` keys fit without growing at the
    /// configured load factor.
    ///
    /// Overrides [`initial_capacity`](Self::initial_capacity).
    pub fn expected_elements(mut self, elements: usize) -> Self {
        self.sizing = Sizing::Elements(elements);
        self
    }

    /// Sets the load factor, which must lie in `(0, 1]`.
    ///
    /// The value is checked by [`build`](Self::build).
    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Enables or disables scrambling hashes with a capacity-derived
    /// constant before they are reduced to a slot index.
    ///
    /// Disabling it makes slot placement a pure function of the hash, which
    /// is useful with strategies that already spread their hashes well.
    pub fn perturb_hashes(mut self, perturb: bool) -> Self {
        self.perturb = perturb;
        self
    }

    /// Replaces the hashing strategy.
    pub fn strategy<T>(self, strategy: T) -> MapBuilder<T, G> {
        MapBuilder {
            sizing: self.sizing,
            load_factor: self.load_factor,
            perturb: self.perturb,
            strategy,
            growth: self.growth,
        }
    }

    /// Replaces the growth policy.
    pub fn growth_policy<P>(self, growth: P) -> MapBuilder<S, P> {
        MapBuilder {
            sizing: self.sizing,
            load_factor: self.load_factor,
            perturb: self.perturb,
            strategy: self.strategy,
            growth,
        }
    }

    /// Creates the map.
    ///
    /// # Errors
    ///
    /// Fails if the load factor is outside `(0, 1]`, if the requested size
    /// exceeds [`MAX_CAPACITY`](crate::growth::MAX_CAPACITY), or if the
    /// allocation fails.
    pub fn build<K, V>(self) -> Result<HashMap<K, V, S, G>, BuildError> {
        if !is_valid_load_factor(self.load_factor) {
            return Err(BuildError::InvalidLoadFactor(self.load_factor));
        }

        let capacity = match self.sizing {
            Sizing::Slots(slots) => slots,
            Sizing::Elements(elements) => min_buffer_size(elements, self.load_factor)?,
        };

        log::trace!(
            "building map with {capacity} slots at load factor {}",
            self.load_factor
        );
        let table = HashTable::with_options(capacity, self.load_factor, self.perturb, self.growth)?;
        Ok(HashMap::from_parts(table, self.strategy))
    }

    /// Creates a set with the same configuration.
    ///
    /// # Errors
    ///
    /// Fails for the same reasons as [`build`](Self::build).
    pub fn build_set<T>(self) -> Result<HashSet<T, S, G>, BuildError> {
        Ok(HashSet::from_map(self.build()?))
    }
}
