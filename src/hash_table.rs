//! The raw Robin Hood table.
//!
//! [`HashTable`] stores key-value pairs addressed by caller-supplied hashes
//! and equality predicates. It knows nothing about how keys are hashed, which
//! is why operations that may move entries to a new allocation also take a
//! `hasher` closure. Most users want [`HashMap`](crate::HashMap) instead.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::Enumerate;
use core::iter::Rev;
use core::iter::Zip;
use core::mem::MaybeUninit;
use core::slice;

use crate::error::BuildError;
use crate::error::TryReserveError;
use crate::growth::BoundedProportional;
use crate::growth::DEFAULT_CAPACITY;
use crate::growth::DEFAULT_LOAD_FACTOR;
use crate::growth::GrowthPolicy;
use crate::growth::MIN_CAPACITY;
use crate::growth::is_valid_load_factor;
use crate::growth::min_buffer_size;
use crate::growth::resize_threshold;
use crate::growth::round_capacity;
use crate::slot_table::Carried;
use crate::slot_table::EMPTY;
use crate::slot_table::SlotTable;
use crate::strategy::perturb;

/// Result of walking a probe sequence.
enum Probe {
    /// The key lives in this slot.
    Found(usize),
    /// The key is absent; a new entry would be placed starting at `slot`,
    /// having already travelled `dist` slots from its home.
    Vacant { slot: usize, dist: usize },
}

/// Debug statistics for hash table analysis.
///
/// Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of entries the table holds before it grows
    pub resize_threshold: usize,
    /// Total number of slots allocated
    pub total_slots: usize,
    /// Longest distance between an entry and its home slot
    pub max_probe_distance: usize,
    /// Average distance between an entry and its home slot
    pub mean_probe_distance: f64,
    /// Load factor (populated / total_slots)
    pub load_factor: f64,
    /// Total memory in bytes used by the slot arrays
    pub total_bytes: usize,
    /// Bytes spent on empty slots
    pub wasted_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} slots ({:.2}% load, grows at {})",
            self.populated,
            self.total_slots,
            self.load_factor * 100.0,
            self.resize_threshold
        );
        println!(
            "Probe distance: max {}, mean {:.3}",
            self.max_probe_distance, self.mean_probe_distance
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// An open-addressing hash table using Robin Hood linear probing.
///
/// Entries live in three parallel arrays (keys, values, and a marker holding
/// each entry's home slot) whose length is a power of two. Collisions are
/// resolved by linear probing; an inserted entry takes over any slot whose
/// occupant sits closer to its own home than the new entry does, which keeps
/// probe sequences short and uniform. Removal shifts the following entries
/// back instead of leaving tombstones.
///
/// Callers provide the hash and an equality predicate for every operation.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use robin_map::hash_table::Entry;
/// # use robin_map::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_id(id: &u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table: HashTable<u64, String> = HashTable::new();
///
/// match table.entry(hash_id(&123), |&k| k == 123) {
///     Entry::Vacant(entry) => {
///         entry.insert(123, "Alice".to_string(), hash_id);
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(
///     table.find(hash_id(&123), |&k| k == 123),
///     Some((&123, &"Alice".to_string()))
/// );
/// ```
pub struct HashTable<K, V, G = BoundedProportional> {
    slots: SlotTable<K, V>,
    assigned: usize,
    resize_at: usize,
    load_factor: f32,
    perturb: bool,
    growth: G,
    generation: u64,
}

impl<K, V, G> Debug for HashTable<K, V, G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        let slots = (0..self.slots.capacity())
            .collect::<Vec<_>>()
            .chunks(16)
            .map(|row| {
                row.iter()
                    .map(|&i| {
                        if self.slots.is_occupied(i) {
                            format!("{:>4}+{:<2}", self.slots.home(i), self.slots.probe_distance(i))
                        } else {
                            "   ....".to_string()
                        }
                    })
                    .collect::<Vec<String>>()
                    .join(",")
            })
            .collect::<Vec<_>>();

        f.debug_struct("HashTable")
            .field("slots", &slots)
            .field("assigned", &self.assigned)
            .field("resize_at", &self.resize_at)
            .field("capacity", &self.slots.capacity())
            .finish()
    }
}

impl<K, V, G> Clone for HashTable<K, V, G>
where
    K: Clone,
    V: Clone,
    G: Clone,
{
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            assigned: self.assigned,
            resize_at: self.resize_at,
            load_factor: self.load_factor,
            perturb: self.perturb,
            growth: self.growth.clone(),
            generation: self.generation,
        }
    }
}

impl<K, V> HashTable<K, V, BoundedProportional> {
    /// Creates an empty table with the default number of slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with at least `capacity` slots.
    ///
    /// The slot count is rounded up to a power of two.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64, String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// assert_eq!(table.resize_threshold(), 96);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_growth_policy(capacity, BoundedProportional::default())
    }
}

impl<K, V> Default for HashTable<K, V, BoundedProportional> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, G> HashTable<K, V, G> {
    /// Creates an empty table with every construction option spelled out.
    ///
    /// `capacity` is rounded up to a power of two of at least
    /// [`MIN_CAPACITY`](crate::growth::MIN_CAPACITY) slots. When `perturb` is
    /// set, hashes are scrambled with a capacity-derived constant before
    /// being reduced to a slot index.
    pub fn with_options(
        capacity: usize,
        load_factor: f32,
        perturb: bool,
        growth: G,
    ) -> Result<Self, BuildError> {
        if !is_valid_load_factor(load_factor) {
            return Err(BuildError::InvalidLoadFactor(load_factor));
        }

        let capacity = round_capacity(capacity)?;
        let slots = SlotTable::try_new(capacity)?;

        Ok(Self {
            slots,
            assigned: 0,
            resize_at: resize_threshold(capacity, load_factor),
            load_factor,
            perturb,
            growth,
            generation: 0,
        })
    }

    /// Creates an empty table with at least `capacity` slots, the default
    /// load factor, and the given growth policy.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds
    /// [`MAX_CAPACITY`](crate::growth::MAX_CAPACITY), and aborts if the
    /// allocation fails.
    pub fn with_growth_policy(capacity: usize, growth: G) -> Self {
        match Self::with_options(capacity, DEFAULT_LOAD_FACTOR, true, growth) {
            Ok(table) => table,
            Err(BuildError::Reserve(e)) => e.handle(),
            Err(e) => unreachable!("default options rejected: {e}"),
        }
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.assigned
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.assigned == 0
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns how many entries the table holds before the next insertion of
    /// a new key grows it.
    pub fn resize_threshold(&self) -> usize {
        self.resize_at
    }

    /// Returns the configured load factor.
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns the growth policy.
    pub fn growth_policy(&self) -> &G {
        &self.growth
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(crate) fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline(always)]
    fn home_of(&self, hash: u64) -> usize {
        let hash = if self.perturb {
            perturb(hash, self.slots.capacity())
        } else {
            hash
        };
        hash as usize & self.slots.mask()
    }

    #[inline]
    fn probe(&self, hash: u64, eq: impl Fn(&K) -> bool) -> Probe {
        let mask = self.slots.mask();
        let mut slot = self.home_of(hash);
        let mut dist = 0;

        loop {
            if !self.slots.is_occupied(slot) {
                return Probe::Vacant { slot, dist };
            }

            let existing = self.slots.probe_distance(slot);
            if existing < dist {
                return Probe::Vacant { slot, dist };
            }

            // Equal distances mean equal homes, which is a cheap filter before
            // calling `eq`.
            if existing == dist && eq(self.slots.key(slot)) {
                return Probe::Found(slot);
            }

            slot = (slot + 1) & mask;
            dist += 1;
            debug_assert!(dist <= mask, "probe sequence did not terminate");
        }
    }

    /// Returns the slot index holding the entry matching `eq`.
    pub fn find_index(&self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<usize> {
        if self.assigned == 0 {
            return None;
        }

        match self.probe(hash, eq) {
            Probe::Found(index) => Some(index),
            Probe::Vacant { .. } => None,
        }
    }

    /// Finds the entry matching `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64, &str> = HashTable::new();
    /// table.entry(7, |&k| k == 7).or_insert(7, "seven", |&k| k);
    ///
    /// assert_eq!(table.find(7, |&k| k == 7), Some((&7, &"seven")));
    /// assert_eq!(table.find(8, |&k| k == 8), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<(&K, &V)> {
        self.find_index(hash, eq).map(|index| self.slots.entry(index))
    }

    /// Finds the entry matching `eq`, returning its value mutably.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<(&K, &mut V)> {
        self.find_index(hash, eq)
            .map(|index| self.slots.entry_mut(index))
    }

    /// Returns the entry stored at slot `index`, if any.
    pub fn get_at(&self, index: usize) -> Option<(&K, &V)> {
        if index < self.slots.capacity() && self.slots.is_occupied(index) {
            Some(self.slots.entry(index))
        } else {
            None
        }
    }

    /// Returns the entry stored at slot `index` with its value mutable.
    pub fn get_at_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        if index < self.slots.capacity() && self.slots.is_occupied(index) {
            Some(self.slots.entry_mut(index))
        } else {
            None
        }
    }

    /// Gets the entry for the given hash and equality predicate.
    ///
    /// A vacant entry remembers where the probe stopped, so inserting
    /// through it does not walk the probe sequence again.
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&K) -> bool) -> Entry<'_, K, V, G> {
        match self.probe(hash, eq) {
            Probe::Found(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Probe::Vacant { slot, dist } => Entry::Vacant(VacantEntry {
                home: self.home_of(hash),
                table: self,
                hash,
                slot,
                dist,
            }),
        }
    }

    /// Places `carried` starting at `slot`, displacing entries that sit
    /// closer to their homes.
    ///
    /// Returns the slot the original carried entry ended in, and the new
    /// position of the entry that was at `watch` if this placement moved it.
    fn place(
        &mut self,
        mut slot: usize,
        mut carried: Carried<K, V>,
        mut watch: Option<usize>,
    ) -> (usize, Option<usize>) {
        let mask = self.slots.mask();
        let mut landed = None;
        let mut carrying_watched = false;

        loop {
            if !self.slots.is_occupied(slot) {
                self.slots
                    .write(slot, carried.home, carried.key, carried.value);
                if carrying_watched {
                    watch = Some(slot);
                }
                return (landed.unwrap_or(slot), watch);
            }

            if self.slots.probe_distance(slot) < carried.dist {
                let displaced_watched = watch == Some(slot);
                carried = self.slots.swap(slot, carried);
                if landed.is_none() {
                    landed = Some(slot);
                } else if carrying_watched {
                    watch = Some(slot);
                }
                carrying_watched = displaced_watched;
            }

            slot = (slot + 1) & mask;
            carried.dist += 1;
            debug_assert!(carried.dist <= mask, "no empty slot to place into");
        }
    }

    /// Removes the entry at slot `index` and closes the gap it leaves.
    ///
    /// # Panics
    ///
    /// Panics if the slot is out of bounds or empty.
    pub fn remove_at(&mut self, index: usize) -> (K, V) {
        let entry = self.slots.take(index);
        self.assigned -= 1;
        self.backward_shift(index);
        self.bump_generation();
        entry
    }

    fn backward_shift(&mut self, mut gap: usize) {
        let mask = self.slots.mask();
        loop {
            let next = (gap + 1) & mask;
            if !self.slots.is_occupied(next) || self.slots.probe_distance(next) == 0 {
                break;
            }

            self.slots.shift(next, gap);
            gap = next;
        }
    }

    /// Removes and returns the entry matching `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64, u64> = HashTable::new();
    /// table.entry(42, |&k| k == 42).or_insert(42, 420, |&k| k);
    ///
    /// assert_eq!(table.remove(42, |&k| k == 42), Some((42, 420)));
    /// assert!(table.is_empty());
    /// assert_eq!(table.remove(42, |&k| k == 42), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<(K, V)> {
        self.find_index(hash, eq).map(|index| self.remove_at(index))
    }

    /// Removes every entry for which `predicate` returns `true`, returning
    /// how many were removed.
    ///
    /// Every entry is offered to `predicate` exactly once.
    pub fn remove_all(&mut self, mut predicate: impl FnMut(&K, &mut V) -> bool) -> usize {
        if self.assigned == 0 {
            return 0;
        }

        let mask = self.slots.mask();
        // Backward shifts stop at empty slots, so scanning from just past one
        // guarantees no entry is moved behind the scan position.
        let start = (0..=mask)
            .find(|&i| !self.slots.is_occupied(i))
            .unwrap_or(0);

        let mut removed = 0;
        let mut offset = 1;
        while offset <= mask {
            let slot = (start + offset) & mask;
            if self.slots.is_occupied(slot) {
                let (key, value) = self.slots.entry_mut(slot);
                if predicate(key, value) {
                    drop(self.remove_at(slot));
                    removed += 1;
                    continue;
                }
            }
            offset += 1;
        }

        removed
    }

    /// Drops every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.assigned = 0;
        self.bump_generation();
    }

    /// Returns the longest distance between any entry and its home slot.
    pub fn max_probe_distance(&self) -> usize {
        (0..self.slots.capacity())
            .filter(|&i| self.slots.is_occupied(i))
            .map(|i| self.slots.probe_distance(i))
            .max()
            .unwrap_or(0)
    }

    /// Returns an iterator over the entries, from the last slot to the first.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            index: self.slots.capacity(),
            remaining: self.assigned,
        }
    }

    /// Returns an iterator over the entries with mutable values, from the
    /// last slot to the first.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.assigned;
        let (homes, keys, values) = self.slots.raw_parts_mut();
        IterMut {
            inner: homes.iter().zip(keys.iter()).zip(values.iter_mut()).enumerate().rev(),
            remaining,
        }
    }

    /// Returns an iterator that removes and yields every entry.
    ///
    /// The table is empty as soon as this is called. Its slots are handed
    /// back once the iterator is dropped; if it is leaked instead, the table
    /// stays empty with [`MIN_CAPACITY`](crate::growth::MIN_CAPACITY) slots.
    ///
    /// # Panics
    ///
    /// Aborts if the stand-in table cannot be allocated.
    pub fn drain(&mut self) -> Drain<'_, K, V, G> {
        let stand_in = match SlotTable::try_new(MIN_CAPACITY) {
            Ok(slots) => slots,
            Err(e) => e.handle(),
        };
        let slots = core::mem::replace(&mut self.slots, stand_in);
        let remaining = core::mem::replace(&mut self.assigned, 0);
        let resize_at = core::mem::replace(
            &mut self.resize_at,
            resize_threshold(MIN_CAPACITY, self.load_factor),
        );
        self.bump_generation();

        Drain {
            index: slots.capacity(),
            remaining,
            resize_at,
            slots,
            table: self,
        }
    }

    /// Computes a histogram of probe distances.
    ///
    /// Index `d` of the returned vector counts the entries that sit `d` slots
    /// past their home.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; self.max_probe_distance() + 1];
        for index in 0..self.slots.capacity() {
            if self.slots.is_occupied(index) {
                hist[self.slots.probe_distance(index)] += 1;
            }
        }
        hist
    }

    /// Returns detailed utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let total_slots = self.slots.capacity();
        let total_distance: usize = (0..total_slots)
            .filter(|&i| self.slots.is_occupied(i))
            .map(|i| self.slots.probe_distance(i))
            .sum();
        let slot_bytes = self.slots.allocated_bytes() / total_slots;

        DebugStats {
            populated: self.assigned,
            resize_threshold: self.resize_at,
            total_slots,
            max_probe_distance: self.max_probe_distance(),
            mean_probe_distance: if self.assigned == 0 {
                0.0
            } else {
                total_distance as f64 / self.assigned as f64
            },
            load_factor: self.assigned as f64 / total_slots as f64,
            total_bytes: self.slots.allocated_bytes(),
            wasted_bytes: (total_slots - self.assigned) * slot_bytes,
        }
    }

    /// Pretty-prints the probe-distance histogram horizontally using stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_probe_histogram(&self) {
        let hist = self.probe_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.assigned);

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let full = units / 8;
            let rem = units % 8;
            let mut bar = "█".repeat(full);
            if rem > 0 {
                let ch = match rem {
                    1 => '▏',
                    2 => '▎',
                    3 => '▍',
                    4 => '▌',
                    5 => '▋',
                    6 => '▊',
                    7 => '▉',
                    _ => unreachable!(),
                };
                bar.push(ch);
            }
            bar
        };

        for (distance, &count) in hist.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }

    /// Checks the live count, the cached homes and the Robin Hood ordering.
    #[cfg(test)]
    pub(crate) fn validate(&self, hasher: impl Fn(&K) -> u64) {
        let capacity = self.slots.capacity();
        assert_eq!(self.assigned, self.slots.count_occupied(), "{self:?}");
        assert!(self.assigned <= self.resize_at, "{self:?}");
        assert!(self.resize_at < capacity, "{self:?}");

        for index in 0..capacity {
            if !self.slots.is_occupied(index) {
                continue;
            }

            let home = self.home_of(hasher(self.slots.key(index)));
            assert_eq!(self.slots.home(index), home, "stale home at {index}: {self:?}");

            let dist = self.slots.probe_distance(index);
            if dist > 0 {
                let prev = (index + capacity - 1) & self.slots.mask();
                assert!(
                    self.slots.is_occupied(prev) && self.slots.probe_distance(prev) + 1 >= dist,
                    "robin hood ordering broken at {index}: {self:?}"
                );
            }
        }
    }
}

impl<K, V, G: GrowthPolicy> HashTable<K, V, G> {
    /// Allocates the table the next growth step moves into.
    fn grown_slots(&self, additional: usize) -> Result<SlotTable<K, V>, TryReserveError> {
        let current = self.slots.capacity();
        let required = self
            .assigned
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow {
                requested: usize::MAX,
            })?;

        let wanted = round_capacity(self.growth.grow(current, self.assigned, additional)?)?;
        let capacity = wanted.max(min_buffer_size(required, self.load_factor)?);

        SlotTable::try_new(capacity).inspect_err(|e| {
            log::debug!("failed to grow table from {current} to {capacity} slots: {e}");
        })
    }

    /// Moves every entry into `new_slots`, visiting old slots from last to
    /// first.
    ///
    /// If `pending` is given it is first placed in the old table, so it is
    /// rehashed like every other entry; its final slot is returned.
    fn rehash_into(
        &mut self,
        new_slots: SlotTable<K, V>,
        pending: Option<(usize, Carried<K, V>)>,
        hasher: impl Fn(&K) -> u64,
    ) -> Option<usize> {
        let pending_index = pending.map(|(slot, carried)| {
            self.assigned += 1;
            self.place(slot, carried, None).0
        });

        let mut old = core::mem::replace(&mut self.slots, new_slots);
        log::trace!(
            "rehashing {} entries from {} to {} slots",
            self.assigned,
            old.capacity(),
            self.slots.capacity()
        );

        let mut watch = None;
        for index in (0..old.capacity()).rev() {
            if !old.is_occupied(index) {
                continue;
            }

            let (key, value) = old.take(index);
            let home = self.home_of(hasher(&key));
            let (landed, moved) = self.place(
                home,
                Carried {
                    key,
                    value,
                    home,
                    dist: 0,
                },
                watch,
            );
            watch = moved;
            if pending_index == Some(index) {
                watch = Some(landed);
            }
        }

        self.resize_at = resize_threshold(self.slots.capacity(), self.load_factor);
        self.bump_generation();
        debug_assert!(self.assigned <= self.resize_at);

        watch
    }

    /// Reserves room for at least `additional` more entries without growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64, u64> = HashTable::new();
    /// table.try_reserve(100, |&k| k).unwrap();
    /// assert!(table.resize_threshold() >= 100);
    /// ```
    pub fn try_reserve(
        &mut self,
        additional: usize,
        hasher: impl Fn(&K) -> u64,
    ) -> Result<(), TryReserveError> {
        let required = self
            .assigned
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow {
                requested: usize::MAX,
            })?;
        if required <= self.resize_at {
            return Ok(());
        }

        let capacity = min_buffer_size(required, self.load_factor)?;
        let new_slots = SlotTable::try_new(capacity)?;
        self.rehash_into(new_slots, None, hasher);
        Ok(())
    }

    /// Reserves room for at least `additional` more entries without growing.
    ///
    /// # Panics
    ///
    /// Panics if the table would exceed
    /// [`MAX_CAPACITY`](crate::growth::MAX_CAPACITY) slots, and aborts if the
    /// allocation fails.
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(&K) -> u64) {
        if let Err(e) = self.try_reserve(additional, hasher) {
            e.handle();
        }
    }

    /// Shrinks the table to the smallest power of two that holds its entries
    /// at the configured load factor.
    ///
    /// Does nothing if the table is already that small or if the smaller
    /// allocation fails.
    pub fn shrink_to_fit(&mut self, hasher: impl Fn(&K) -> u64) {
        let Ok(capacity) = min_buffer_size(self.assigned, self.load_factor) else {
            return;
        };
        if capacity >= self.slots.capacity() {
            return;
        }

        if let Ok(new_slots) = SlotTable::try_new(capacity) {
            self.rehash_into(new_slots, None, hasher);
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// Constructed by [`HashTable::entry`].
pub enum Entry<'a, K, V, G> {
    /// The table holds a matching entry.
    Occupied(OccupiedEntry<'a, K, V, G>),
    /// The table holds no matching entry.
    Vacant(VacantEntry<'a, K, V, G>),
}

impl<'a, K, V, G: GrowthPolicy> Entry<'a, K, V, G> {
    /// Returns the existing value, or inserts `key` and `value`.
    pub fn or_insert(self, key: K, value: V, hasher: impl Fn(&K) -> u64) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(key, value, hasher),
        }
    }
}

/// A view into a vacant entry of a [`HashTable`].
pub struct VacantEntry<'a, K, V, G> {
    table: &'a mut HashTable<K, V, G>,
    hash: u64,
    home: usize,
    slot: usize,
    dist: usize,
}

impl<'a, K, V, G: GrowthPolicy> VacantEntry<'a, K, V, G> {
    /// Returns the hash this entry was looked up with.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Inserts the entry, growing the table first if it is at its resize
    /// threshold.
    ///
    /// `key` must match the predicate the entry was looked up with, and
    /// `hasher(&key)` must equal [`hash`](Self::hash). `hasher` is used to
    /// rehash every entry if the table grows. On error the table is left
    /// unchanged.
    pub fn try_insert(
        self,
        key: K,
        value: V,
        hasher: impl Fn(&K) -> u64,
    ) -> Result<&'a mut V, TryReserveError> {
        let table = self.table;
        let carried = Carried {
            key,
            value,
            home: self.home,
            dist: self.dist,
        };

        let index = if table.assigned == table.resize_at {
            let new_slots = table.grown_slots(1)?;
            match table.rehash_into(new_slots, Some((self.slot, carried)), hasher) {
                Some(index) => index,
                None => unreachable!("pending entry lost during rehash"),
            }
        } else {
            table.assigned += 1;
            table.bump_generation();
            table.place(self.slot, carried, None).0
        };

        Ok(table.slots.value_mut(index))
    }

    /// Inserts the entry like [`try_insert`](Self::try_insert), panicking or
    /// aborting if the table cannot grow.
    pub fn insert(self, key: K, value: V, hasher: impl Fn(&K) -> u64) -> &'a mut V {
        match self.try_insert(key, value, hasher) {
            Ok(value) => value,
            Err(e) => e.handle(),
        }
    }
}

/// A view into an occupied entry of a [`HashTable`].
pub struct OccupiedEntry<'a, K, V, G> {
    table: &'a mut HashTable<K, V, G>,
    index: usize,
}

impl<'a, K, V, G> OccupiedEntry<'a, K, V, G> {
    /// Returns the slot index of the entry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the entry's key.
    pub fn key(&self) -> &K {
        self.table.slots.key(self.index)
    }

    /// Returns the entry's value.
    pub fn get(&self) -> &V {
        self.table.slots.value(self.index)
    }

    /// Returns the entry's value mutably.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.slots.value_mut(self.index)
    }

    /// Converts the entry into a mutable reference with the table's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        self.table.slots.value_mut(self.index)
    }

    /// Removes the entry, returning its key and value.
    pub fn remove(self) -> (K, V) {
        self.table.remove_at(self.index)
    }
}

/// An iterator over the entries of a [`HashTable`], yielding each entry's
/// slot index alongside it.
///
/// Slots are visited from the last to the first.
pub struct Iter<'a, K, V> {
    slots: &'a SlotTable<K, V>,
    index: usize,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (usize, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 && self.index > 0 {
            self.index -= 1;
            if self.slots.is_occupied(self.index) {
                self.remaining -= 1;
                let (key, value) = self.slots.entry(self.index);
                return Some((self.index, key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

type RawPartsMut<'a, K, V> = Rev<
    Enumerate<
        Zip<
            Zip<slice::Iter<'a, u32>, slice::Iter<'a, MaybeUninit<K>>>,
            slice::IterMut<'a, MaybeUninit<V>>,
        >,
    >,
>;

/// An iterator over the entries of a [`HashTable`] with mutable values.
pub struct IterMut<'a, K, V> {
    inner: RawPartsMut<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (usize, &'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for (index, ((&home, key), value)) in self.inner.by_ref() {
            if home == EMPTY {
                continue;
            }

            self.remaining -= 1;
            // SAFETY: A non-empty marker means the key and value in this slot
            // are initialized.
            return Some(unsafe { (index, key.assume_init_ref(), value.assume_init_mut()) });
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// A draining iterator over the entries of a [`HashTable`].
///
/// Created by [`HashTable::drain`].
pub struct Drain<'a, K, V, G> {
    table: &'a mut HashTable<K, V, G>,
    slots: SlotTable<K, V>,
    resize_at: usize,
    index: usize,
    remaining: usize,
}

impl<K, V, G> Iterator for Drain<'_, K, V, G> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 && self.index > 0 {
            self.index -= 1;
            if self.slots.is_occupied(self.index) {
                self.remaining -= 1;
                return Some(self.slots.take(self.index));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, G> ExactSizeIterator for Drain<'_, K, V, G> {}

impl<K, V, G> Drop for Drain<'_, K, V, G> {
    fn drop(&mut self) {
        for _ in &mut *self {}
        // The table was borrowed for the whole drain, so the stand-in is
        // still empty.
        core::mem::swap(&mut self.table.slots, &mut self.slots);
        self.table.resize_at = self.resize_at;
    }
}

/// An owning iterator over the entries of a [`HashTable`].
pub struct IntoIter<K, V> {
    slots: SlotTable<K, V>,
    index: usize,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 && self.index > 0 {
            self.index -= 1;
            if self.slots.is_occupied(self.index) {
                self.remaining -= 1;
                return Some(self.slots.take(self.index));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, G> IntoIterator for HashTable<K, V, G> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            index: self.slots.capacity(),
            remaining: self.assigned,
            slots: self.slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::Hasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn hash(&self, key: u64) -> u64 {
            let mut h = SipHasher::new_with_keys(self.k0, self.k1);
            h.write_u64(key);
            h.finish()
        }
    }

    fn insert(state: &HashState, table: &mut HashTable<u64, u64>, key: u64, value: u64) -> bool {
        match table.entry(state.hash(key), |&k| k == key) {
            Entry::Vacant(entry) => {
                entry.insert(key, value, |&k| state.hash(k));
                true
            }
            Entry::Occupied(mut entry) => {
                *entry.get_mut() = value;
                false
            }
        }
    }

    fn identity(key: &u64) -> u64 {
        *key
    }

    fn identity_table(capacity: usize) -> HashTable<u64, u64> {
        HashTable::with_options(capacity, 0.75, false, BoundedProportional::default()).unwrap()
    }

    fn insert_identity(table: &mut HashTable<u64, u64>, key: u64, value: u64) {
        match table.entry(key, |&k| k == key) {
            Entry::Vacant(entry) => {
                entry.insert(key, value, identity);
            }
            Entry::Occupied(_) => panic!("{key} already present: {table:?}"),
        }
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..32u64 {
            assert!(insert(&state, &mut table, k, k * 2));
            assert_eq!(
                table.find(state.hash(k), |&v| v == k),
                Some((&k, &(k * 2))),
                "{table:?}"
            );
        }
        assert_eq!(table.len(), 32);
        table.validate(|&k| state.hash(k));

        for k in 0..32u64 {
            assert_eq!(table.find(state.hash(k), |&v| v == k), Some((&k, &(k * 2))));
        }
        assert!(table.find(state.hash(999), |&v| v == 999).is_none());
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let state = HashState::default();
        let mut table = HashTable::new();
        assert!(insert(&state, &mut table, 42, 7));
        assert!(!insert(&state, &mut table, 42, 11));
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(state.hash(42), |&k| k == 42), Some((&42, &11)));
    }

    #[test]
    fn find_mut_and_modify() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..5u64 {
            insert(&state, &mut table, k, 1);
        }
        for k in 0..5u64 {
            if let Some((_, v)) = table.find_mut(state.hash(k), |&v| v == k) {
                *v += 9;
            }
        }
        for k in 0..5u64 {
            assert_eq!(table.find(state.hash(k), |&v| v == k), Some((&k, &10)));
        }
    }

    #[test]
    fn remove_items() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..8u64 {
            insert(&state, &mut table, k, k);
        }
        for k in [0u64, 3, 7] {
            assert_eq!(table.remove(state.hash(k), |&v| v == k), Some((k, k)));
        }
        assert_eq!(table.len(), 5);
        assert!(table.remove(state.hash(1000), |&v| v == 1000).is_none());
        table.validate(|&k| state.hash(k));

        for k in [1u64, 2, 4, 5, 6] {
            assert_eq!(table.find(state.hash(k), |&v| v == k), Some((&k, &k)));
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..100_000u64 {
            insert(&state, &mut table, k, k + 1);
        }
        assert_eq!(table.len(), 100_000);
        table.validate(|&k| state.hash(k));
        for k in 0..100_000u64 {
            assert_eq!(table.find(state.hash(k), |&v| v == k), Some((&k, &(k + 1))));
        }
    }

    #[test]
    fn colliding_keys_survive_removal() {
        let mut table = identity_table(16);
        for key in [1u64, 17, 33] {
            insert_identity(&mut table, key, key * 10);
        }
        assert_eq!(table.find_index(1, |&k| k == 1), Some(1));
        assert_eq!(table.find_index(17, |&k| k == 17), Some(2));
        assert_eq!(table.find_index(33, |&k| k == 33), Some(3));

        assert_eq!(table.remove(17, |&k| k == 17), Some((17, 170)));
        table.validate(identity);

        assert_eq!(table.find(1, |&k| k == 1), Some((&1, &10)));
        // 33 was shifted back into the gap.
        assert_eq!(table.find_index(33, |&k| k == 33), Some(2));
        assert_eq!(table.find(49, |&k| k == 49), None);
        assert_eq!(table.find(17, |&k| k == 17), None);
    }

    #[test]
    fn robin_hood_displaces_richer_entries() {
        let mut table = identity_table(16);
        // 1 and 17 share home 1; 2 arrives later with home 2, which is already
        // taken by 17 (distance 1), so 2 probes to slot 3.
        insert_identity(&mut table, 1, 0);
        insert_identity(&mut table, 17, 0);
        insert_identity(&mut table, 2, 0);
        assert_eq!(table.find_index(2, |&k| k == 2), Some(3));

        // 33 (home 1) is poorer than 2 at slot 3 (distance 1 < 2), so it takes
        // slot 3 and pushes 2 on to slot 4.
        insert_identity(&mut table, 33, 0);
        assert_eq!(table.find_index(33, |&k| k == 33), Some(3));
        assert_eq!(table.find_index(2, |&k| k == 2), Some(4));
        table.validate(identity);
    }

    #[test]
    fn probe_wraps_around_the_end() {
        let mut table = identity_table(16);
        for key in [15u64, 31, 47] {
            insert_identity(&mut table, key, key);
        }
        assert_eq!(table.find_index(31, |&k| k == 31), Some(0));
        assert_eq!(table.find_index(47, |&k| k == 47), Some(1));

        assert_eq!(table.remove(15, |&k| k == 15), Some((15, 15)));
        assert_eq!(table.find_index(31, |&k| k == 31), Some(15));
        assert_eq!(table.find_index(47, |&k| k == 47), Some(0));
        table.validate(identity);
    }

    #[test]
    fn growth_happens_at_threshold() {
        let mut table = identity_table(16);
        assert_eq!(table.resize_threshold(), 12);
        for key in 1..=12u64 {
            insert_identity(&mut table, key, key);
        }
        assert_eq!(table.capacity(), 16);

        insert_identity(&mut table, 13, 13);
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.len(), 13);
        table.validate(identity);
        for key in 1..=13u64 {
            assert_eq!(table.find(key, |&k| k == key), Some((&key, &key)));
        }
    }

    #[test]
    fn sequential_growth_steps() {
        let mut table = identity_table(16);
        let mut growths = 0;
        let mut capacity = table.capacity();
        for key in 1..=1000u64 {
            insert_identity(&mut table, key, key);
            if table.capacity() != capacity {
                growths += 1;
                capacity = table.capacity();
            }
        }
        assert_eq!(growths, 7);
        assert_eq!(table.capacity(), 2048);
        table.validate(identity);
    }

    #[test]
    fn overwriting_does_not_grow() {
        let mut table = identity_table(16);
        for key in 1..=12u64 {
            insert_identity(&mut table, key, key);
        }
        for key in 1..=12u64 {
            match table.entry(key, |&k| k == key) {
                Entry::Occupied(mut entry) => *entry.get_mut() += 1,
                Entry::Vacant(_) => panic!("{key} missing"),
            }
        }
        assert_eq!(table.capacity(), 16);
    }

    #[test]
    fn growth_beyond_limit_leaves_table_unchanged() {
        struct Refuse;

        impl GrowthPolicy for Refuse {
            fn grow(&self, _: usize, occupied: usize, _: usize) -> Result<usize, TryReserveError> {
                Err(TryReserveError::CapacityOverflow {
                    requested: occupied,
                })
            }
        }

        let mut table: HashTable<u64, u64, Refuse> =
            HashTable::with_options(4, 0.75, false, Refuse).unwrap();
        for key in 1..=3u64 {
            match table.entry(key, |&k| k == key) {
                Entry::Vacant(entry) => {
                    entry.try_insert(key, key, identity).unwrap();
                }
                Entry::Occupied(_) => unreachable!(),
            }
        }

        let generation = table.generation();
        match table.entry(4, |&k| k == 4) {
            Entry::Vacant(entry) => {
                assert!(entry.try_insert(4, 4, identity).is_err());
            }
            Entry::Occupied(_) => unreachable!(),
        }
        assert_eq!(table.len(), 3);
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.generation(), generation);
        assert_eq!(table.find(4, |&k| k == 4), None);
        table.validate(identity);
    }

    #[test]
    fn remove_all_matching() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..500u64 {
            insert(&state, &mut table, k, k);
        }

        let removed = table.remove_all(|&k, _| k % 3 == 0);
        assert_eq!(removed, 167);
        assert_eq!(table.len(), 333);
        table.validate(|&k| state.hash(k));
        for k in 0..500u64 {
            assert_eq!(
                table.find(state.hash(k), |&v| v == k).is_some(),
                k % 3 != 0,
                "{k}"
            );
        }
    }

    #[test]
    fn remove_all_across_wraparound() {
        let mut table = identity_table(16);
        for key in [14u64, 15, 30, 31, 46, 47] {
            insert_identity(&mut table, key, key);
        }
        assert_eq!(table.remove_all(|&k, _| k != 47), 5);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(47, |&k| k == 47), Some((&47, &47)));
        table.validate(identity);

        let mut table = identity_table(16);
        for key in [14u64, 15, 30, 31, 46, 47] {
            insert_identity(&mut table, key, key);
        }
        assert_eq!(table.remove_all(|_, _| true), 6);
        assert!(table.is_empty());
    }

    #[test]
    fn iteration_is_descending() {
        let mut table = identity_table(16);
        for key in [3u64, 9, 5] {
            insert_identity(&mut table, key, key * 2);
        }
        let items: Vec<_> = table.iter().collect();
        assert_eq!(items, vec![(9, &9, &18), (5, &5, &10), (3, &3, &6)]);
        assert_eq!(table.iter().len(), 3);

        for (_, _, v) in table.iter_mut() {
            *v += 1;
        }
        let values: Vec<u64> = table.iter().map(|(_, _, v)| *v).collect();
        assert_eq!(values, vec![19, 11, 7]);
    }

    #[test]
    fn iter_and_drain() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 10..20u64 {
            insert(&state, &mut table, k, k);
        }

        let mut seen: Vec<u64> = table.iter().map(|(_, k, _)| *k).collect();
        seen.sort_unstable();
        assert_eq!(seen, (10..20).collect::<Vec<_>>());

        let mut drained: Vec<(u64, u64)> = table.drain().collect();
        drained.sort_unstable();
        assert_eq!(drained.len(), 10);
        assert!(table.is_empty());
        table.validate(|&k| state.hash(k));

        insert(&state, &mut table, 1, 1);
        assert_eq!(table.find(state.hash(1), |&k| k == 1), Some((&1, &1)));
    }

    #[test]
    fn partial_drain_empties_table() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..10u64 {
            insert(&state, &mut table, k, k);
        }
        {
            let mut drain = table.drain();
            assert!(drain.next().is_some());
        }
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn dropped_drain_keeps_capacity() {
        let state = HashState::default();
        let mut table = HashTable::with_capacity(64);
        for k in 0..40u64 {
            insert(&state, &mut table, k, k);
        }
        let capacity = table.capacity();
        let threshold = table.resize_threshold();

        assert_eq!(table.drain().take(3).count(), 3);
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.resize_threshold(), threshold);
        table.validate(|&k| state.hash(k));
    }

    #[test]
    fn forgotten_drain_leaves_empty_table() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..10u64 {
            insert(&state, &mut table, k, k);
        }
        let mut drain = table.drain();
        assert!(drain.next().is_some());
        core::mem::forget(drain);

        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
        for k in 0..10u64 {
            assert_eq!(table.find(state.hash(k), |&x| x == k), None);
        }
        table.validate(|&k| state.hash(k));

        for k in 0..10u64 {
            insert(&state, &mut table, k, k * 2);
        }
        assert_eq!(table.len(), 10);
        assert_eq!(table.find(state.hash(7), |&x| x == 7), Some((&7, &14)));
        table.validate(|&k| state.hash(k));
    }

    #[test]
    fn into_iter_yields_everything() {
        let mut table: HashTable<u64, String> = HashTable::new();
        for k in 1..=20u64 {
            match table.entry(k, |&v| v == k) {
                Entry::Vacant(entry) => {
                    entry.insert(k, k.to_string(), identity);
                }
                Entry::Occupied(_) => unreachable!(),
            }
        }
        let mut items: Vec<(u64, String)> = table.into_iter().take(5).collect();
        items.sort_unstable();
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn reserve_prevents_growth() {
        let mut table = identity_table(16);
        table.reserve(100, identity);
        let capacity = table.capacity();
        assert_eq!(capacity, 256);
        for key in 1..=100u64 {
            insert_identity(&mut table, key, key);
        }
        assert_eq!(table.capacity(), capacity);
        assert!(table.try_reserve(usize::MAX, identity).is_err());
        assert_eq!(table.len(), 100);
    }

    #[test]
    fn shrink_to_fit_rehashes() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..1000u64 {
            insert(&state, &mut table, k, k);
        }
        table.remove_all(|&k, _| k >= 10);
        table.shrink_to_fit(|&k| state.hash(k));
        assert_eq!(table.capacity(), 16);
        table.validate(|&k| state.hash(k));
        for k in 0..10u64 {
            assert_eq!(table.find(state.hash(k), |&v| v == k), Some((&k, &k)));
        }

        table.clear();
        table.shrink_to_fit(|&k| state.hash(k));
        assert_eq!(table.capacity(), 4);
    }

    #[test]
    fn clone_is_independent() {
        let state = HashState::default();
        let mut table = HashTable::new();
        for k in 0..50u64 {
            insert(&state, &mut table, k, k);
        }
        let mut copy = table.clone();
        copy.validate(|&k| state.hash(k));
        insert(&state, &mut copy, 1, 100);
        copy.remove(state.hash(2), |&k| k == 2);
        assert_eq!(table.find(state.hash(1), |&k| k == 1), Some((&1, &1)));
        assert_eq!(table.find(state.hash(2), |&k| k == 2), Some((&2, &2)));
        assert_eq!(copy.len(), 49);
    }

    #[test]
    fn invalid_load_factor_is_rejected() {
        let result = HashTable::<u64, u64>::with_options(16, 0.0, true, BoundedProportional::default());
        assert!(matches!(result, Err(BuildError::InvalidLoadFactor(_))));
        let result = HashTable::<u64, u64>::with_options(16, 1.5, true, BoundedProportional::default());
        assert!(matches!(result, Err(BuildError::InvalidLoadFactor(_))));
    }

    #[test]
    fn full_load_factor_keeps_a_free_slot() {
        let mut table: HashTable<u64, u64> =
            HashTable::with_options(8, 1.0, false, BoundedProportional::default()).unwrap();
        for key in 1..=7u64 {
            insert_identity(&mut table, key, key);
        }
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.find(9, |&k| k == 9), None);
        insert_identity(&mut table, 8, 8);
        assert!(table.capacity() > 8);
        table.validate(identity);
    }

    #[test]
    fn randomized_against_reference() {
        let state = HashState::default();
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut table = HashTable::new();
        let mut reference = std::collections::HashMap::new();

        for _ in 0..20_000 {
            let key = rng.random_range(0..2_000u64);
            if rng.random_bool(0.6) {
                let value = rng.random::<u64>();
                insert(&state, &mut table, key, value);
                reference.insert(key, value);
            } else {
                assert_eq!(
                    table.remove(state.hash(key), |&k| k == key).map(|(_, v)| v),
                    reference.remove(&key)
                );
            }
        }

        assert_eq!(table.len(), reference.len());
        table.validate(|&k| state.hash(k));
        for (k, v) in &reference {
            assert_eq!(table.find(state.hash(*k), |x| x == k), Some((k, v)));
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn probe_distance_stays_logarithmic() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut table: HashTable<u64, ()> = HashTable::new();
        let n = 1 << 16;
        for _ in 0..n {
            let key: u64 = rng.random();
            match table.entry(key, |&k| k == key) {
                Entry::Vacant(entry) => {
                    entry.insert(key, (), identity);
                }
                Entry::Occupied(_) => {}
            }
        }

        let stats = table.debug_stats();
        // log2(65536) = 16; Robin Hood keeps the longest probe well within a
        // small multiple of that at a 0.75 load factor.
        assert!(stats.max_probe_distance <= 32, "{stats:?}");
        assert!(stats.mean_probe_distance < 2.5, "{stats:?}");
        let hist = table.probe_histogram();
        assert_eq!(hist.iter().sum::<usize>(), table.len());
    }

    #[test]
    fn values_are_dropped() {
        use alloc::rc::Rc;

        let tracker = Rc::new(());
        let mut table: HashTable<u64, Rc<()>> = HashTable::new();
        for k in 1..=100u64 {
            match table.entry(k, |&v| v == k) {
                Entry::Vacant(entry) => {
                    entry.insert(k, tracker.clone(), identity);
                }
                Entry::Occupied(_) => unreachable!(),
            }
        }
        assert_eq!(Rc::strong_count(&tracker), 101);
        table.remove_all(|&k, _| k % 2 == 0);
        assert_eq!(Rc::strong_count(&tracker), 51);
        drop(table);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}
