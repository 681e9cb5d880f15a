use alloc::boxed::Box;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::mem::MaybeUninit;

use crate::error::TryReserveError;

/// Marker value for a slot that holds no entry.
///
/// Any other marker value is the home index of the entry in that slot.
pub(crate) const EMPTY: u32 = u32::MAX;

/// An entry travelling along the probe sequence during Robin Hood insertion.
pub(crate) struct Carried<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) home: usize,
    pub(crate) dist: usize,
}

/// Parallel key, value and marker arrays of one power-of-two length.
///
/// Invariant: `keys[i]` and `values[i]` are initialized exactly when
/// `homes[i] != EMPTY`.
pub(crate) struct SlotTable<K, V> {
    keys: Box<[MaybeUninit<K>]>,
    values: Box<[MaybeUninit<V>]>,
    homes: Box<[u32]>,
}

fn try_uninit_slice<T>(len: usize) -> Result<Box<[MaybeUninit<T>]>, TryReserveError> {
    let mut buffer: Vec<MaybeUninit<T>> = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| alloc_error::<T>(len))?;
    buffer.resize_with(len, MaybeUninit::uninit);
    Ok(buffer.into_boxed_slice())
}

fn alloc_error<T>(len: usize) -> TryReserveError {
    match Layout::array::<T>(len) {
        Ok(layout) => TryReserveError::AllocError { layout },
        Err(_) => TryReserveError::CapacityOverflow { requested: len },
    }
}

impl<K, V> SlotTable<K, V> {
    /// Allocates an empty table of `capacity` slots.
    ///
    /// Nothing observable happens if any of the three allocations fails.
    pub(crate) fn try_new(capacity: usize) -> Result<Self, TryReserveError> {
        debug_assert!(capacity.is_power_of_two());
        debug_assert!(capacity <= EMPTY as usize);

        let keys = try_uninit_slice::<K>(capacity)?;
        let values = try_uninit_slice::<V>(capacity)?;

        let mut homes: Vec<u32> = Vec::new();
        homes
            .try_reserve_exact(capacity)
            .map_err(|_| alloc_error::<u32>(capacity))?;
        homes.resize(capacity, EMPTY);

        Ok(Self {
            keys,
            values,
            homes: homes.into_boxed_slice(),
        })
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.homes.len()
    }

    #[inline(always)]
    pub(crate) fn mask(&self) -> usize {
        self.homes.len() - 1
    }

    #[inline(always)]
    pub(crate) fn is_occupied(&self, index: usize) -> bool {
        self.homes[index] != EMPTY
    }

    /// Returns the cached home index of the entry at `index`.
    #[inline(always)]
    pub(crate) fn home(&self, index: usize) -> usize {
        debug_assert!(self.is_occupied(index));
        self.homes[index] as usize
    }

    /// Number of slots between the entry at `index` and its home.
    #[inline(always)]
    pub(crate) fn probe_distance(&self, index: usize) -> usize {
        index.wrapping_sub(self.home(index)) & self.mask()
    }

    #[inline(always)]
    pub(crate) fn key(&self, index: usize) -> &K {
        assert!(self.is_occupied(index));
        // SAFETY: The slot is occupied, so its key is initialized.
        unsafe { self.keys.get_unchecked(index).assume_init_ref() }
    }

    #[inline(always)]
    pub(crate) fn value(&self, index: usize) -> &V {
        assert!(self.is_occupied(index));
        // SAFETY: The slot is occupied, so its value is initialized.
        unsafe { self.values.get_unchecked(index).assume_init_ref() }
    }

    #[inline(always)]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        assert!(self.is_occupied(index));
        // SAFETY: The slot is occupied, so its value is initialized.
        unsafe { self.values.get_unchecked_mut(index).assume_init_mut() }
    }

    #[inline(always)]
    pub(crate) fn entry(&self, index: usize) -> (&K, &V) {
        (self.key(index), self.value(index))
    }

    #[inline(always)]
    pub(crate) fn entry_mut(&mut self, index: usize) -> (&K, &mut V) {
        assert!(self.is_occupied(index));
        // SAFETY: The slot is occupied, so both key and value are initialized.
        // Keys and values live in distinct allocations.
        unsafe {
            (
                self.keys.get_unchecked(index).assume_init_ref(),
                self.values.get_unchecked_mut(index).assume_init_mut(),
            )
        }
    }

    /// Writes an entry into an empty slot.
    #[inline]
    pub(crate) fn write(&mut self, index: usize, home: usize, key: K, value: V) {
        debug_assert!(!self.is_occupied(index));
        debug_assert!(home < self.capacity());

        self.keys[index].write(key);
        self.values[index].write(value);
        self.homes[index] = home as u32;
    }

    /// Moves an entry out of an occupied slot, leaving it empty.
    #[inline]
    pub(crate) fn take(&mut self, index: usize) -> (K, V) {
        assert!(self.is_occupied(index));
        self.homes[index] = EMPTY;
        // SAFETY: The slot was occupied and is now marked empty, so its
        // contents are read exactly once.
        unsafe {
            (
                self.keys.get_unchecked(index).assume_init_read(),
                self.values.get_unchecked(index).assume_init_read(),
            )
        }
    }

    /// Swaps `carried` with the occupant of `index`.
    ///
    /// The returned entry is the former occupant, with its distance set to
    /// its probe distance at `index`.
    #[inline]
    pub(crate) fn swap(&mut self, index: usize, carried: Carried<K, V>) -> Carried<K, V> {
        let home = self.home(index);
        let dist = self.probe_distance(index);
        let (key, value) = self.take(index);
        self.write(index, carried.home, carried.key, carried.value);

        Carried {
            key,
            value,
            home,
            dist,
        }
    }

    /// Moves the entry at `from` into the empty slot `to`, leaving `from`
    /// empty.
    #[inline]
    pub(crate) fn shift(&mut self, from: usize, to: usize) {
        debug_assert!(self.is_occupied(from));
        debug_assert!(!self.is_occupied(to));
        debug_assert_ne!(from, to);

        // SAFETY: `from` is occupied and `to` is empty; the bits are moved
        // and `from` is marked empty so they are never read or dropped twice.
        unsafe {
            let key = self.keys.get_unchecked(from).assume_init_read();
            let value = self.values.get_unchecked(from).assume_init_read();
            self.keys.get_unchecked_mut(to).write(key);
            self.values.get_unchecked_mut(to).write(value);
        }
        self.homes[to] = self.homes[from];
        self.homes[from] = EMPTY;
    }

    /// Drops every entry, leaving all slots empty.
    pub(crate) fn clear(&mut self) {
        for index in 0..self.homes.len() {
            if self.homes[index] == EMPTY {
                continue;
            }

            self.homes[index] = EMPTY;
            // SAFETY: The slot was occupied; it is marked empty before the
            // drop so a panicking destructor cannot cause a double drop.
            unsafe {
                self.keys.get_unchecked_mut(index).assume_init_drop();
                self.values.get_unchecked_mut(index).assume_init_drop();
            }
        }
    }

    /// Splits the table into its marker, key and value arrays.
    #[inline]
    pub(crate) fn raw_parts_mut(&mut self) -> (&[u32], &[MaybeUninit<K>], &mut [MaybeUninit<V>]) {
        (&self.homes, &self.keys, &mut self.values)
    }

    /// Counts occupied slots by scanning the markers.
    #[cfg(test)]
    pub(crate) fn count_occupied(&self) -> usize {
        self.homes.iter().filter(|&&h| h != EMPTY).count()
    }

    /// Bytes held by the three arrays.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.capacity()
            * (core::mem::size_of::<K>() + core::mem::size_of::<V>() + core::mem::size_of::<u32>())
    }
}

impl<K, V> Clone for SlotTable<K, V>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        let mut table = match Self::try_new(self.capacity()) {
            Ok(table) => table,
            Err(e) => e.handle(),
        };

        for index in 0..self.capacity() {
            if self.is_occupied(index) {
                let (key, value) = self.entry(index);
                table.write(index, self.home(index), key.clone(), value.clone());
            }
        }

        table
    }
}

impl<K, V> Drop for SlotTable<K, V> {
    fn drop(&mut self) {
        if core::mem::needs_drop::<K>() || core::mem::needs_drop::<V>() {
            self.clear();
        }
    }
}
