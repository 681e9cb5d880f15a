#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod builder;
mod error;
mod sentinel;
mod slot_table;

/// Growth policies and table size limits.
pub mod growth;

/// A `HashMap` using Robin Hood open addressing.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with pluggable hashing strategies.
pub mod hash_map;

pub mod hash_table;

/// A hash set built on `HashMap`.
pub mod hash_set;

/// Hashing strategies and the default hash builder.
pub mod strategy;

pub use builder::MapBuilder;
pub use error::BuildError;
pub use error::TryReserveError;
pub use growth::BoundedProportional;
pub use growth::GrowthPolicy;
pub use hash_map::Cursor;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_map::SlotHandle;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
pub use sentinel::Sentinel;
pub use strategy::DefaultHashBuilder;
pub use strategy::DefaultStrategy;
pub use strategy::HashingStrategy;
