use crate::error::Result;
use crate::hash::{StdEq, StdHash};
use crate::{primes, HashTable};

/// Load factor a table starts with.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.5;

/// A maximum load factor must be strictly above this.
pub const MIN_MAX_LOAD_FACTOR: f64 = 1e-9;

/// Builder for [`HashTable`].
///
/// ```rust
/// use chain_table::{HashTable, TableBuilder};
///
/// let table: HashTable<u64, &str> = TableBuilder::new()
///     .buckets(100)
///     .max_load_factor(0.75)
///     .build()
///     .unwrap();
/// assert_eq!(table.bucket_count(), 199);
/// ```
#[derive(Clone, Debug)]
pub struct TableBuilder<H = StdHash, E = StdEq> {
    buckets: usize,
    max_load_factor: f64,
    hasher: H,
    key_eq: E,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self {
            buckets: primes::smallest(),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            hasher: StdHash::default(),
            key_eq: StdEq,
        }
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H, E> TableBuilder<H, E> {
    /// Lower bound for the initial bucket count. The table uses the smallest
    /// valid count at or above it.
    pub fn buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn max_load_factor(mut self, factor: f64) -> Self {
        self.max_load_factor = factor;
        self
    }

    pub fn hasher<H2>(self, hasher: H2) -> TableBuilder<H2, E> {
        TableBuilder {
            buckets: self.buckets,
            max_load_factor: self.max_load_factor,
            hasher,
            key_eq: self.key_eq,
        }
    }

    pub fn key_eq<E2>(self, key_eq: E2) -> TableBuilder<H, E2> {
        TableBuilder {
            buckets: self.buckets,
            max_load_factor: self.max_load_factor,
            hasher: self.hasher,
            key_eq,
        }
    }

    /// Validates the load factor and resolves the bucket count.
    pub fn build<K, V>(self) -> Result<HashTable<K, V, H, E>> {
        HashTable::from_parts(self.buckets, self.max_load_factor, self.hasher, self.key_eq)
    }
}
