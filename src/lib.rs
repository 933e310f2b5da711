//! # chain-table
//!
//! A hash table with separate chaining: one singly-linked chain per bucket,
//! bucket counts drawn from a fixed ascending list of primes, and growth
//! whenever the load factor would exceed its configured maximum.
//!
//! Besides the usual map API the table exposes [`Cursor`]s. A cursor names
//! the position *before* an element, so `find` followed by `insert_at` or
//! `erase` costs a single chain walk.
//!
//! ## Example
//!
//! ```rust
//! use chain_table::HashTable;
//!
//! let mut table: HashTable<&str, u64> = HashTable::new();
//! table.insert("hello", 1).unwrap();
//! table.insert("world", 2).unwrap();
//!
//! assert_eq!(table.get(&"hello"), Some(&1));
//! assert!(table.contains_key(&"world"));
//!
//! *table.get_or_insert_default("count").unwrap() += 5;
//! assert_eq!(table.get(&"count"), Some(&5));
//!
//! let at = table.find(&"hello");
//! table.erase(at);
//! assert_eq!(table.len(), 2);
//! ```
//!
//! ## Invalidation
//!
//! Every structural mutation (linking a new node, erasing, rehashing,
//! changing the maximum load factor, clearing) invalidates outstanding
//! cursors. The borrow checker already rules out holding references across
//! these calls; cursors are plain values and are checked only by debug
//! assertions.

mod config;
mod cursor;
mod error;
mod hash;
pub mod primes;
mod store;

pub use config::{TableBuilder, DEFAULT_MAX_LOAD_FACTOR, MIN_MAX_LOAD_FACTOR};
pub use cursor::{Cursor, IntoIter, Iter, IterMut, Keys, Values};
pub use error::{Result, TableError};
pub use hash::{KeyEq, KeyHash, StdEq, StdHash};

use std::fmt;
use std::mem;

use tracing::{debug, warn};

use cursor::Position;
use hash::Resolver;
use store::{BucketStore, Link, NodeId};

// =============================================================================
// Size planning
// =============================================================================

fn check_load_factor(factor: f64) -> Result<()> {
    // Also rejects NaN.
    if factor > MIN_MAX_LOAD_FACTOR {
        Ok(())
    } else {
        Err(TableError::InvalidLoadFactor(factor))
    }
}

/// Smallest valid bucket count that is `>= min_buckets` and strictly greater
/// than `floor(count / max_load_factor)`.
fn plan_bucket_count(min_buckets: usize, count: usize, max_load_factor: f64) -> Result<usize> {
    // Float to int casts saturate.
    let by_load = (count as f64 / max_load_factor).floor() as usize;
    let bound = min_buckets.max(by_load.saturating_add(1));
    primes::smallest_at_least(bound).ok_or_else(|| {
        warn!(
            requested = bound,
            largest = primes::largest(),
            count,
            "no bucket count large enough"
        );
        TableError::SizeExhausted {
            requested: bound,
            largest: primes::largest(),
        }
    })
}

// =============================================================================
// HashTable
// =============================================================================

/// A separate-chaining hash table.
///
/// `H` hashes keys and `E` compares them; both are fixed for the lifetime
/// of the table. The defaults use the key's `Hash` impl with a random seed
/// and `==`.
pub struct HashTable<K, V, H = StdHash, E = StdEq> {
    store: BucketStore<K, V>,
    /// Lowest non-empty bucket, `None` when the table is empty.
    first: Option<usize>,
    len: usize,
    max_load_factor: f64,
    resolver: Resolver<H, E>,
    /// Bumped on every structural change; cursors carry a copy.
    epoch: u64,
}

impl<K, V> HashTable<K, V> {
    /// An empty table with the smallest bucket count and a maximum load
    /// factor of [`DEFAULT_MAX_LOAD_FACTOR`].
    pub fn new() -> Self {
        Self::with_hasher_and_key_eq(StdHash::default(), StdEq)
    }

    /// An empty table with at least `buckets` buckets.
    pub fn with_buckets(buckets: usize) -> Result<Self> {
        Self::from_parts(buckets, DEFAULT_MAX_LOAD_FACTOR, StdHash::default(), StdEq)
    }
}

impl<K, V, H> HashTable<K, V, H, StdEq> {
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_hasher_and_key_eq(hasher, StdEq)
    }
}

impl<K, V, H, E> HashTable<K, V, H, E> {
    pub fn with_hasher_and_key_eq(hasher: H, key_eq: E) -> Self {
        Self {
            store: BucketStore::new(primes::smallest()),
            first: None,
            len: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            resolver: Resolver::new(hasher, key_eq),
            epoch: 0,
        }
    }

    pub(crate) fn from_parts(buckets: usize, max_load_factor: f64, hasher: H, key_eq: E) -> Result<Self> {
        check_load_factor(max_load_factor)?;
        let bucket_count = plan_bucket_count(buckets, 0, max_load_factor)?;
        Ok(Self {
            store: BucketStore::new(bucket_count),
            first: None,
            len: 0,
            max_load_factor,
            resolver: Resolver::new(hasher, key_eq),
            epoch: 0,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.store.bucket_count()
    }

    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.store.bucket_count() as f64
    }

    #[inline]
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    pub fn hasher(&self) -> &H {
        &self.resolver.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.resolver.key_eq
    }

    /// Drops every element. The bucket count and load factor are kept.
    pub fn clear(&mut self) {
        self.store = BucketStore::new(self.store.bucket_count());
        self.first = None;
        self.len = 0;
        self.bump();
    }

    #[inline]
    fn bump(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    #[inline]
    fn check(&self, cursor: Cursor) {
        debug_assert_eq!(
            cursor.epoch, self.epoch,
            "cursor used after the table was structurally modified"
        );
    }

    #[inline]
    fn note_occupied(&mut self, bucket: usize) {
        self.first = Some(self.first.map_or(bucket, |first| first.min(bucket)));
    }
}

// =============================================================================
// Cursors
// =============================================================================

impl<K, V, H, E> HashTable<K, V, H, E> {
    /// Cursor at the first element, or [`end`](Self::end) when empty. O(1).
    pub fn begin(&self) -> Cursor {
        Cursor {
            at: self.first.map(|bucket| Position {
                bucket,
                before: Link::Head,
            }),
            epoch: self.epoch,
        }
    }

    /// The terminal cursor.
    pub fn end(&self) -> Cursor {
        Cursor::terminal(self.epoch)
    }

    /// The cursor following `cursor`. Advancing the terminal cursor yields
    /// the terminal cursor.
    ///
    /// Amortized O(1) over a full traversal; a single step may scan past
    /// many empty buckets.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        self.check(cursor);
        Cursor {
            at: cursor.at.and_then(|pos| cursor::step(&self.store, pos)),
            epoch: self.epoch,
        }
    }

    /// The pair `cursor` denotes, `None` for the terminal cursor.
    pub fn entry_at(&self, cursor: Cursor) -> Option<(&K, &V)> {
        self.check(cursor);
        let id = cursor::target(&self.store, cursor.at?)?;
        self.store.node(id).map(|node| (&node.key, &node.value))
    }

    pub fn entry_at_mut(&mut self, cursor: Cursor) -> Option<(&K, &mut V)> {
        self.check(cursor);
        let id = cursor::target(&self.store, cursor.at?)?;
        self.store.node_mut(id).map(|node| (&node.key, &mut node.value))
    }

    /// Removes the element `cursor` denotes and returns the cursor of the
    /// element that followed it. The terminal cursor is returned unchanged.
    ///
    /// O(1) apart from the forward scan needed when the first occupied
    /// bucket empties. Never shrinks the table.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        self.unlink(cursor).0
    }

    fn unlink(&mut self, cursor: Cursor) -> (Cursor, Option<(K, V)>) {
        self.check(cursor);
        let Some(pos) = cursor.at else {
            return (cursor, None);
        };
        let Some(pair) = self.store.unlink_after(pos.bucket, pos.before) else {
            return (cursor, None);
        };
        self.len -= 1;
        self.bump();
        if self.first.is_some_and(|first| pos.bucket <= first) {
            self.first = self.store.next_occupied(pos.bucket);
        }
        let next = Cursor {
            at: cursor::settle(&self.store, pos),
            epoch: self.epoch,
        };
        (next, Some(pair))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            store: &self.store,
            at: self.begin().at,
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            nodes: self.store.nodes_mut(),
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

// =============================================================================
// Lookup, insertion, removal
// =============================================================================

impl<K, V, H, E> HashTable<K, V, H, E>
where
    H: KeyHash<K>,
    E: KeyEq<K>,
{
    /// Cursor before the element with an equal key, or the terminal cursor.
    ///
    /// Walks only the chain the key hashes to. A miss carries no insertion
    /// hint; `insert_at` resolves the bucket again.
    pub fn find(&self, key: &K) -> Cursor {
        let bucket = self.resolver.bucket_index(key, self.store.bucket_count());
        let mut before = Link::Head;
        for (id, node) in self.store.chain(bucket) {
            if self.resolver.keys_equal(&node.key, key) {
                return Cursor::at(bucket, before, self.epoch);
            }
            before = Link::After(id);
        }
        self.end()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        !self.find(key).is_end()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entry_at(self.find(key)).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let at = self.find(key);
        self.entry_at_mut(at).map(|(_, v)| v)
    }

    /// Inserts `key`, overwriting the value if it is already present.
    ///
    /// Returns `Ok(None)` when a new element was linked and `Ok(Some(old))`
    /// when an existing value was replaced. Fails only when growth is needed
    /// and no larger bucket count exists, in which case nothing changes.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let at = self.find(&key);
        self.insert_at(at, key, value)
    }

    /// Inserts using a cursor returned by [`find`](Self::find) for the same
    /// key on the unmodified table.
    ///
    /// A non-terminal cursor overwrites that element's value in place with
    /// no structural change. A terminal cursor links a new node at the front
    /// of the key's chain, growing the table first if the new element would
    /// push the load factor above the maximum.
    pub fn insert_at(&mut self, cursor: Cursor, key: K, value: V) -> Result<Option<V>> {
        self.check(cursor);
        if let Some(id) = cursor.at.and_then(|pos| cursor::target(&self.store, pos)) {
            if let Some(node) = self.store.node_mut(id) {
                debug_assert!(self.resolver.keys_equal(&node.key, &key));
                return Ok(Some(mem::replace(&mut node.value, value)));
            }
        }
        self.link_new(key, value)?;
        Ok(None)
    }

    /// Mutable reference to the value for `key`, inserting `V::default()`
    /// first if the key is absent (which may grow the table).
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V>
    where
        V: Default,
    {
        let found = self
            .find(&key)
            .at
            .and_then(|pos| cursor::target(&self.store, pos));
        let id = match found {
            Some(id) => id,
            None => self.link_new(key, V::default())?,
        };
        let node = self
            .store
            .node_mut(id)
            .expect("handle was just found or linked");
        Ok(&mut node.value)
    }

    /// Removes `key`, returning its value, or `None` if it was not present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let at = self.find(key);
        self.unlink(at).1.map(|(_, value)| value)
    }

    /// Rebuilds with the smallest valid bucket count that is at least
    /// `min_buckets` and keeps the load factor within its maximum. Does
    /// nothing when that is the current count.
    ///
    /// On [`TableError::SizeExhausted`] the table is untouched.
    pub fn rehash(&mut self, min_buckets: usize) -> Result<()> {
        let target = plan_bucket_count(min_buckets, self.len, self.max_load_factor)?;
        if target != self.store.bucket_count() {
            self.rebuild(target);
        }
        Ok(())
    }

    /// Sets the maximum load factor and regrows if the current size no
    /// longer satisfies it. The bucket count never shrinks here.
    pub fn set_max_load_factor(&mut self, factor: f64) -> Result<()> {
        check_load_factor(factor)?;
        let target = plan_bucket_count(self.store.bucket_count(), self.len, factor)?;
        debug!(from = self.max_load_factor, to = factor, "max load factor changed");
        self.max_load_factor = factor;
        if target != self.store.bucket_count() {
            self.rebuild(target);
        }
        self.bump();
        Ok(())
    }

    /// Links a new node for a key known to be absent and returns its handle.
    ///
    /// Growth is planned for the post-insert count before anything changes,
    /// so a size failure leaves the table as it was.
    fn link_new(&mut self, key: K, value: V) -> Result<NodeId> {
        let count = self.len + 1;
        let bucket_count = self.store.bucket_count();
        if count as f64 / bucket_count as f64 > self.max_load_factor {
            let target = plan_bucket_count(bucket_count.saturating_mul(2), count, self.max_load_factor)?;
            self.rebuild(target);
        }
        let bucket = self.resolver.bucket_index(&key, self.store.bucket_count());
        let id = self.store.push_front(bucket, key, value);
        self.len = count;
        self.note_occupied(bucket);
        self.bump();
        Ok(id)
    }

    /// Moves every pair into a fresh store of `bucket_count` buckets. Cannot
    /// fail; callers plan the size beforehand.
    fn rebuild(&mut self, bucket_count: usize) {
        debug!(
            from = self.store.bucket_count(),
            to = bucket_count,
            len = self.len,
            "rebuilding bucket store"
        );
        let old = mem::replace(&mut self.store, BucketStore::with_capacity(bucket_count, self.len));
        self.first = None;
        for (key, value) in old.into_pairs() {
            let bucket = self.resolver.bucket_index(&key, bucket_count);
            self.store.push_front(bucket, key, value);
            self.note_occupied(bucket);
        }
        debug_assert_eq!(self.store.node_count(), self.len);
        self.bump();
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, H: Clone, E: Clone> Clone for HashTable<K, V, H, E> {
    fn clone(&self) -> Self {
        // Bucket indices and node handles are positions, so they stay valid
        // in the copied storage.
        Self {
            store: self.store.clone(),
            first: self.first,
            len: self.len,
            max_load_factor: self.max_load_factor,
            resolver: self.resolver.clone(),
            epoch: 0,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.store.clone_from(&source.store);
        self.first = source.first;
        self.len = source.len;
        self.max_load_factor = source.max_load_factor;
        self.resolver = source.resolver.clone();
        self.bump();
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H, E> fmt::Debug for HashTable<K, V, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, H, E> IntoIterator for HashTable<K, V, H, E> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.store.into_pairs().into_iter(),
        }
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a HashTable<K, V, H, E> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a mut HashTable<K, V, H, E> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}


#[cfg(test)]
mod proptests;
