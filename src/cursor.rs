//! Cursors and iterators.
//!
//! A [`Cursor`] never points at an element directly. It names the bucket and
//! the position *before* the element (the chain's before-first sentinel or
//! the preceding node), which is what a singly-linked chain needs to unlink
//! the element in O(1).

use crate::store::{BucketStore, Link, NodeId, NodesMut};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Position {
    pub(crate) bucket: usize,
    pub(crate) before: Link,
}

/// A traversal handle into a [`HashTable`](crate::HashTable).
///
/// Either terminal (the `end()` / not-found state) or a `(bucket,
/// predecessor)` pair. Cursors are plain values that do not borrow the
/// table; the table methods that take one (`entry_at`, `advance`,
/// `insert_at`, `erase`) resolve it against the current storage.
///
/// Any structural mutation (an insert that links a new node, an erase, a
/// rehash, a load factor change) invalidates every outstanding cursor.
/// Using a stale cursor, or one from another table, is a logic error: debug
/// builds assert on it, release builds give unspecified (but memory-safe)
/// results.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    pub(crate) at: Option<Position>,
    pub(crate) epoch: u64,
}

impl Cursor {
    pub(crate) fn terminal(epoch: u64) -> Self {
        Self { at: None, epoch }
    }

    pub(crate) fn at(bucket: usize, before: Link, epoch: u64) -> Self {
        Self {
            at: Some(Position { bucket, before }),
            epoch,
        }
    }

    /// Whether this is the terminal (end / not found) cursor.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.at.is_none()
    }

    /// Bucket index the cursor is positioned in, `None` when terminal.
    #[inline]
    pub fn bucket(&self) -> Option<usize> {
        self.at.map(|p| p.bucket)
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}

impl Eq for Cursor {}

/// Advances a position by one element.
///
/// Stays in the chain when a further node exists; otherwise moves to the
/// before-first sentinel of the next non-empty bucket, or returns `None`.
pub(crate) fn step<K, V>(store: &BucketStore<K, V>, pos: Position) -> Option<Position> {
    if let Some(current) = store.follow(pos.bucket, pos.before) {
        if store.follow(pos.bucket, Link::After(current)).is_some() {
            return Some(Position {
                bucket: pos.bucket,
                before: Link::After(current),
            });
        }
    }
    first_from(store, pos.bucket + 1)
}

/// Before-first position of the lowest non-empty bucket `>= from`.
pub(crate) fn first_from<K, V>(store: &BucketStore<K, V>, from: usize) -> Option<Position> {
    store.next_occupied(from).map(|bucket| Position {
        bucket,
        before: Link::Head,
    })
}

/// Re-anchors a position after the element it named was removed: keeps it
/// when the chain still continues, otherwise moves to the next bucket.
pub(crate) fn settle<K, V>(store: &BucketStore<K, V>, pos: Position) -> Option<Position> {
    match store.follow(pos.bucket, pos.before) {
        Some(_) => Some(pos),
        None => first_from(store, pos.bucket + 1),
    }
}

#[inline]
pub(crate) fn target<K, V>(store: &BucketStore<K, V>, pos: Position) -> Option<NodeId> {
    store.follow(pos.bucket, pos.before)
}

// =============================================================================
// Borrowing iterators
// =============================================================================

/// Iterator over `(&K, &V)` in bucket order, driven by the same cursor
/// stepping as [`HashTable::advance`](crate::HashTable::advance).
pub struct Iter<'a, K, V> {
    pub(crate) store: &'a BucketStore<K, V>,
    pub(crate) at: Option<Position>,
    pub(crate) remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.at?;
        let node = target(self.store, pos).and_then(|id| self.store.node(id))?;
        self.at = step(self.store, pos);
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> std::iter::FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            at: self.at,
            remaining: self.remaining,
        }
    }
}

/// Iterator over `(&K, &mut V)`. Order is unspecified.
pub struct IterMut<'a, K, V> {
    pub(crate) nodes: NodesMut<'a, K, V>,
    pub(crate) remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.next()?;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &mut node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Owning iterator, yields pairs in bucket order.
pub struct IntoIter<K, V> {
    pub(crate) inner: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
