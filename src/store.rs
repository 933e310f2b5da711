//! Bucket storage.
//!
//! Every bucket is a singly-linked chain threaded through a shared node
//! arena. A bucket only stores the handle of its first node; each node stores
//! the handle of its successor. Freed slots are recycled through an intrusive
//! free list, so node handles stay stable until the node itself is removed.

/// Handle of a node inside the arena.
pub(crate) type NodeId = usize;

/// A position in a chain that precedes an element: either the before-first
/// sentinel of the bucket, or an existing node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    Head,
    After(NodeId),
}

#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    next: Option<NodeId>,
}

#[derive(Clone)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next_free: Option<NodeId> },
}

#[derive(Clone)]
pub(crate) struct BucketStore<K, V> {
    /// First node of each bucket's chain.
    heads: Vec<Option<NodeId>>,
    slots: Vec<Slot<K, V>>,
    free: Option<NodeId>,
    live: usize,
}

impl<K, V> BucketStore<K, V> {
    pub(crate) fn new(bucket_count: usize) -> Self {
        Self::with_capacity(bucket_count, 0)
    }

    pub(crate) fn with_capacity(bucket_count: usize, nodes: usize) -> Self {
        debug_assert!(bucket_count != 0);
        Self {
            heads: vec![None; bucket_count],
            slots: Vec::with_capacity(nodes),
            free: None,
            live: 0,
        }
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    /// Number of nodes currently linked into some chain.
    #[inline]
    pub(crate) fn node_count(&self) -> usize {
        self.live
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        match self.slots.get(id) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        match self.slots.get_mut(id) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// The node that directly follows `link` in `bucket`'s chain.
    #[inline]
    pub(crate) fn follow(&self, bucket: usize, link: Link) -> Option<NodeId> {
        match link {
            Link::Head => self.heads.get(bucket).copied().flatten(),
            Link::After(id) => self.node(id).and_then(|n| n.next),
        }
    }

    /// Lowest non-empty bucket index that is `>= from`.
    pub(crate) fn next_occupied(&self, from: usize) -> Option<usize> {
        self.heads
            .get(from..)?
            .iter()
            .position(Option::is_some)
            .map(|offset| from + offset)
    }

    /// Links a new node at the front of `bucket`'s chain.
    pub(crate) fn push_front(&mut self, bucket: usize, key: K, value: V) -> NodeId {
        let node = Node {
            key,
            value,
            next: self.heads[bucket],
        };
        let id = match self.free {
            Some(id) => {
                if let Slot::Vacant { next_free } = self.slots[id] {
                    self.free = next_free;
                }
                self.slots[id] = Slot::Occupied(node);
                id
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        };
        self.heads[bucket] = Some(id);
        self.live += 1;
        id
    }

    /// Unlinks the node following `link` in `bucket` and returns its pair.
    pub(crate) fn unlink_after(&mut self, bucket: usize, link: Link) -> Option<(K, V)> {
        let id = self.follow(bucket, link)?;
        if !matches!(self.slots[id], Slot::Occupied(_)) {
            return None;
        }
        let vacant = Slot::Vacant {
            next_free: self.free,
        };
        let Slot::Occupied(node) = std::mem::replace(&mut self.slots[id], vacant) else {
            unreachable!("slot checked occupied above");
        };
        match link {
            Link::Head => self.heads[bucket] = node.next,
            Link::After(prev) => {
                if let Some(prev) = self.node_mut(prev) {
                    prev.next = node.next;
                }
            }
        }
        self.free = Some(id);
        self.live -= 1;
        Some((node.key, node.value))
    }

    /// Handles of `bucket`'s chain, front to back.
    pub(crate) fn chain(&self, bucket: usize) -> Chain<'_, K, V> {
        Chain {
            store: self,
            next: self.heads.get(bucket).copied().flatten(),
        }
    }

    /// Mutable access to every live node, in arena order.
    pub(crate) fn nodes_mut(&mut self) -> NodesMut<'_, K, V> {
        NodesMut {
            slots: self.slots.iter_mut(),
        }
    }

    /// Consumes the store, yielding pairs bucket by bucket, each chain front
    /// to back.
    pub(crate) fn into_pairs(mut self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.live);
        for bucket in 0..self.heads.len() {
            while let Some((key, value)) = self.unlink_after(bucket, Link::Head) {
                out.push((key, value));
            }
        }
        out
    }
}

pub(crate) struct Chain<'a, K, V> {
    store: &'a BucketStore<K, V>,
    next: Option<NodeId>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (NodeId, &'a Node<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.store.node(id)?;
        self.next = node.next;
        Some((id, node))
    }
}

pub(crate) struct NodesMut<'a, K, V> {
    slots: std::slice::IterMut<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for NodesMut<'a, K, V> {
    type Item = &'a mut Node<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(|slot| match slot {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(store: &BucketStore<u32, u32>, bucket: usize) -> Vec<u32> {
        store.chain(bucket).map(|(_, n)| n.key).collect()
    }

    #[test]
    fn test_push_front_order() {
        let mut s = BucketStore::new(5);
        s.push_front(2, 1, 10);
        s.push_front(2, 2, 20);
        s.push_front(2, 3, 30);
        assert_eq!(keys(&s, 2), vec![3, 2, 1]);
        assert_eq!(s.node_count(), 3);
        assert_eq!(s.next_occupied(0), Some(2));
    }

    #[test]
    fn test_unlink_head_and_middle() {
        let mut s = BucketStore::new(5);
        let a = s.push_front(1, 1, 10);
        let b = s.push_front(1, 2, 20);
        s.push_front(1, 3, 30);

        // Chain is 3 -> 2 -> 1; drop 1 (follows b), then 3 (head).
        assert_eq!(s.unlink_after(1, Link::After(b)), Some((1, 10)));
        assert_eq!(keys(&s, 1), vec![3, 2]);
        assert_eq!(s.unlink_after(1, Link::Head), Some((3, 30)));
        assert_eq!(keys(&s, 1), vec![2]);
        assert_eq!(s.node_count(), 1);

        // Nothing follows the tail.
        assert_eq!(s.unlink_after(1, Link::After(b)), None);
        // Stale handle.
        assert_eq!(s.unlink_after(1, Link::After(a)), None);
    }

    #[test]
    fn test_slots_are_recycled() {
        let mut s = BucketStore::new(5);
        let a = s.push_front(0, 1, 1);
        s.unlink_after(0, Link::Head);
        let b = s.push_front(3, 2, 2);
        assert_eq!(a, b);
        assert_eq!(s.node(b).map(|n| n.key), Some(2));
    }

    #[test]
    fn test_failed_unlink_keeps_free_list() {
        let mut s = BucketStore::new(5);
        let a = s.push_front(0, 1, 1);
        let b = s.push_front(1, 2, 2);
        s.unlink_after(0, Link::Head);
        s.unlink_after(1, Link::Head);

        // Point a head at a vacant slot; unlinking it must be a no-op.
        s.heads[2] = Some(a);
        assert_eq!(s.unlink_after(2, Link::Head), None);
        s.heads[2] = None;
        assert_eq!(s.node_count(), 0);

        assert_eq!(s.push_front(3, 3, 3), b);
        assert_eq!(s.push_front(3, 4, 4), a);
        assert_eq!(s.push_front(3, 5, 5), 2);
        assert_eq!(keys(&s, 3), vec![5, 4, 3]);
    }

    #[test]
    fn test_next_occupied() {
        let mut s = BucketStore::new(11);
        assert_eq!(s.next_occupied(0), None);
        s.push_front(4, 1, 1);
        s.push_front(9, 2, 2);
        assert_eq!(s.next_occupied(0), Some(4));
        assert_eq!(s.next_occupied(4), Some(4));
        assert_eq!(s.next_occupied(5), Some(9));
        assert_eq!(s.next_occupied(10), None);
        assert_eq!(s.next_occupied(11), None);
    }

    #[test]
    fn test_into_pairs_drains_in_bucket_order() {
        let mut s = BucketStore::new(5);
        s.push_front(3, 30, 0);
        s.push_front(0, 1, 0);
        s.push_front(0, 2, 0);
        let got: Vec<u32> = s.into_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(got, vec![2, 1, 30]);
    }
}
