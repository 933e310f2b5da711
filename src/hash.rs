//! Caller-supplied hashing and key equivalence.
//!
//! A table is parameterised by two independent capabilities: a [`KeyHash`]
//! that turns a key into a `u64`, and a [`KeyEq`] that decides whether two
//! keys are the same. Both are implemented for plain closures, so
//! `|k: &u64| *k` is a valid hasher and `|a: &str, b: &str| a.eq_ignore_ascii_case(b)`
//! style closures are valid equivalences. Equal keys must hash equally.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

/// Hash function object: a total function from a key to an unsigned integer.
pub trait KeyHash<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;
}

impl<K: ?Sized, F> KeyHash<K> for F
where
    F: Fn(&K) -> u64,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self(key)
    }
}

/// Key equivalence predicate. Must agree with the [`KeyHash`] in use.
pub trait KeyEq<K: ?Sized> {
    fn eq_keys(&self, a: &K, b: &K) -> bool;
}

impl<K: ?Sized, F> KeyEq<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn eq_keys(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

/// Default hasher: any [`BuildHasher`] over the key's [`Hash`] impl.
#[derive(Clone, Debug, Default)]
pub struct StdHash<S = RandomState>(pub S);

impl<S> StdHash<S> {
    pub fn new(build_hasher: S) -> Self {
        Self(build_hasher)
    }
}

impl<K: Hash + ?Sized, S: BuildHasher> KeyHash<K> for StdHash<S> {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.0.hash_one(key)
    }
}

/// Default equivalence: `==`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdEq;

impl<K: Eq + ?Sized> KeyEq<K> for StdEq {
    #[inline]
    fn eq_keys(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Bucket selection and key comparison for one table.
#[derive(Clone)]
pub(crate) struct Resolver<H, E> {
    pub(crate) hasher: H,
    pub(crate) key_eq: E,
}

impl<H, E> Resolver<H, E> {
    pub(crate) fn new(hasher: H, key_eq: E) -> Self {
        Self { hasher, key_eq }
    }

    /// `hash(key) mod bucket_count`. Also used with a candidate count while
    /// planning a rebuild.
    #[inline]
    pub(crate) fn bucket_index<K: ?Sized>(&self, key: &K, bucket_count: usize) -> usize
    where
        H: KeyHash<K>,
    {
        debug_assert!(bucket_count != 0);
        (self.hasher.hash_key(key) % bucket_count as u64) as usize
    }

    #[inline]
    pub(crate) fn keys_equal<K: ?Sized>(&self, a: &K, b: &K) -> bool
    where
        E: KeyEq<K>,
    {
        self.key_eq.eq_keys(a, b)
    }
}
