use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::HashMap;

fn validate_table<K, V, H: KeyHash<K>, E>(t: &HashTable<K, V, H, E>) {
    let bucket_count = t.bucket_count();
    assert!(
        primes::is_valid(bucket_count),
        "bucket count {bucket_count} is not a valid size"
    );
    assert!(
        t.len as f64 / bucket_count as f64 <= t.max_load_factor,
        "load factor {} above maximum {}",
        t.load_factor(),
        t.max_load_factor
    );

    let mut reachable = 0usize;
    for bucket in 0..bucket_count {
        for (_, node) in t.store.chain(bucket) {
            assert_eq!(
                t.resolver.bucket_index(&node.key, bucket_count),
                bucket,
                "node stored in the wrong bucket"
            );
            reachable += 1;
        }
    }
    assert_eq!(reachable, t.len, "reachable node count must match len");
    assert_eq!(t.store.node_count(), t.len, "arena node count must match len");

    assert_eq!(
        t.first,
        t.store.next_occupied(0),
        "cached first bucket must be the lowest non-empty one"
    );
    assert_eq!(t.begin().bucket(), t.first);
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    Insert(#[proptest(strategy = "0u16..512")] u16, u32),
    #[proptest(weight = 20)]
    Remove(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 10)]
    Get(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 10)]
    GetOrDefault(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 8)]
    FindInsert(#[proptest(strategy = "0u16..512")] u16, u32),
    #[proptest(weight = 6)]
    EraseNth(#[proptest(strategy = "0usize..64")] usize),
    #[proptest(weight = 2)]
    SetMaxLoadFactor(#[proptest(strategy = "0.05f64..4.0")] f64),
    #[proptest(weight = 2)]
    Rehash(#[proptest(strategy = "0usize..2_000")] usize),
    #[proptest(weight = 1)]
    Clear,
}

fn run_ops<H: KeyHash<u16>>(t: &mut HashTable<u16, u32, H>, ops: Vec<Op>) -> std::result::Result<(), TestCaseError> {
    let mut m: HashMap<u16, u32> = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let old_t = t.insert(key, value);
                let old_m = m.insert(key, value);
                prop_assert_eq!(old_t, Ok(old_m));
            }
            Op::Remove(key) => {
                prop_assert_eq!(t.remove(&key), m.remove(&key));
            }
            Op::Get(key) => {
                prop_assert_eq!(t.get(&key), m.get(&key));
                prop_assert_eq!(t.contains_key(&key), m.contains_key(&key));
            }
            Op::GetOrDefault(key) => {
                let got = *t.get_or_insert_default(key).unwrap();
                prop_assert_eq!(got, *m.entry(key).or_default());
            }
            Op::FindInsert(key, value) => {
                let at = t.find(&key);
                prop_assert_eq!(at.is_end(), !m.contains_key(&key));
                let old_t = t.insert_at(at, key, value);
                prop_assert_eq!(old_t, Ok(m.insert(key, value)));
            }
            Op::EraseNth(n) => {
                if t.is_empty() {
                    prop_assert_eq!(t.erase(t.end()), t.end());
                    continue;
                }
                let mut at = t.begin();
                for _ in 0..n % t.len() {
                    at = t.advance(at);
                }
                let key = *t.entry_at(at).unwrap().0;
                let following = t.advance(at);
                let following_key = t.entry_at(following).map(|(k, _)| *k);

                let next = t.erase(at);
                prop_assert_eq!(t.entry_at(next).map(|(k, _)| *k), following_key);
                prop_assert!(m.remove(&key).is_some());
            }
            Op::SetMaxLoadFactor(factor) => {
                let before = t.bucket_count();
                t.set_max_load_factor(factor).unwrap();
                prop_assert!(t.bucket_count() >= before);
                prop_assert_eq!(t.max_load_factor(), factor);
            }
            Op::Rehash(hint) => {
                t.rehash(hint).unwrap();
                prop_assert!(t.bucket_count() >= hint.min(primes::largest()));
            }
            Op::Clear => {
                t.clear();
                m.clear();
            }
        }

        prop_assert_eq!(t.len(), m.len());
        validate_table(t);
    }

    let pairs: Vec<(u16, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
    prop_assert_eq!(pairs.len(), m.len(), "traversal visited duplicates");
    let visited: HashMap<u16, u32> = pairs.into_iter().collect();
    prop_assert_eq!(visited, m);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_std_hash(ops in prop::collection::vec(any::<Op>(), 0..=600)) {
        let mut t: HashTable<u16, u32> = HashTable::new();
        run_ops(&mut t, ops)?;
    }

    #[test]
    fn prop_equivalence_colliding_hash(ops in prop::collection::vec(any::<Op>(), 0..=600)) {
        // Only 7 distinct hashes, so chains get long.
        let mut t: HashTable<u16, u32, fn(&u16) -> u64> =
            HashTable::with_hasher((|k: &u16| u64::from(*k % 7)) as fn(&u16) -> u64);
        run_ops(&mut t, ops)?;
    }
}

#[test]
fn exhaustive_erase_order_small_set() {
    let keys: Vec<u64> = vec![0, 5, 10, 1, 6, 3];

    fn for_each_permutation(items: &[u64], f: &mut impl FnMut(&[u64])) {
        fn rec(items: &[u64], used: &mut [bool], out: &mut Vec<u64>, f: &mut impl FnMut(&[u64])) {
            if out.len() == items.len() {
                f(out.as_slice());
                return;
            }
            for i in 0..items.len() {
                if used[i] {
                    continue;
                }
                used[i] = true;
                out.push(items[i]);
                rec(items, used, out, f);
                out.pop();
                used[i] = false;
            }
        }
        let mut used = vec![false; items.len()];
        let mut out = Vec::with_capacity(items.len());
        rec(items, &mut used, &mut out, f);
    }

    let identity: fn(&u64) -> u64 = |k| *k;
    let mut base: HashTable<u64, u64, fn(&u64) -> u64> = TableBuilder::new()
        .hasher(identity)
        .max_load_factor(2.0)
        .build()
        .unwrap();
    for &k in &keys {
        base.insert(k, k).unwrap();
    }
    assert_eq!(base.bucket_count(), 5);

    for_each_permutation(&keys, &mut |perm: &[u64]| {
        let mut t = base.clone();
        let mut left = keys.len();
        for k in perm {
            assert_eq!(t.remove(k), Some(*k));
            left -= 1;
            assert_eq!(t.len(), left);
            validate_table(&t);
        }
        assert_eq!(t.begin(), t.end());
    });
}
