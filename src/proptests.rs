use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

/// Structural snapshot: (key, color, parent key) per node in pre-order.
fn snapshot(t: &RbTree<u16>) -> Vec<(u16, Color, Option<u16>)> {
    let mut out = Vec::with_capacity(t.len());
    let mut stack: Vec<NodeRef<'_, u16>> = t.root().into_iter().collect();
    while let Some(n) = stack.pop() {
        out.push((*n.key(), n.color(), n.parent().map(|p| *p.key())));
        stack.extend(n.right());
        stack.extend(n.left());
    }
    out
}

fn assert_height_bound(t: &RbTree<u16>) {
    let bound = 2.0 * ((t.len() + 1) as f64).log2();
    assert!(
        t.height() as f64 <= bound,
        "height {} exceeds {bound} for {} keys",
        t.height(),
        t.len()
    );
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 6)]
    Insert(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 2)]
    Contains(#[proptest(strategy = "0u16..512")] u16),
    #[proptest(weight = 1)]
    Ceiling(#[proptest(strategy = "0u16..512")] u16),
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t: RbTree<u16> = RbTree::new();
        let mut s: BTreeSet<u16> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(k) => {
                    let before = snapshot(&t);
                    let fresh = s.insert(k);
                    match t.insert(k) {
                        Ok(()) => prop_assert!(fresh),
                        Err(e) => {
                            prop_assert!(!fresh);
                            prop_assert_eq!(e, Error::DuplicateKey);
                            prop_assert_eq!(snapshot(&t), before);
                        }
                    }
                    prop_assert_eq!(t.validate(), Ok(()));
                }
                Op::Contains(k) => {
                    prop_assert_eq!(t.contains(&k), s.contains(&k));
                }
                Op::Ceiling(k) => {
                    prop_assert_eq!(t.ceiling(&k), s.range(k..).next());
                }
            }

            prop_assert_eq!(t.len(), s.len());
        }

        assert_height_bound(&t);
        prop_assert_eq!(t.first(), s.first());
        prop_assert_eq!(t.last(), s.last());
        let got: Vec<u16> = t.iter().copied().collect();
        let expected: Vec<u16> = s.iter().copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_distinct_keys_any_order(keys in prop::collection::hash_set(any::<u16>(), 0..=2000)) {
        let keys: Vec<u16> = keys.into_iter().collect();
        let t = RbTree::try_from_iter(keys.iter().copied()).unwrap();

        prop_assert_eq!(t.validate(), Ok(()));
        assert_height_bound(&t);

        let mut sorted = keys;
        sorted.sort_unstable();
        let got: Vec<u16> = t.iter().copied().collect();
        prop_assert_eq!(got, sorted);
    }

    #[test]
    fn prop_reinsert_is_rejected(keys in prop::collection::btree_set(any::<u16>(), 1..=200), pick in any::<prop::sample::Index>()) {
        let keys: Vec<u16> = keys.into_iter().collect();
        let mut t = RbTree::try_from_iter(keys.iter().copied()).unwrap();
        let before = snapshot(&t);

        let dup = keys[pick.index(keys.len())];
        prop_assert_eq!(t.insert(dup), Err(Error::DuplicateKey));
        prop_assert_eq!(snapshot(&t), before);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u16> = (1..=7).collect();

    for_each_permutation(&keys, |perm| {
        let mut t: RbTree<u16> = RbTree::new();
        for (i, k) in perm.iter().enumerate() {
            t.insert(*k).unwrap();
            t.validate()
                .unwrap_or_else(|e| panic!("{e} after inserting {:?}", &perm[..=i]));
        }
        assert_height_bound(&t);
        assert!(t.iter().copied().eq(1..=7));
    });
}
