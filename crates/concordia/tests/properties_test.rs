//! Property tests: the collections against plain std models.

use concordia::{SynchronizedHashSet, SynchronizedSequence, UniqueSynchronizedSequence};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    Insert(usize, u8),
    Set(usize, u8),
    Remove(u8),
    RemoveAt(usize),
    Move(usize, usize),
    AddRange(Vec<u8>),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u8>().prop_map(|v| Op::Add(v % 32)),
        2 => (0usize..40, any::<u8>()).prop_map(|(i, v)| Op::Insert(i, v % 32)),
        2 => (0usize..40, any::<u8>()).prop_map(|(i, v)| Op::Set(i, v % 32)),
        2 => any::<u8>().prop_map(|v| Op::Remove(v % 32)),
        1 => (0usize..40).prop_map(Op::RemoveAt),
        2 => (0usize..40, 0usize..40).prop_map(|(a, b)| Op::Move(a, b)),
        1 => proptest::collection::vec(0u8..32, 0..6).prop_map(Op::AddRange),
        1 => Just(Op::Clear),
    ]
}

/// Applies `op` to a `Vec` with unique-sequence semantics.
fn apply_unique_model(model: &mut Vec<u8>, op: &Op) {
    match op {
        Op::Add(v) => {
            if !model.contains(v) {
                model.push(*v);
            }
        }
        Op::Insert(i, v) => {
            if *i <= model.len() && !model.contains(v) {
                model.insert(*i, *v);
            }
        }
        Op::Set(i, v) => {
            if *i < model.len() && (model[*i] == *v || !model.contains(v)) {
                model[*i] = *v;
            }
        }
        Op::Remove(v) => model.retain(|x| x != v),
        Op::RemoveAt(i) => {
            if *i < model.len() {
                model.remove(*i);
            }
        }
        Op::Move(a, b) => {
            if *a < model.len() && *b < model.len() {
                let item = model.remove(*a);
                model.insert(*b, item);
            }
        }
        Op::AddRange(values) => {
            for v in values {
                if !model.contains(v) {
                    model.push(*v);
                }
            }
        }
        Op::Clear => model.clear(),
    }
}

fn apply_unique(seq: &UniqueSynchronizedSequence<u8>, op: &Op) {
    // Out-of-range errors are part of the contract; the model skips them too.
    let _ = match op {
        Op::Add(v) => seq.add(*v).map(drop),
        Op::Insert(i, v) => seq.insert(*i, *v).map(drop),
        Op::Set(i, v) => seq.set(*i, *v).map(drop),
        Op::Remove(v) => seq.remove(v).map(drop),
        Op::RemoveAt(i) => seq.remove_at(*i).map(drop),
        Op::Move(a, b) => seq.move_item(*a, *b),
        Op::AddRange(values) => seq.add_range(values.iter().copied()).map(drop),
        Op::Clear => seq.clear(),
    };
}

proptest! {
    #[test]
    fn move_preserves_multiset(
        items in proptest::collection::vec(any::<i16>(), 1..40),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let seq = SynchronizedSequence::from_source(items.clone());
        let old_index = a.index(items.len());
        let new_index = b.index(items.len());

        seq.move_item(old_index, new_index).unwrap();

        let mut before = items.clone();
        let mut after = seq.to_vec().unwrap();
        prop_assert_eq!(after.len(), before.len());
        prop_assert_eq!(seq.get(new_index).unwrap(), items[old_index]);
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(after, before);
    }

    #[test]
    fn unique_sequence_tracks_model(ops in proptest::collection::vec(op(), 1..60)) {
        let seq = UniqueSynchronizedSequence::new();
        let mut model = Vec::new();

        for op in &ops {
            apply_unique(&seq, op);
            apply_unique_model(&mut model, op);

            let items = seq.to_vec().unwrap();
            prop_assert_eq!(&items, &model, "after {:?}", op);

            let distinct: HashSet<_> = items.iter().collect();
            prop_assert_eq!(distinct.len(), items.len());
            for v in 0u8..32 {
                prop_assert_eq!(seq.contains(&v).unwrap(), model.contains(&v));
            }
        }
    }

    #[test]
    fn set_algebra_matches_std(
        start in proptest::collection::hash_set(0u8..24, 0..16),
        other in proptest::collection::vec(0u8..24, 0..16),
        which in 0usize..4,
    ) {
        let set = SynchronizedHashSet::from_source(start.iter().copied());
        let other_set: HashSet<u8> = other.iter().copied().collect();

        let (changed, expected): (usize, HashSet<u8>) = match which {
            0 => {
                let expected: HashSet<u8> = start.union(&other_set).copied().collect();
                (set.union_with(other.clone()).unwrap(), expected)
            }
            1 => {
                let expected: HashSet<u8> = start.intersection(&other_set).copied().collect();
                (set.intersect_with(other.clone()).unwrap(), expected)
            }
            2 => {
                let expected: HashSet<u8> = start.difference(&other_set).copied().collect();
                (set.except_with(other.clone()).unwrap(), expected)
            }
            _ => {
                let expected: HashSet<u8> =
                    start.symmetric_difference(&other_set).copied().collect();
                (set.symmetric_except_with(other.clone()).unwrap(), expected)
            }
        };

        let actual: HashSet<u8> = set.snapshot().unwrap().collect();
        prop_assert_eq!(changed, start.symmetric_difference(&actual).count());
        prop_assert_eq!(&actual, &expected);
        prop_assert!(set.set_equals(expected.iter().copied()).unwrap());
        prop_assert_eq!(set.is_subset_of(other.clone()).unwrap(), actual.is_subset(&other_set));
        prop_assert_eq!(set.overlaps(other.clone()).unwrap(), !actual.is_disjoint(&other_set));
    }
}
