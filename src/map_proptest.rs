#![cfg(test)]

// Property tests kept inside the crate so they can audit internal
// structure (chain integrity, len accounting, orphan-free arena) after
// every operation, including the clear-time truncation valve that only
// small capacities can reach.

use crate::map::RetainedMap;
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    HandleSet(usize, Option<i32>),
    Get(usize),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (
        0usize..=4,
        proptest::collection::vec("[a-c]{1,3}", 1..=6),
    )
        .prop_flat_map(|(nominal, pool)| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let op = prop_oneof![
                (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
                idx.clone().prop_map(OpI::Remove),
                (idx.clone(), proptest::option::of(any::<i32>()))
                    .prop_map(|(i, v)| OpI::HandleSet(i, v)),
                idx.clone().prop_map(OpI::Get),
                Just(OpI::Iterate),
                Just(OpI::Clear),
            ];
            proptest::collection::vec(op, 1..80)
                .prop_map(move |ops| (nominal, pool.clone(), ops))
        })
}

// Property: across random op sequences at deliberately tiny capacities
// (long chains, reachable truncation valve), the structure stays sound:
// - every chain link resolves and every bucket is reachable from one head;
// - `len` equals the count of present-valued buckets;
// - `get` parity with a std HashMap model for present values.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_structure_stays_sound((nominal, pool, ops) in arb_scenario()) {
        let mut sut: RetainedMap<String, i32> = RetainedMap::with_capacity(nominal);
        let mut model: HashMap<String, i32> = HashMap::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = pool[i].clone();
                    let old = sut.insert(k.clone(), v).unwrap();
                    prop_assert_eq!(old, model.insert(k, v));
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    let old = sut.remove(k.as_str()).unwrap();
                    prop_assert_eq!(old, model.remove(k));
                }
                OpI::HandleSet(i, v) => {
                    let k = &pool[i];
                    if let Some(h) = sut.entry(k.as_str()) {
                        let old = h.set(&mut sut, v).unwrap();
                        let model_old = match v {
                            Some(v) => model.insert(k.clone(), v),
                            None => model.remove(k),
                        };
                        prop_assert_eq!(old, model_old);
                    } else {
                        prop_assert!(!model.contains_key(k));
                    }
                }
                OpI::Get(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.get(k.as_str()), model.get(k));
                }
                OpI::Iterate => {
                    let mut seen: Vec<(String, i32)> =
                        sut.entries().map(|(_, k, v)| (k.clone(), *v)).collect();
                    let mut expected: Vec<(String, i32)> =
                        model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    seen.sort();
                    expected.sort();
                    prop_assert_eq!(seen, expected);
                }
                OpI::Clear => {
                    sut.clear().unwrap();
                    model.clear();
                }
            }

            sut.check_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }
    }
}
