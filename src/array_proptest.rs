#![cfg(test)]

// Property tests for Array kept inside the crate so capacity and the backing
// store can be checked alongside the public surface.

use crate::array::Array;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Add(u8),
    AddAll(Vec<u8>),
    FastRemove(u8),
    Remove(u8),
    SwapRemoveAt(usize),
    OrderedRemoveAt(usize),
    Pop,
    Truncate(usize),
    Trim,
    Reserve(usize),
    Clear,
}

// Small value domain so removals by value usually hit.
fn arb_op() -> impl Strategy<Value = Op> {
    let v = 0u8..16;
    prop_oneof![
        4 => v.clone().prop_map(Op::Add),
        1 => proptest::collection::vec(v.clone(), 0..12).prop_map(Op::AddAll),
        2 => v.clone().prop_map(Op::FastRemove),
        2 => v.prop_map(Op::Remove),
        1 => (0usize..40).prop_map(Op::SwapRemoveAt),
        1 => (0usize..40).prop_map(Op::OrderedRemoveAt),
        1 => Just(Op::Pop),
        1 => (0usize..40).prop_map(Op::Truncate),
        1 => Just(Op::Trim),
        1 => (0usize..20).prop_map(Op::Reserve),
        1 => Just(Op::Clear),
    ]
}

fn grown(c: usize) -> usize {
    c + core::cmp::max(c >> 1, 1)
}

// Property: state-machine equivalence against Vec<u8>.
// - Order-preserving operations keep exact sequence parity with the model.
// - `fast_remove` may reorder, so parity after it is checked as a multiset
//   and the model adopts the array's order.
// - `len <= capacity` after every operation.
// - A single `add` on a full array grows capacity to exactly C + max(C/2, 1);
//   otherwise capacity is unchanged.
// - `trim_to_size` leaves capacity == len.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in proptest::collection::vec(arb_op(), 1..80)) {
        let mut sut: Array<u8> = Array::new();
        let mut model: Vec<u8> = Vec::new();

        for op in ops {
            match op {
                Op::Add(v) => {
                    let cap = sut.capacity();
                    let was_full = sut.len() == cap;
                    sut.add(v);
                    model.push(v);
                    if was_full {
                        prop_assert_eq!(sut.capacity(), grown(cap));
                    } else {
                        prop_assert_eq!(sut.capacity(), cap);
                    }
                }
                Op::AddAll(vs) => {
                    sut.add_all(vs.iter().copied());
                    model.extend(vs);
                }
                Op::FastRemove(v) => {
                    let expected = model.contains(&v);
                    prop_assert_eq!(sut.fast_remove(&v), expected);
                    if expected {
                        let pos = model.iter().position(|x| *x == v).unwrap();
                        model.swap_remove(pos);
                    }
                    let mut a = sut.to_vec();
                    let mut b = model.clone();
                    a.sort();
                    b.sort();
                    prop_assert_eq!(a, b);
                    model = sut.to_vec();
                }
                Op::Remove(v) => {
                    let expected = model.iter().position(|x| *x == v);
                    prop_assert_eq!(sut.remove(&v), expected.is_some());
                    if let Some(i) = expected {
                        model.remove(i);
                    }
                }
                Op::SwapRemoveAt(i) => {
                    match sut.try_swap_remove(i) {
                        Ok(v) => prop_assert_eq!(v, model.swap_remove(i)),
                        Err(_) => prop_assert!(i >= model.len()),
                    }
                }
                Op::OrderedRemoveAt(i) => {
                    match sut.try_ordered_remove(i) {
                        Ok(v) => prop_assert_eq!(v, model.remove(i)),
                        Err(_) => prop_assert!(i >= model.len()),
                    }
                }
                Op::Pop => prop_assert_eq!(sut.pop(), model.pop()),
                Op::Truncate(n) => {
                    sut.truncate(n);
                    model.truncate(n);
                }
                Op::Trim => {
                    sut.trim_to_size();
                    prop_assert_eq!(sut.capacity(), sut.len());
                }
                Op::Reserve(n) => {
                    sut.reserve(n);
                    prop_assert!(sut.capacity() >= sut.len() + n);
                }
                Op::Clear => {
                    let cap = sut.capacity();
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), cap);
                }
            }

            prop_assert!(sut.len() <= sut.capacity());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.as_slice(), model.as_slice());
        }
    }
}

// Property: sorting then binary searching agrees with the sorted model.
proptest! {
    #[test]
    fn prop_sort_then_binary_search(xs in proptest::collection::vec(any::<i32>(), 0..64), probe in any::<i32>()) {
        let mut sut: Array<i32> = xs.iter().copied().collect();
        sut.sort();
        let mut model = xs;
        model.sort();
        prop_assert_eq!(sut.as_slice(), model.as_slice());
        let found = sut.binary_search_by(|v| v.cmp(&probe)).is_ok();
        prop_assert_eq!(found, model.binary_search(&probe).is_ok());
    }
}
