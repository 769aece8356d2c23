//! Property-based tests using proptest
//!
//! Random sequences of push, pop and remove-by-handle are applied to a heap
//! and to a plain `Vec` model. After every step the heap's layout, which is
//! reconstructed from the items' own index slots, must satisfy the heap
//! property and agree with the model.

use proptest::prelude::*;

use std::rc::Rc;

use indexed_heap::{HeapIndex, Indexed, IndexedHeap};

type Handle = Rc<Indexed<u16>>;

#[derive(Clone, Debug)]
enum Op {
    Push(u16),
    Pop,
    Remove(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u16>().prop_map(Op::Push),
        1 => Just(Op::Pop),
        1 => any::<usize>().prop_map(Op::Remove),
    ]
}

/// Rebuilds the heap's storage order from the live handles' index slots and
/// checks both heap invariants over it.
fn check_layout(heap: &IndexedHeap<Handle>, live: &[Handle]) -> Result<(), TestCaseError> {
    prop_assert_eq!(heap.len(), live.len());

    let mut layout: Vec<Option<&Handle>> = vec![None; live.len()];
    for item in live {
        prop_assert!(heap.contains(item));
        let slot = item.heap_index();
        prop_assert!(slot < layout.len());
        prop_assert!(layout[slot].is_none(), "two items claim slot {}", slot);
        layout[slot] = Some(item);
    }

    for i in 1..layout.len() {
        let child = layout[i].unwrap();
        let parent = layout[(i - 1) / 2].unwrap();
        prop_assert!(***parent <= ***child, "slot {} is less than its parent", i);
    }

    if let Some(front) = heap.peek() {
        prop_assert!(Rc::ptr_eq(front, layout[0].unwrap()));
    }
    Ok(())
}

fn run(ops: Vec<Op>) -> Result<(IndexedHeap<Handle>, Vec<Handle>), TestCaseError> {
    let mut heap = IndexedHeap::new();
    let mut live: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            Op::Push(value) => {
                let item = Rc::new(Indexed::new(value));
                heap.push(item.clone());
                live.push(item);
            }
            Op::Pop => {
                let popped = heap.try_pop();
                prop_assert_eq!(popped.is_some(), !live.is_empty());
                if let Some(popped) = popped {
                    prop_assert!(live.iter().all(|item| ***item >= **popped));
                    let at = live.iter().position(|item| Rc::ptr_eq(item, &popped));
                    prop_assert!(at.is_some());
                    live.swap_remove(at.unwrap());
                }
            }
            Op::Remove(pick) => {
                if !live.is_empty() {
                    let victim = live.swap_remove(pick % live.len());
                    let removed = heap.remove(&victim);
                    prop_assert!(Rc::ptr_eq(&removed, &victim));
                    prop_assert!(!heap.contains(&victim));
                }
            }
        }
        check_layout(&heap, &live)?;
    }
    Ok((heap, live))
}

proptest! {
    #[test]
    fn random_ops_keep_invariants(ops in prop::collection::vec(op(), 0..300)) {
        run(ops)?;
    }

    #[test]
    fn drain_yields_survivors_sorted(ops in prop::collection::vec(op(), 0..300)) {
        let (mut heap, live) = run(ops)?;

        let mut expected: Vec<u16> = live.iter().map(|item| ***item).collect();
        expected.sort();

        let mut drained = Vec::new();
        while let Some(item) = heap.try_pop() {
            drained.push(**item);
        }
        prop_assert_eq!(drained, expected);
    }

    #[test]
    fn size_counts_pushes_minus_removals(values in prop::collection::vec(any::<u16>(), 1..200),
                                         removals in 0usize..200) {
        let items: Vec<Handle> = values.iter().map(|&v| Rc::new(Indexed::new(v))).collect();
        let mut heap = IndexedHeap::new();
        heap.extend(items.iter().cloned());

        let removals = removals % (items.len() + 1);
        for item in items.iter().take(removals) {
            prop_assert!(heap.try_remove(item).is_ok());
        }
        prop_assert_eq!(heap.len(), items.len() - removals);
    }

    #[test]
    fn reversed_comparator_pops_descending(values in prop::collection::vec(any::<u16>(), 0..200)) {
        let mut heap = IndexedHeap::with_comparator(|a: &Handle, b: &Handle| b.cmp(a));
        for &v in &values {
            heap.push(Rc::new(Indexed::new(v)));
        }

        let mut expected = values.clone();
        expected.sort_by(|a, b| b.cmp(a));

        let mut drained = Vec::new();
        while let Some(item) = heap.try_pop() {
            drained.push(**item);
        }
        prop_assert_eq!(drained, expected);
    }
}
