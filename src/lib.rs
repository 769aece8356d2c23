// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A binary heap whose items track their own position.
//!
//! An `IndexedHeap` stores *handles* (`&T`, `Rc<T>`, `Arc<T>`, ...) and keeps an index slot
//! inside every item up to date with the item's current position in the heap. Because of this,
//! any item that is currently in the heap can be removed (or repositioned after its priority
//! changed) in `O(log n)` time, without first searching for it. This makes the heap a good fit
//! for timer wheels, event queues and other schedulers that need cancellable priority ordering.
//!
//! Insertion has amortized `O(log n)` time complexity. Popping the front item and removing an
//! arbitrary item are `O(log n)`. Retrieving the front item is `O(1)`.
//!
//! The heap never allocates or drops the items themselves; it only rearranges their handles.
//! It is not thread-safe: index slots are written through shared references, so they are
//! normally `Cell`s.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use indexed_heap::{Indexed, IndexedHeap};
//!
//! let mut heap = IndexedHeap::new();
//!
//! let a = Rc::new(Indexed::new(5));
//! let b = Rc::new(Indexed::new(1));
//! let c = Rc::new(Indexed::new(3));
//!
//! heap.push(a.clone());
//! heap.push(b.clone());
//! heap.push(c.clone());
//!
//! // `b` is removed directly through its own index slot.
//! heap.remove(&b);
//!
//! assert_eq!(**heap.pop(), 3);
//! assert_eq!(**heap.pop(), 5);
//! assert!(heap.is_empty());
//! ```

extern crate compare;
extern crate thiserror;
#[cfg(test)] extern crate rand;

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::iter;
use std::ops::Deref;
use std::ptr;
use std::rc::Rc;
use std::sync::Arc;

use compare::{Compare, Natural, natural};
use thiserror::Error;

// The heap is a complete binary tree stored in a `Vec`. The children of the
// item at offset `i` live at `2 * i + 1` and `2 * i + 2`, its parent at
// `(i - 1) / 2`. "Higher priority" means "compares less" under the heap's
// comparator, so the front item is the least one.
//
// Besides the heap property, every item's index slot holds its offset in the
// `Vec`. Both properties hold between any two calls into the heap.

fn parent(x: usize) -> usize {
    debug_assert!(x > 0);
    (x - 1) / 2
}

/// An item that stores its own position inside an `IndexedHeap`.
///
/// The setter takes `&self` because the heap only ever holds shared handles to its items, so
/// implementors usually keep the index in a `Cell<usize>`. The index must not be written by
/// anything but the heap while the item is a member.
pub trait HeapIndex {
    /// Returns the position last written by the heap.
    fn heap_index(&self) -> usize;

    /// Records the item's new position.
    fn set_heap_index(&self, index: usize);
}

impl<'a, T: HeapIndex + ?Sized> HeapIndex for &'a T {
    #[inline] fn heap_index(&self) -> usize { (**self).heap_index() }
    #[inline] fn set_heap_index(&self, index: usize) { (**self).set_heap_index(index) }
}

impl<T: HeapIndex + ?Sized> HeapIndex for Rc<T> {
    #[inline] fn heap_index(&self) -> usize { (**self).heap_index() }
    #[inline] fn set_heap_index(&self, index: usize) { (**self).set_heap_index(index) }
}

impl<T: HeapIndex + ?Sized> HeapIndex for Arc<T> {
    #[inline] fn heap_index(&self) -> usize { (**self).heap_index() }
    #[inline] fn set_heap_index(&self, index: usize) { (**self).set_heap_index(index) }
}

/// Tells the heap where an item's index slot is.
///
/// An `IndexedHeap` uses one accessor for all of its items. [`Intrusive`](struct.Intrusive.html)
/// forwards to `HeapIndex`; a pair of closures `(get, set)` can point the heap at any field
/// without implementing a trait.
pub trait IndexAccess<T: ?Sized> {
    /// Reads the index slot of `item`.
    fn get(&self, item: &T) -> usize;

    /// Writes the index slot of `item`.
    fn set(&self, item: &T, index: usize);
}

/// The default accessor, for items implementing `HeapIndex`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intrusive;

impl<T: HeapIndex + ?Sized> IndexAccess<T> for Intrusive {
    #[inline] fn get(&self, item: &T) -> usize { item.heap_index() }
    #[inline] fn set(&self, item: &T, index: usize) { item.set_heap_index(index) }
}

impl<T: ?Sized, G, S> IndexAccess<T> for (G, S)
    where G: Fn(&T) -> usize, S: Fn(&T, usize)
{
    #[inline] fn get(&self, item: &T) -> usize { (self.0)(item) }
    #[inline] fn set(&self, item: &T, index: usize) { (self.1)(item, index) }
}

/// A value paired with an index slot, for payloads that have no slot of their own.
///
/// `Indexed<V>` compares and equates by its value alone, and dereferences to it. Share it
/// through `Rc` or a plain reference so the caller keeps a handle for later removal.
pub struct Indexed<V> {
    index: Cell<usize>,
    value: V,
}

impl<V> Indexed<V> {
    /// Wraps `value`. The slot starts out holding no valid position.
    pub fn new(value: V) -> Indexed<V> {
        Indexed { index: Cell::new(usize::MAX), value: value }
    }

    /// Unwraps the value.
    pub fn into_inner(self) -> V { self.value }
}

impl<V> HeapIndex for Indexed<V> {
    #[inline] fn heap_index(&self) -> usize { self.index.get() }
    #[inline] fn set_heap_index(&self, index: usize) { self.index.set(index) }
}

impl<V> Deref for Indexed<V> {
    type Target = V;
    fn deref(&self) -> &V { &self.value }
}

impl<V: PartialEq> PartialEq for Indexed<V> {
    fn eq(&self, other: &Indexed<V>) -> bool { self.value == other.value }
}

impl<V: Eq> Eq for Indexed<V> {}

impl<V: PartialOrd> PartialOrd for Indexed<V> {
    fn partial_cmp(&self, other: &Indexed<V>) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<V: Ord> Ord for Indexed<V> {
    fn cmp(&self, other: &Indexed<V>) -> Ordering { self.value.cmp(&other.value) }
}

impl<V: Debug> Debug for Indexed<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Indexed")
         .field("index", &self.index.get())
         .field("value", &self.value)
         .finish()
    }
}

/// The reason a checked removal was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RemoveError {
    /// The item's index slot points past the last entry.
    #[error("index slot {index} is out of bounds for a heap of {len} items")]
    OutOfBounds { index: usize, len: usize },
    /// The entry at the item's index slot is a different item.
    #[error("the entry at index {index} is a different item")]
    NotMember { index: usize },
}

/// A priority queue implemented with a binary heap whose items record their own position.
///
/// The item that compares least under the heap's comparator is at the front, so the default
/// `Natural` order makes a min-heap; reverse the comparator for a max-heap. Items of equal
/// priority come out in no particular order.
///
/// It is a logic error for an item to be modified in such a way that the item's ordering
/// relative to any other item, as determined by the heap's comparator, changes while it is in
/// the heap, unless `update` is called for it right afterwards. It is likewise a logic error to
/// write an item's index slot while it is in the heap.
pub struct IndexedHeap<T, C: Compare<T> = Natural<T>, A: IndexAccess<T> = Intrusive> {
    data: Vec<T>,
    cmp: C,
    access: A,
}

impl<T, C, A> Default for IndexedHeap<T, C, A>
    where C: Compare<T> + Default, A: IndexAccess<T> + Default
{
    #[inline]
    fn default() -> IndexedHeap<T, C, A> {
        Self::with_comparator_and_accessor(C::default(), A::default())
    }
}

impl<T: Ord + HeapIndex> IndexedHeap<T> {
    /// Returns an empty heap ordered according to the natural order of its items.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use indexed_heap::{Indexed, IndexedHeap};
    ///
    /// let heap = IndexedHeap::<Rc<Indexed<u32>>>::new();
    /// assert!(heap.is_empty());
    /// assert_eq!(heap.capacity(), 0);
    /// ```
    pub fn new() -> IndexedHeap<T> { Self::with_comparator(natural()) }

    /// Returns an empty heap with the given capacity and ordered according to the
    /// natural order of its items.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use indexed_heap::{Indexed, IndexedHeap};
    ///
    /// let heap = IndexedHeap::<Rc<Indexed<u32>>>::with_capacity(5);
    /// assert!(heap.is_empty());
    /// assert!(heap.capacity() >= 5);
    /// ```
    pub fn with_capacity(capacity: usize) -> IndexedHeap<T> {
        Self::with_capacity_and_comparator(capacity, natural())
    }
}

impl<T: HeapIndex, C: Compare<T>> IndexedHeap<T, C> {
    /// Returns an empty heap ordered according to the given comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use indexed_heap::{Indexed, IndexedHeap};
    ///
    /// type Handle = Rc<Indexed<u32>>;
    ///
    /// // Greatest first.
    /// let mut heap = IndexedHeap::with_comparator(|a: &Handle, b: &Handle| b.cmp(a));
    /// heap.push(Rc::new(Indexed::new(2)));
    /// heap.push(Rc::new(Indexed::new(7)));
    /// assert_eq!(***heap.front(), 7);
    /// ```
    pub fn with_comparator(cmp: C) -> IndexedHeap<T, C> {
        Self::with_comparator_and_accessor(cmp, Intrusive)
    }

    /// Returns an empty heap with the given capacity and ordered according to the given
    /// comparator.
    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> IndexedHeap<T, C> {
        Self::with_capacity_comparator_and_accessor(capacity, cmp, Intrusive)
    }
}

impl<T, C: Compare<T>, A: IndexAccess<T>> IndexedHeap<T, C, A> {
    /// Returns an empty heap ordered according to the given comparator, keeping positions in
    /// the index slots reached through `access`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::cell::Cell;
    /// use indexed_heap::IndexedHeap;
    ///
    /// struct Timer {
    ///     deadline: u64,
    ///     slot: Cell<usize>,
    /// }
    ///
    /// let timers: Vec<Timer> = [30, 10, 20].iter()
    ///     .map(|&deadline| Timer { deadline: deadline, slot: Cell::new(0) })
    ///     .collect();
    ///
    /// let mut heap: IndexedHeap<&Timer, _, _> = IndexedHeap::with_comparator_and_accessor(
    ///     |a: &&Timer, b: &&Timer| a.deadline.cmp(&b.deadline),
    ///     (|t: &&Timer| t.slot.get(), |t: &&Timer, i: usize| t.slot.set(i)),
    /// );
    /// for timer in &timers {
    ///     heap.push(timer);
    /// }
    ///
    /// heap.remove(&&timers[1]);
    /// assert_eq!(heap.pop().deadline, 20);
    /// assert_eq!(heap.pop().deadline, 30);
    /// ```
    pub fn with_comparator_and_accessor(cmp: C, access: A) -> IndexedHeap<T, C, A> {
        IndexedHeap { data: vec![], cmp: cmp, access: access }
    }

    /// Returns an empty heap with the given capacity, comparator and index accessor.
    pub fn with_capacity_comparator_and_accessor(capacity: usize, cmp: C, access: A)
                                                 -> IndexedHeap<T, C, A> {
        IndexedHeap { data: Vec::with_capacity(capacity), cmp: cmp, access: access }
    }

    /// Returns a reference to the front (least) item in the heap.
    ///
    /// # Panics
    ///
    /// Panics if the heap is empty.
    pub fn front(&self) -> &T {
        assert!(!self.data.is_empty(), "front called on an empty heap");
        &self.data[0]
    }

    /// Returns a reference to the front (least) item in the heap.
    ///
    /// Returns `None` if the heap is empty.
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Pushes an item onto the heap, overwriting its index slot.
    pub fn push(&mut self, item: T) {
        debug_assert!(self.is_valid());
        let pos = self.data.len();
        self.data.push(item);
        self.sift_up(pos);
        debug_assert!(self.is_valid());
    }

    /// Removes the front (least) item from the heap and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the heap is empty.
    pub fn pop(&mut self) -> T {
        assert!(!self.data.is_empty(), "pop called on an empty heap");
        self.pop_front()
    }

    /// Removes the front (least) item from the heap and returns it.
    ///
    /// Returns `None` if the heap was empty.
    pub fn try_pop(&mut self) -> Option<T> {
        match self.data.len() {
            0 => None,
            _ => Some(self.pop_front()),
        }
    }

    /// Removes `item` from the heap and returns the heap's handle to it.
    ///
    /// `item` must currently be in this heap. Membership is not verified beyond a debug
    /// assertion; removing a stale or foreign handle removes whatever item sits at the
    /// position its slot names, or panics if that position is out of bounds. Use
    /// `try_remove` when membership is not guaranteed.
    ///
    /// The removed item's index slot is left holding a stale position.
    pub fn remove(&mut self, item: &T) -> T {
        debug_assert!(self.is_valid());
        let pos = self.access.get(item);
        debug_assert!(pos < self.data.len(), "removed item is not in the heap");
        let removed = self.data.swap_remove(pos);
        // The former last item now fills the hole, unless it was the one removed.
        if pos < self.data.len() {
            self.sift_up(pos);
        }
        debug_assert!(self.is_valid());
        removed
    }

    /// Removes `item` from the heap after checking that it is a member.
    ///
    /// Membership means the entry at `item`'s index slot points at the same value as `item`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use indexed_heap::{Indexed, IndexedHeap, RemoveError};
    ///
    /// let mut heap = IndexedHeap::new();
    /// let a = Rc::new(Indexed::new(1));
    /// heap.push(a.clone());
    ///
    /// assert!(heap.try_remove(&a).is_ok());
    /// assert_eq!(heap.try_remove(&a), Err(RemoveError::OutOfBounds { index: 0, len: 0 }));
    /// ```
    pub fn try_remove(&mut self, item: &T) -> Result<T, RemoveError> where T: Deref {
        self.check_member(item)?;
        Ok(self.remove(item))
    }

    /// Returns `true` if `item` is currently in the heap.
    pub fn contains(&self, item: &T) -> bool where T: Deref {
        self.check_member(item).is_ok()
    }

    /// Moves `item` to its correct position after its priority was changed in place.
    ///
    /// `item` must currently be in this heap.
    pub fn update(&mut self, item: &T) {
        let pos = self.access.get(item);
        debug_assert!(pos < self.data.len(), "updated item is not in the heap");
        self.sift_up(pos);
        debug_assert!(self.is_valid());
    }

    /// Returns the number of items the heap can hold without reallocation.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Reserves the minimum capacity for exactly `additional` more items to be inserted into the
    /// heap.
    ///
    /// Does nothing if the capacity is already sufficient.
    pub fn reserve_exact(&mut self, additional: usize) {
        self.data.reserve_exact(additional);
    }

    /// Reserves capacity for at least `additional` more items to be inserted into the heap.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    /// Discards as much additional capacity from the heap as possible.
    pub fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit()
    }

    /// Returns the number of items in the heap.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the heap contains no items.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Removes all items from the heap. Their index slots are left stale.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    fn pop_front(&mut self) -> T {
        debug_assert!(self.is_valid());
        let res = self.data.swap_remove(0);
        if !self.data.is_empty() {
            self.sift_down(0);
        }
        debug_assert!(self.is_valid());
        res
    }

    fn check_member(&self, item: &T) -> Result<usize, RemoveError> where T: Deref {
        let index = self.access.get(item);
        match self.data.get(index) {
            None => Err(RemoveError::OutOfBounds { index: index, len: self.data.len() }),
            Some(entry) if ptr::eq(&**entry, &**item) => Ok(index),
            Some(_) => Err(RemoveError::NotMember { index: index }),
        }
    }

    /// The item at `pos` may be out of place. Moves it towards the root while it is less than
    /// its parent, then towards the leaves.
    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let par = parent(pos);
            if !self.cmp.compares_lt(&self.data[pos], &self.data[par]) { break; }
            self.data.swap(pos, par);
            self.access.set(&self.data[pos], pos);
            pos = par;
        }
        self.sift_down(pos);
    }

    /// The item at `pos` may be greater than its children. Moves it down past every child
    /// that it is not less than, always following the lesser child, and records the final
    /// position of everything it passes.
    fn sift_down(&mut self, mut pos: usize) {
        let len = self.data.len();
        loop {
            let mut child = pos * 2 + 1;
            if child >= len { break; }
            // Pick the lesser child; the left one on ties.
            if child + 1 < len && self.cmp.compares_lt(&self.data[child + 1], &self.data[child]) {
                child += 1;
            }
            if self.cmp.compares_lt(&self.data[pos], &self.data[child]) { break; }
            self.data.swap(pos, child);
            self.access.set(&self.data[pos], pos);
            pos = child;
        }
        self.access.set(&self.data[pos], pos);
    }

    /// Checks if the heap is valid.
    ///
    /// The heap is valid if every item:
    ///
    /// 1. is not less than its parent, AND
    /// 2. has an index slot holding its own position.
    fn is_valid(&self) -> bool {
        self.data.iter().enumerate().all(|(i, item)| {
            self.access.get(item) == i &&
            (i == 0 || !self.cmp.compares_lt(item, &self.data[parent(i)]))
        })
    }
}

impl<T: Debug, C: Compare<T>, A: IndexAccess<T>> Debug for IndexedHeap<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl<T, C, A> iter::FromIterator<T> for IndexedHeap<T, C, A>
    where C: Compare<T> + Default, A: IndexAccess<T> + Default
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> IndexedHeap<T, C, A> {
        let mut heap = IndexedHeap::default();
        heap.extend(iter);
        heap
    }
}

impl<T, C: Compare<T>, A: IndexAccess<T>> Extend<T> for IndexedHeap<T, C, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for elem in iter {
            self.push(elem);
        }
    }
}
