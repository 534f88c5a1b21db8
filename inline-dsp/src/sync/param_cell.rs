//! Lock-free triple buffer for whole-record parameter handoff.
//!
//! The control task publishes a complete `T`; the audio task reads the most
//! recently published complete `T`. Neither side ever blocks or observes a
//! partially written record.
//!
//! # Safety Contract
//!
//! [`ParamCell::split`] hands out exactly one [`Publisher`] and one
//! [`Subscriber`]. The three slot indices held by the publisher (`back`),
//! the cell (`middle`) and the subscriber (`front`) always form a permutation
//! of `0..3`, so each slot is touched by at most one side at a time.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Set in `middle` when it holds a record the subscriber has not taken yet.
const FRESH: u8 = 0b100;
const INDEX_MASK: u8 = 0b011;

/// Triple-buffered cell holding a `Copy` record.
pub struct ParamCell<T> {
    slots: [UnsafeCell<T>; 3],
    middle: AtomicU8,
    claimed: AtomicBool,
}

// SAFETY: T: Send because records cross from the control context to the audio
// context. Slot access is partitioned by the index permutation described in
// the module docs, and the AcqRel swaps on `middle` order each slot write
// before the read that follows the handoff.
unsafe impl<T: Send> Sync for ParamCell<T> {}

impl<T: Copy> ParamCell<T> {
    /// Create a cell whose three slots all hold `initial`.
    pub const fn new(initial: T) -> Self {
        ParamCell {
            slots: [UnsafeCell::new(initial), UnsafeCell::new(initial), UnsafeCell::new(initial)],
            middle: AtomicU8::new(1),
            claimed: AtomicBool::new(false),
        }
    }

    /// Take the publisher and subscriber handles. Succeeds once.
    pub fn split(&self) -> Option<(Publisher<'_, T>, Subscriber<'_, T>)> {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some((Publisher { cell: self, back: 0 }, Subscriber { cell: self, front: 2 }))
    }
}

/// Control-side handle: publishes whole records.
pub struct Publisher<'a, T> {
    cell: &'a ParamCell<T>,
    back: u8,
}

impl<'a, T: Copy> Publisher<'a, T> {
    /// Make `value` the record the subscriber sees on its next read.
    pub fn publish(&mut self, value: T) {
        // SAFETY: `back` is owned exclusively by this publisher.
        unsafe {
            *self.cell.slots[self.back as usize].get() = value;
        }
        let prev = self.cell.middle.swap(self.back | FRESH, Ordering::AcqRel);
        self.back = prev & INDEX_MASK;
    }
}

// SAFETY: the handle only touches its own `back` slot and the atomic `middle`.
unsafe impl<'a, T: Send> Send for Publisher<'a, T> {}

/// Audio-side handle: reads the latest complete record.
pub struct Subscriber<'a, T> {
    cell: &'a ParamCell<T>,
    front: u8,
}

impl<'a, T: Copy> Subscriber<'a, T> {
    /// Whether a record newer than the last [`read`](Self::read) is waiting.
    pub fn has_update(&self) -> bool {
        self.cell.middle.load(Ordering::Acquire) & FRESH != 0
    }

    /// Return the most recently published record.
    pub fn read(&mut self) -> &T {
        if self.has_update() {
            let prev = self.cell.middle.swap(self.front, Ordering::AcqRel);
            self.front = prev & INDEX_MASK;
        }
        // SAFETY: `front` is owned exclusively by this subscriber, and the
        // swap above acquired the publisher's write to it.
        unsafe { &*self.cell.slots[self.front as usize].get() }
    }
}

// SAFETY: the handle only touches its own `front` slot and the atomic `middle`.
unsafe impl<'a, T: Send> Send for Subscriber<'a, T> {}
