//! Fixed-capacity lock-free event queue from the audio task to the control task.
//!
//! Lamport ring buffer with one slot reserved to tell full from empty, so the
//! usable capacity is `N - 1`. The audio side never waits: pushing into a full
//! queue hands the event back and it is dropped.
//!
//! # Safety Contract
//!
//! [`EventQueue::split`] hands out exactly one [`EventSender`] (the only writer
//! of `head`) and one [`EventReceiver`] (the only writer of `tail`).

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Single-producer single-consumer queue of `Copy` events.
pub struct EventQueue<T, const N: usize> {
    buffer: [UnsafeCell<MaybeUninit<T>>; N],
    head: AtomicUsize,
    tail: AtomicUsize,
    claimed: AtomicBool,
}

// SAFETY: T: Send because events cross from the audio context to the control
// context. `head` and `tail` each have a single writer and the Release/Acquire
// pairs order slot writes before they become visible to the other side.
unsafe impl<T: Send, const N: usize> Sync for EventQueue<T, N> {}

impl<T: Copy, const N: usize> EventQueue<T, N> {
    /// Compile-time assertion: `N` must be at least 2 (usable capacity is `N - 1`).
    pub const fn new() -> Self {
        assert!(N >= 2, "event queue needs at least 2 slots (1 usable)");
        EventQueue {
            // SAFETY: an array of uninitialized MaybeUninit<T> is always valid.
            buffer: unsafe { MaybeUninit::<[UnsafeCell<MaybeUninit<T>>; N]>::uninit().assume_init() },
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            claimed: AtomicBool::new(false),
        }
    }

    /// Take the sender and receiver handles. Succeeds once.
    pub fn split(&self) -> Option<(EventSender<'_, T, N>, EventReceiver<'_, T, N>)> {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some((EventSender { queue: self }, EventReceiver { queue: self }))
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N - 1
    }
}

impl<T: Copy, const N: usize> Default for EventQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle, used by the audio task.
pub struct EventSender<'a, T, const N: usize> {
    queue: &'a EventQueue<T, N>,
}

impl<'a, T: Copy, const N: usize> EventSender<'a, T, N> {
    /// Push an event. Returns `Err(event)` when the queue is full.
    pub fn push(&mut self, event: T) -> Result<(), T> {
        let q = self.queue;
        let head = q.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == q.tail.load(Ordering::Acquire) {
            return Err(event);
        }
        // SAFETY: sole producer; `next != tail` means the consumer is not
        // reading this slot.
        unsafe {
            (*q.buffer[head].get()).write(event);
        }
        q.head.store(next, Ordering::Release);
        Ok(())
    }
}

// SAFETY: the sender only writes slots it owns by the head/tail protocol.
unsafe impl<'a, T: Send, const N: usize> Send for EventSender<'a, T, N> {}

/// Consumer handle, used by the control task.
pub struct EventReceiver<'a, T, const N: usize> {
    queue: &'a EventQueue<T, N>,
}

impl<'a, T: Copy, const N: usize> EventReceiver<'a, T, N> {
    /// Pop the oldest event, if any.
    pub fn pop(&mut self) -> Option<T> {
        let q = self.queue;
        let tail = q.tail.load(Ordering::Relaxed);
        if tail == q.head.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: sole consumer; `tail != head` means this slot was written.
        let event = unsafe { (*q.buffer[tail].get()).assume_init_read() };
        q.tail.store((tail + 1) % N, Ordering::Release);
        Some(event)
    }
}

impl<'a, T: Copy, const N: usize> Iterator for EventReceiver<'a, T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.pop()
    }
}

// SAFETY: the receiver only reads slots it owns by the head/tail protocol.
unsafe impl<'a, T: Send, const N: usize> Send for EventReceiver<'a, T, N> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_in_order() {
        let q: EventQueue<i32, 4> = EventQueue::new();
        let (mut tx, mut rx) = q.split().unwrap();
        assert!(q.is_empty());
        assert_eq!(q.capacity(), 3);

        tx.push(10).unwrap();
        tx.push(20).unwrap();
        tx.push(30).unwrap();
        assert_eq!(q.len(), 3);

        // full: the event comes back
        assert_eq!(tx.push(40), Err(40));

        assert_eq!(rx.pop(), Some(10));
        assert_eq!(rx.pop(), Some(20));
        assert_eq!(rx.pop(), Some(30));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn split_only_once() {
        let q: EventQueue<u8, 2> = EventQueue::new();
        assert!(q.split().is_some());
        assert!(q.split().is_none());
    }

    #[test]
    fn wraparound() {
        let q: EventQueue<i32, 3> = EventQueue::new();
        let (mut tx, mut rx) = q.split().unwrap();
        for round in 0..10 {
            let base = round * 100;
            tx.push(base + 1).unwrap();
            tx.push(base + 2).unwrap();
            assert!(tx.push(base + 3).is_err());
            assert_eq!(rx.pop(), Some(base + 1));
            assert_eq!(rx.pop(), Some(base + 2));
            assert!(q.is_empty());
        }
    }

    #[test]
    fn receiver_drains_as_iterator() {
        let q: EventQueue<u8, 8> = EventQueue::new();
        let (mut tx, rx) = q.split().unwrap();
        for e in 1..=5 {
            tx.push(e).unwrap();
        }
        let mut drained = [0u8; 5];
        for (slot, e) in drained.iter_mut().zip(rx) {
            *slot = e;
        }
        assert_eq!(drained, [1, 2, 3, 4, 5]);
        assert!(q.is_empty());
    }
}
