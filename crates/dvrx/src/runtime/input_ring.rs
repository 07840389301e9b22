// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Single-producer single-consumer ring for interleaved I/Q int16 samples.
//!
//! The source thread owns the head, the demod thread owns the tail.
//! Indices are plain monotonically-wrapping offsets with acquire/release
//! ordering; a `parking_lot` condvar backs the blocking paths.
//!
//! Protocol:
//! - Producer: `write()` (blocking or drop-excess per policy), or
//!   `reserve()`/`commit()` to fill up to two contiguous spans around the
//!   wrap point without staging copies.
//! - Consumer: `read_block()` blocks until at least one sample is
//!   available or shutdown is signalled.
//! - Full: `used == capacity - 1` (one slot kept open to disambiguate).
//! - Drop and wait counters are monotonic and lock-free to read.
//!
//! SAFETY: the producer/consumer split is enforced by handing out exactly
//! one [`RingProducer`] and one [`RingConsumer`]; neither is `Clone`.

use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the producer does when the ring cannot take a whole write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Block until the consumer frees enough space.
    #[default]
    Block,
    /// Write what fits, silently discard the excess, bump the drop counter.
    DropExcess,
}

/// Outcome of a blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` samples were copied out (`n >= 1`).
    Samples(usize),
    /// Shutdown was signalled; no further samples will arrive.
    Shutdown,
}

struct Shared {
    buf: UnsafeCell<Box<[i16]>>,
    capacity: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    shutdown: AtomicBool,
    policy: OverflowPolicy,
    /// Samples dropped by the producer in drop-excess mode.
    producer_drops: AtomicU64,
    /// Consumer waits that hit the poll timeout before data arrived.
    read_timeouts: AtomicU64,
    gate: Mutex<()>,
    ready: Condvar,
}

// SAFETY: buf is written only between head..head+n by the single producer
// before the head release-store, and read only between tail..tail+n by the
// single consumer before the tail release-store. The atomics order the
// accesses; the handles enforce the single-producer/single-consumer split.
unsafe impl Send for Shared {}
unsafe impl Sync for Shared {}

impl Shared {
    #[inline]
    fn used(&self) -> usize {
        let h = self.head.load(Ordering::Acquire);
        let t = self.tail.load(Ordering::Acquire);
        if h >= t {
            h - t
        } else {
            self.capacity - t + h
        }
    }

    #[inline]
    fn free(&self) -> usize {
        (self.capacity - 1) - self.used()
    }

    #[inline]
    fn notify(&self) {
        let _guard = self.gate.lock();
        self.ready.notify_all();
    }
}

/// Construct a ring and split it into its two endpoints plus a control
/// handle the engine keeps for shutdown and stats.
pub struct InputRing;

impl InputRing {
    /// Create a ring holding `capacity` int16 samples.
    ///
    /// # Panics
    /// Panics if `capacity < 2` (one slot is reserved to distinguish
    /// full from empty).
    pub fn with_capacity(
        capacity: usize,
        policy: OverflowPolicy,
    ) -> (RingProducer, RingConsumer, RingControl) {
        assert!(capacity >= 2, "ring capacity must be >= 2");
        let shared = Arc::new(Shared {
            buf: UnsafeCell::new(vec![0i16; capacity].into_boxed_slice()),
            capacity,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            policy,
            producer_drops: AtomicU64::new(0),
            read_timeouts: AtomicU64::new(0),
            gate: Mutex::new(()),
            ready: Condvar::new(),
        });
        (
            RingProducer {
                shared: Arc::clone(&shared),
            },
            RingConsumer {
                shared: Arc::clone(&shared),
            },
            RingControl { shared },
        )
    }
}

/// Engine-side handle: shutdown signalling and counters.
#[derive(Clone)]
pub struct RingControl {
    shared: Arc<Shared>,
}

impl RingControl {
    /// Signal shutdown and wake every blocked endpoint.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.notify();
    }

    /// Samples currently buffered.
    pub fn used(&self) -> usize {
        self.shared.used()
    }

    /// Total samples discarded by the producer (drop-excess mode).
    pub fn producer_drops(&self) -> u64 {
        self.shared.producer_drops.load(Ordering::Relaxed)
    }

    /// Total consumer waits that timed out before data arrived.
    pub fn read_timeouts(&self) -> u64 {
        self.shared.read_timeouts.load(Ordering::Relaxed)
    }
}

/// Two writable spans around the wrap point.
///
/// Fill `first` then `second` in order, then commit the produced count.
pub struct Reservation<'a> {
    pub first: &'a mut [i16],
    pub second: &'a mut [i16],
}

impl Reservation<'_> {
    /// Total writable samples granted.
    pub fn granted(&self) -> usize {
        self.first.len() + self.second.len()
    }
}

/// Producer endpoint (source thread).
pub struct RingProducer {
    shared: Arc<Shared>,
}

impl RingProducer {
    /// Reserve up to `max_wanted` contiguous-span samples for writing.
    ///
    /// Returns spans covering all currently free slots (capped at
    /// `max_wanted`); may be empty when the ring is full. Must be followed
    /// by [`commit`](Self::commit) with the count actually produced.
    pub fn reserve(&mut self, max_wanted: usize) -> Reservation<'_> {
        let free = self.shared.free().min(max_wanted);
        let h = self.shared.head.load(Ordering::Relaxed);
        let cap = self.shared.capacity;
        let first_len = free.min(cap - h);
        let second_len = free - first_len;
        // SAFETY: the producer exclusively owns [h, h+free) mod cap;
        // raw spans avoid materializing a reference over the regions
        // the consumer is concurrently reading.
        let base = unsafe { (*self.shared.buf.get()).as_mut_ptr() };
        let (a, b) = unsafe {
            (
                std::slice::from_raw_parts_mut(base.add(h), first_len),
                std::slice::from_raw_parts_mut(base, second_len),
            )
        };
        Reservation { first: a, second: b }
    }

    /// Publish `produced` samples previously written into a reservation.
    pub fn commit(&mut self, produced: usize) {
        if produced == 0 {
            return;
        }
        let h = self.shared.head.load(Ordering::Relaxed);
        let next = (h + produced) % self.shared.capacity;
        self.shared.head.store(next, Ordering::Release);
        self.shared.notify();
    }

    /// Write `data`, blocking or dropping the excess per policy.
    ///
    /// Returns the number of samples actually enqueued.
    pub fn write(&mut self, data: &[i16]) -> usize {
        let mut written = 0;
        while written < data.len() {
            if self.shared.shutdown.load(Ordering::Acquire) {
                return written;
            }
            let remain = &data[written..];
            let res = self.reserve(remain.len());
            let n = res.granted().min(remain.len());
            if n > 0 {
                let (a, b) = remain[..n].split_at(res.first.len().min(n));
                res.first[..a.len()].copy_from_slice(a);
                res.second[..b.len()].copy_from_slice(b);
                self.commit(n);
                written += n;
                continue;
            }
            match self.shared.policy {
                OverflowPolicy::DropExcess => {
                    let dropped = (data.len() - written) as u64;
                    self.shared.producer_drops.fetch_add(dropped, Ordering::Relaxed);
                    return written;
                }
                OverflowPolicy::Block => {
                    let mut guard = self.shared.gate.lock();
                    if self.shared.free() == 0 && !self.shared.shutdown.load(Ordering::Acquire) {
                        let _ = self
                            .shared
                            .ready
                            .wait_for(&mut guard, Duration::from_millis(100));
                    }
                }
            }
        }
        written
    }
}

/// Consumer endpoint (demod thread).
pub struct RingConsumer {
    shared: Arc<Shared>,
}

impl RingConsumer {
    /// Read up to `out.len()` samples, blocking until at least one is
    /// available or shutdown is signalled.
    pub fn read_block(&mut self, out: &mut [i16]) -> ReadOutcome {
        if out.is_empty() {
            return ReadOutcome::Samples(0);
        }
        loop {
            let avail = self.shared.used();
            if avail > 0 {
                let n = avail.min(out.len());
                let t = self.shared.tail.load(Ordering::Relaxed);
                let cap = self.shared.capacity;
                let first = n.min(cap - t);
                // SAFETY: the consumer exclusively owns [t, t+n) mod
                // cap; raw spans keep the producer's regions untouched.
                unsafe {
                    let base = (*self.shared.buf.get()).as_ptr();
                    out[..first]
                        .copy_from_slice(std::slice::from_raw_parts(base.add(t), first));
                    if n > first {
                        out[first..n]
                            .copy_from_slice(std::slice::from_raw_parts(base, n - first));
                    }
                }
                self.shared.tail.store((t + n) % cap, Ordering::Release);
                self.shared.notify();
                return ReadOutcome::Samples(n);
            }
            if self.shared.shutdown.load(Ordering::Acquire) {
                return ReadOutcome::Shutdown;
            }
            let mut guard = self.shared.gate.lock();
            if self.shared.used() == 0 && !self.shared.shutdown.load(Ordering::Acquire) {
                let timed_out = self
                    .shared
                    .ready
                    .wait_for(&mut guard, Duration::from_millis(100))
                    .timed_out();
                if timed_out {
                    self.shared.read_timeouts.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Drop all buffered samples (used on retune).
    pub fn clear(&mut self) {
        let h = self.shared.head.load(Ordering::Acquire);
        self.shared.tail.store(h, Ordering::Release);
        self.shared.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_write_then_read() {
        let (mut prod, mut cons, _ctl) = InputRing::with_capacity(64, OverflowPolicy::Block);
        let data: Vec<i16> = (0..32).collect();
        assert_eq!(prod.write(&data), 32);
        let mut out = [0i16; 64];
        match cons.read_block(&mut out) {
            ReadOutcome::Samples(n) => {
                assert_eq!(n, 32);
                assert_eq!(&out[..32], &data[..]);
            }
            ReadOutcome::Shutdown => panic!("unexpected shutdown"),
        }
    }

    #[test]
    fn test_reserve_commit_wraparound() {
        let (mut prod, mut cons, _ctl) = InputRing::with_capacity(16, OverflowPolicy::Block);
        // Advance head/tail near the end so a reserve spans the wrap point
        let pre: Vec<i16> = (0..12).collect();
        assert_eq!(prod.write(&pre), 12);
        let mut sink = [0i16; 12];
        assert_eq!(cons.read_block(&mut sink), ReadOutcome::Samples(12));

        let res = prod.reserve(8);
        assert_eq!(res.granted(), 8);
        assert!(!res.second.is_empty(), "reserve should wrap");
        for (i, s) in res.first.iter_mut().enumerate() {
            *s = i as i16;
        }
        let off = res.first.len();
        for (i, s) in res.second.iter_mut().enumerate() {
            *s = (off + i) as i16;
        }
        prod.commit(8);

        let mut out = [0i16; 8];
        assert_eq!(cons.read_block(&mut out), ReadOutcome::Samples(8));
        for (i, v) in out.iter().enumerate() {
            assert_eq!(*v, i as i16);
        }
    }

    #[test]
    fn test_drop_excess_counts() {
        let (mut prod, _cons, ctl) = InputRing::with_capacity(8, OverflowPolicy::DropExcess);
        let data = [1i16; 20];
        let written = prod.write(&data);
        assert_eq!(written, 7); // capacity - 1
        assert_eq!(ctl.producer_drops(), 13);
    }

    #[test]
    fn test_shutdown_unblocks_reader() {
        let (_prod, mut cons, ctl) = InputRing::with_capacity(8, OverflowPolicy::Block);
        let handle = thread::spawn(move || {
            let mut out = [0i16; 4];
            cons.read_block(&mut out)
        });
        thread::sleep(Duration::from_millis(20));
        ctl.shutdown();
        assert_eq!(handle.join().unwrap(), ReadOutcome::Shutdown);
    }

    #[test]
    fn test_spsc_order_preserved_across_threads() {
        let (mut prod, mut cons, ctl) = InputRing::with_capacity(128, OverflowPolicy::Block);
        let total = 10_000i32;
        let producer = thread::spawn(move || {
            let mut v = 0i32;
            while v < total {
                let chunk: Vec<i16> = (v..(v + 50).min(total)).map(|x| (x & 0x7FFF) as i16).collect();
                prod.write(&chunk);
                v += chunk.len() as i32;
            }
        });
        let mut expect = 0i32;
        let mut out = [0i16; 64];
        while expect < total {
            match cons.read_block(&mut out) {
                ReadOutcome::Samples(n) => {
                    for v in &out[..n] {
                        assert_eq!(*v, (expect & 0x7FFF) as i16);
                        expect += 1;
                    }
                }
                ReadOutcome::Shutdown => break,
            }
        }
        producer.join().unwrap();
        assert_eq!(expect, total);
        ctl.shutdown();
    }
}
