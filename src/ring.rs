use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};
use core::{cmp, ptr};

const EMPTY_CELL: UnsafeCell<u8> = UnsafeCell::new(0);

/// Fixed-capacity circular byte buffer shared between one interrupt-side producer and one
/// client-side consumer.
///
/// `head` points at the next byte to read and `tail` at the next free slot. Both cursors run over
/// `0..2 * N` and index the storage modulo `N`, so a buffer holding `N` unread bytes is not
/// mistaken for an empty one.
///
/// invariants: `head == tail` iff empty, `(tail - head) mod 2N <= N`
///
/// Only the producer writes `tail` and the free region of the storage. Only the consumer writes
/// `head` and reads the filled region. Cursor stores use release ordering and the opposite side
/// loads them with acquire ordering, so bytes are visible before the cursor that publishes them.
pub struct RingBuffer<const N: usize> {
    head: AtomicUsize,
    tail: AtomicUsize,
    overrun: AtomicUsize,
    storage: [UnsafeCell<u8>; N],
}

// SAFETY: the storage is only touched through the single producer and the single consumer, which
// never access the same bytes at the same time (see the cursor discipline above). Outside the crate
// both halves are only reachable through the one `Endpoint` a `Link` hands out.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    const CAPACITY_IN_RANGE: () =
        assert!(N > 0 && N <= usize::MAX / 4, "ring capacity out of range");

    /// Creates an empty buffer. Usable in a `static`.
    ///
    /// A zero capacity is rejected when the crate using it is compiled:
    ///
    /// ```compile_fail
    /// let link = usbd_serial_transport::Link::<0>::new();
    /// ```
    pub const fn new() -> Self {
        let () = Self::CAPACITY_IN_RANGE;

        Self {
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overrun: AtomicUsize::new(0),
            storage: [EMPTY_CELL; N],
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        used(head, tail, N)
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Total number of inbound bytes dropped because the buffer was full.
    pub fn overrun_bytes(&self) -> usize {
        self.overrun.load(Ordering::Relaxed)
    }

    /// Returns the producer half. The caller must make sure only one context delivers at a time.
    pub(crate) fn producer(&self) -> Producer<'_> {
        Producer {
            head: &self.head,
            tail: &self.tail,
            overrun: &self.overrun,
            storage: &self.storage,
        }
    }

    // Copies as many unread bytes as fit into `buf` and returns the count. Consumer side only.
    pub(crate) fn read_into(&self, buf: &mut [u8]) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        let count = cmp::min(buf.len(), used(head, tail, N));
        if count == 0 {
            return 0;
        }

        let start = head % N;
        let first = cmp::min(count, N - start);
        let base = self.storage.as_ptr() as *const u8;

        // SAFETY: `count` bytes starting at `start` (wrapping) were published by the producer's
        // release store of `tail`, and the producer does not touch them until `head` moves past.
        unsafe {
            ptr::copy_nonoverlapping(base.add(start), buf.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(base, buf.as_mut_ptr().add(first), count - first);
        }

        self.head.store(advance(head, count, N), Ordering::Release);
        count
    }

    // Drops all unread bytes. Consumer side only; the producer may keep delivering.
    pub(crate) fn discard(&self) {
        let tail = self.tail.load(Ordering::Acquire);
        self.head.store(tail, Ordering::Release);
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half of a [`RingBuffer`], driven from the driver's receive interrupt.
pub(crate) struct Producer<'a> {
    head: &'a AtomicUsize,
    tail: &'a AtomicUsize,
    overrun: &'a AtomicUsize,
    storage: &'a [UnsafeCell<u8>],
}

// SAFETY: a producer only writes the free region of the storage and the `tail`/`overrun` cursors,
// none of which the consumer writes. Moving it to the interrupt context is the intended use.
unsafe impl Send for Producer<'_> {}

impl Producer<'_> {
    /// Appends `chunk` to the buffer without blocking and returns the number of bytes accepted.
    ///
    /// A chunk that crosses the end of the storage is split: the first part fills the storage up
    /// to its end and the rest continues at index 0. When the chunk does not fit in the free space
    /// the newest bytes are dropped and counted as overrun; unread bytes are never overwritten.
    pub fn deliver(&self, chunk: &[u8]) -> usize {
        let cap = self.storage.len();
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        let free = cap - used(head, tail, cap);
        let count = cmp::min(chunk.len(), free);
        let dropped = chunk.len() - count;

        if dropped > 0 {
            // single writer, so no read-modify-write is needed
            let total = self.overrun.load(Ordering::Relaxed);
            self.overrun.store(total.wrapping_add(dropped), Ordering::Relaxed);
        }

        if count == 0 {
            return 0;
        }

        let start = tail % cap;
        let first = cmp::min(count, cap - start);
        let base = self.storage.as_ptr() as *mut u8;

        // SAFETY: the `count` slots after `tail` are free, so the consumer is not reading them.
        // `UnsafeCell<u8>` has the same layout as `u8`.
        unsafe {
            ptr::copy_nonoverlapping(chunk.as_ptr(), base.add(start), first);
            ptr::copy_nonoverlapping(chunk.as_ptr().add(first), base, count - first);
        }

        self.tail.store(advance(tail, count, cap), Ordering::Release);
        count
    }
}

fn used(head: usize, tail: usize, cap: usize) -> usize {
    (tail + 2 * cap - head) % (2 * cap)
}

fn advance(cursor: usize, count: usize, cap: usize) -> usize {
    (cursor + count) % (2 * cap)
}
