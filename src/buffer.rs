//! Fixed-capacity circular byte buffer
//!
//! One of these sits on each side of the mini UART's interrupt handlers: an
//! inbound buffer filled from the receive interrupt and drained by callers,
//! and an outbound buffer filled by callers and drained by the transmit
//! interrupt.
//!
//! Each cursor has exactly one writer: the producer advances `write`, the
//! consumer advances `read`. That is what makes the buffer safe to share
//! between caller context and interrupt context once mutation is bracketed by
//! a critical section; no occupancy counter exists to be torn.

/// A circular byte buffer with independent read and write cursors.
///
/// `read == write` means empty, `(write + 1) % N == read` means full: one
/// slot is sacrificed so the two conditions are distinguishable without a
/// separate length field. Usable capacity is therefore `N - 1`, and `N`
/// must be at least 1 (a zero-size buffer has no empty/full distinction to
/// make; [`new`](Self::new) rejects it).
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    /// Index of the next occupied slot to read.
    read: usize,
    /// Index of the next free slot to write.
    write: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Creates an empty buffer with zeroed storage.
    ///
    /// # Panics
    ///
    /// Panics if `N` is 0; the cursor arithmetic needs at least one slot.
    /// In const context this is a compile-time error.
    pub const fn new() -> Self {
        assert!(N >= 1, "RingBuffer needs at least one slot");
        Self {
            buf: [0; N],
            read: 0,
            write: 0,
        }
    }

    /// Returns `true` if no unread bytes are stored.
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Returns `true` if one more `push` would be rejected.
    pub fn is_full(&self) -> bool {
        (self.write + 1) % N == self.read
    }

    /// Number of unread bytes currently stored.
    pub fn len(&self) -> usize {
        (self.write + N - self.read) % N
    }

    /// Maximum number of bytes that can be outstanding at once, `N - 1`.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Appends a byte at the write cursor.
    ///
    /// When the buffer is full the byte is handed back and neither cursor
    /// moves; the full condition is binding, unread data is never
    /// overwritten.
    pub fn push(&mut self, byte: u8) -> Result<(), u8> {
        if self.is_full() {
            return Err(byte);
        }
        self.buf[self.write] = byte;
        self.write = (self.write + 1) % N;
        Ok(())
    }

    /// Consumes the byte at the read cursor, oldest first.
    ///
    /// Returns `None` when the buffer is empty; the read cursor does not
    /// move in that case.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.read];
        self.read = (self.read + 1) % N;
        Some(byte)
    }

    /// Returns the byte at the read cursor without consuming it.
    pub fn peek(&self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            Some(self.buf[self.read])
        }
    }

    /// Drops all unread bytes by catching the read cursor up to the write
    /// cursor.
    pub fn clear(&mut self) {
        self.read = self.write;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
