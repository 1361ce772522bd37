//! Incremental framing of the inbound CAT byte stream
//!
//! The serial link delivers bytes with no message alignment. [`LineFramer`]
//! accumulates them into discrete command strings, splitting on `;`, CR or
//! LF. The line buffer is bounded: when it fills up the current command is
//! closed as-is, so a pathological unterminated stream degrades into
//! truncated commands instead of unbounded growth.

/// Default line-buffer capacity, comfortably above any real CAT frame
pub const DEFAULT_FRAME_CAPACITY: usize = 64;

/// Splits an unaligned byte stream into terminator-stripped command strings
#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    capacity: usize,
}

impl LineFramer {
    /// Create a framer with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FRAME_CAPACITY)
    }

    /// Create a framer with an explicit line-buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Feed raw bytes, returning every command completed by this chunk
    ///
    /// Terminators are stripped. Empty commands (consecutive terminators,
    /// stray CR-LF pairs) are dropped. This never fails: overlong input is
    /// closed at capacity and the remainder starts a new command.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        let mut complete = Vec::new();

        for &byte in data {
            match byte {
                b';' | b'\r' | b'\n' => self.close_into(&mut complete),
                _ => {
                    if self.buf.len() >= self.capacity {
                        self.close_into(&mut complete);
                    }
                    self.buf.push(byte);
                }
            }
        }

        complete
    }

    /// Number of bytes currently buffered for the next command
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Discard any partially accumulated command
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn close_into(&mut self, complete: &mut Vec<String>) {
        if self.buf.is_empty() {
            return;
        }
        let cmd = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        complete.push(cmd);
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
