//! Confirmation buffer.
//!
//! Holds the last K decoded codes. A code is confirmed once all K slots hold
//! the same value, which filters out single-frame misreads.

use std::collections::VecDeque;

/// Bounded buffer of recent reads.
#[derive(Debug, Clone)]
pub struct ConfirmationBuffer {
    reads: VecDeque<String>,
    required: usize,
}

impl ConfirmationBuffer {
    /// Creates a buffer requiring `required` identical reads.
    ///
    /// A value of 0 is treated as 1.
    #[must_use]
    pub fn new(required: usize) -> Self {
        let required = required.max(1);
        Self {
            reads: VecDeque::with_capacity(required),
            required,
        }
    }

    /// Pushes a read, dropping the oldest one when full.
    ///
    /// Returns the confirmed code when the buffer is full and every read in
    /// it is identical.
    pub fn push(&mut self, code: &str) -> Option<&str> {
        if self.reads.len() == self.required {
            self.reads.pop_front();
        }
        self.reads.push_back(code.to_string());

        if self.reads.len() < self.required {
            return None;
        }

        let first = self.reads.front()?;
        self.reads
            .iter()
            .all(|read| read == first)
            .then_some(first.as_str())
    }

    /// Empties the buffer.
    pub fn clear(&mut self) {
        self.reads.clear();
    }

    /// Returns the number of buffered reads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Returns true if no reads are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Returns the required number of identical reads.
    #[must_use]
    pub const fn required(&self) -> usize {
        self.required
    }
}
