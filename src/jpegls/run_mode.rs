use crate::constants::J;

/// Coding state of the current sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelMode {
    /// Context modeling with a Golomb coded prediction error.
    Regular,
    /// Run of samples equal to the left neighbour, followed by an optional
    /// run interruption sample.
    Run,
}

impl PixelMode {
    /// A zero context id means every local gradient is flat.
    pub fn for_context_id(context_id: i32) -> Self {
        if context_id == 0 { Self::Run } else { Self::Regular }
    }
}

/// Index into the run length order table J (ISO/IEC 14495-1, A.7.1.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunIndex(usize);

impl RunIndex {
    /// Number of bits used for the remainder of an interrupted run.
    pub fn j(self) -> i32 {
        J[self.0]
    }

    /// Length of a full run segment, 2^J.
    pub fn run_length(self) -> usize {
        1 << J[self.0]
    }

    pub fn increment(&mut self) {
        if self.0 < J.len() - 1 {
            self.0 += 1;
        }
    }

    pub fn decrement(&mut self) {
        if self.0 > 0 {
            self.0 -= 1;
        }
    }

    pub fn value(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_index_saturates_at_both_ends() {
        let mut index = RunIndex::default();
        index.decrement();
        assert_eq!(index.value(), 0);
        for _ in 0..40 {
            index.increment();
        }
        assert_eq!(index.value(), 31);
        assert_eq!(index.j(), 15);
        assert_eq!(index.run_length(), 32768);
    }

    #[test]
    fn run_lengths_grow_with_index() {
        let mut index = RunIndex::default();
        let mut lengths = Vec::new();
        for _ in 0..9 {
            lengths.push(index.run_length());
            index.increment();
        }
        assert_eq!(lengths, vec![1, 1, 1, 1, 2, 2, 2, 2, 4]);
    }

    #[test]
    fn flat_context_selects_run_mode() {
        assert_eq!(PixelMode::for_context_id(0), PixelMode::Run);
        assert_eq!(PixelMode::for_context_id(-5), PixelMode::Regular);
    }
}
