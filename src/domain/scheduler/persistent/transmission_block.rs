use std::fmt;

/// A contiguous run of resource blocks inside one frame, `[start, start + length)`.
///
/// Ordered by start position first, which is the order `Frame::find_transmission_blocks` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransmissionBlock {
    pub start: usize,
    pub length: usize,
}

impl TransmissionBlock {
    pub fn new(start: usize, length: usize) -> Self {
        TransmissionBlock { start, length }
    }

    /// First index after the block.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Last index inside the block, `None` for an empty block.
    pub fn last(&self) -> Option<usize> {
        if self.length == 0 { None } else { Some(self.end() - 1) }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end()
    }

    pub fn overlaps(&self, other: &TransmissionBlock) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }
}

impl fmt::Display for TransmissionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last() {
            Some(last) => write!(f, "[{}, {}]", self.start, last),
            None => write!(f, "[{}, -]", self.start),
        }
    }
}
