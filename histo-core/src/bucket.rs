use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// A contiguous value range and the number of samples that fell in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket<T> {
    /// Low bound, inclusive.
    pub min: T,
    /// High bound. Exclusive, except on the last bucket of a histogram
    /// where it is inclusive and holds the histogram's largest value.
    pub max: T,
    pub count: usize,
}

impl<T: Sample> Bucket<T> {
    pub(crate) fn new(min: T, max: T) -> Self {
        Self { min, max, count: 0 }
    }

    /// Whether `value` lies in `[min, max)`, or `[min, max]` for the last bucket.
    pub fn within(&self, value: T, is_last: bool) -> bool {
        if is_last {
            self.min <= value && value <= self.max
        } else {
            self.min <= value && value < self.max
        }
    }
}
