use std::cmp::Ordering;

use histo_common::{HistoError, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::bucket::Bucket;
use crate::sample::Sample;

/// Upper bound on buckets a single histogram may hold. Larger requests
/// produce an empty histogram.
pub const MAX_BUCKETS: usize = 1 << 20;

/// Sample counts partitioned over ascending, non-overlapping buckets.
///
/// Built once by [`Histogram::create`], [`Histogram::create_ranged`] or
/// [`Histogram::create_log`] and never mutated afterwards. Invalid
/// parameters (no samples, zero bins, zero interval, unusable log base)
/// produce an empty histogram rather than an error; check
/// [`Histogram::is_empty`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram<T> {
    buckets: Vec<Bucket<T>>,
    count: usize,
    min_bucket_count: usize,
    max_bucket_count: usize,
}

impl<T> Default for Histogram<T> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            count: 0,
            min_bucket_count: 0,
            max_bucket_count: 0,
        }
    }
}

impl<T: Sample> Histogram<T> {
    /// Partitions the full sample range into `bins` equally sized buckets.
    ///
    /// Bucket offsets from the smallest sample are floored for integer
    /// types. When every sample is equal a single `[v, v]` bucket is built
    /// regardless of `bins`.
    pub fn create(bins: usize, samples: impl IntoIterator<Item = T>) -> Self {
        let values = sorted(samples);
        if values.is_empty() || bins == 0 {
            warn!(samples = values.len(), bins, "no buckets: empty samples or zero bins");
            return Self::default();
        }
        let (lo, hi) = (values[0], values[values.len() - 1]);
        let bins = if lo == hi { 1 } else { bins };
        if bins > MAX_BUCKETS {
            warn!(bins, max = MAX_BUCKETS, "no buckets: too many bins");
            return Self::default();
        }

        let lo_f = lo.as_f64();
        let scale = (hi.as_f64() - lo_f) / bins as f64;
        let offset = |i: usize| {
            let o = i as f64 * scale;
            if T::INTEGRAL {
                o.floor()
            } else {
                o
            }
        };
        // 64/128-bit integers do not survive the trip through f64, so the
        // outer bounds are the samples themselves and every inner bound is
        // kept between them
        let bound = |i: usize| match i {
            0 => lo,
            i if i == bins => hi,
            i => clamp(T::from_f64(lo_f + offset(i)), lo, hi),
        };
        let buckets: Vec<Bucket<T>> = (0..bins).map(|i| Bucket::new(bound(i), bound(i + 1))).collect();
        debug!(bins, %lo, %hi, scale, "linear buckets");
        Self::from_buckets(buckets, &values)
    }

    /// Partitions `[range_min, range_max]` into buckets `interval` wide.
    ///
    /// `floor((range_max - range_min) / interval)` buckets are built, at
    /// least one, the last clamped to `range_max`. When the interval does
    /// not divide the range, the leftover above the last full interval is
    /// not covered. Samples outside the buckets are not counted.
    pub fn create_ranged(
        range_min: T,
        range_max: T,
        interval: T,
        samples: impl IntoIterator<Item = T>,
    ) -> Self {
        let values = sorted(samples);
        let valid_range = range_min <= range_max;
        if values.is_empty() || !(interval > T::zero()) || !valid_range {
            warn!(
                samples = values.len(),
                %range_min, %range_max, %interval,
                "no buckets: empty samples, non-positive interval or inverted range"
            );
            return Self::default();
        }

        let (lo, hi, step) = (range_min.as_f64(), range_max.as_f64(), interval.as_f64());
        let span = ((hi - lo) / step).floor();
        if !(span <= MAX_BUCKETS as f64) {
            warn!(%range_min, %range_max, %interval, max = MAX_BUCKETS, "no buckets: interval too small for range");
            return Self::default();
        }
        // an interval wider than the range still yields one bucket
        let bins = if range_min == range_max { 1 } else { (span as usize).max(1) };

        let bound = |i: usize| match i {
            0 => range_min,
            i => {
                let edge = lo + step * i as f64;
                if edge >= hi {
                    range_max
                } else {
                    clamp(T::from_f64(edge), range_min, range_max)
                }
            }
        };
        let buckets = (0..bins).map(|i| Bucket::new(bound(i), bound(i + 1))).collect();
        debug!(bins, %range_min, %range_max, %interval, "ranged buckets");
        Self::from_buckets(buckets, &values)
    }

    /// Partitions the sample range into buckets bounded by successive
    /// powers of `base`.
    ///
    /// Zero, negative and infinite samples cannot be placed on a log scale:
    /// they are skipped and never counted. `base` must be finite and greater
    /// than 1.
    pub fn create_log(base: f64, samples: impl IntoIterator<Item = T>) -> Self {
        let values = sorted(samples);
        if values.is_empty() || !base.is_finite() || base <= 1.0 {
            warn!(samples = values.len(), base, "no buckets: empty samples or log base not above 1");
            return Self::default();
        }
        let mut loggable = values
            .iter()
            .map(|v| v.as_f64())
            .filter(|v| *v > 0.0 && v.is_finite());
        let Some(lo) = loggable.next() else {
            warn!(samples = values.len(), "no buckets: no positive samples for a log scale");
            return Self::default();
        };
        let hi = loggable.last().unwrap_or(lo);

        let from = floor_power(lo, base);
        let to = floor_power(hi, base);
        if (to as i64 - from as i64) >= MAX_BUCKETS as i64 {
            warn!(base, from, to, max = MAX_BUCKETS, "no buckets: log base too close to 1 for range");
            return Self::default();
        }
        let buckets = (from..=to)
            .map(|p| Bucket::new(power_bound(base, p), power_bound(base, p + 1)))
            .collect();
        debug!(base, from, to, "log buckets");
        Self::from_buckets(buckets, &values)
    }

    fn from_buckets(mut buckets: Vec<Bucket<T>>, values: &[T]) -> Self {
        let mut count = 0;
        for &v in values {
            if let Some(i) = locate(&buckets, v) {
                buckets[i].count += 1;
                count += 1;
            }
        }
        let min_bucket_count = buckets.iter().map(|b| b.count).min().unwrap_or(0);
        let max_bucket_count = buckets.iter().map(|b| b.count).max().unwrap_or(0);
        Self {
            buckets,
            count,
            min_bucket_count,
            max_bucket_count,
        }
    }

    /// Finds the bucket `value` falls into.
    ///
    /// Returns `(index, true)` on a match. Otherwise returns the last
    /// bucket's index with `false`, so callers that only want a best-effort
    /// position can ignore the flag. An empty histogram yields `(0, false)`.
    pub fn index(&self, value: T) -> (usize, bool) {
        match locate(&self.buckets, value) {
            Some(i) => (i, true),
            None => (self.buckets.len().saturating_sub(1), false),
        }
    }

    /// Like [`Histogram::index`], but reports a miss as
    /// [`HistoError::ValueOutOfRange`].
    pub fn try_index(&self, value: T) -> Result<usize> {
        match self.index(value) {
            (i, true) => Ok(i),
            (clamped, false) => Err(HistoError::ValueOutOfRange { clamped }),
        }
    }
}

impl<T> Histogram<T> {
    pub fn buckets(&self) -> &[Bucket<T>] {
        &self.buckets
    }

    /// Total number of samples counted across all buckets.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Smallest bucket count. Not a value bound.
    pub fn min_bucket_count(&self) -> usize {
        self.min_bucket_count
    }

    /// Largest bucket count. Not a value bound.
    pub fn max_bucket_count(&self) -> usize {
        self.max_bucket_count
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn clamp<T: Sample>(v: T, lo: T, hi: T) -> T {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

/// Takes ownership of the samples, drops NaN and stable-sorts ascending.
fn sorted<T: Sample>(samples: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut values: Vec<T> = samples.into_iter().filter(Sample::is_comparable).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    values
}

fn locate<T: Sample>(buckets: &[Bucket<T>], value: T) -> Option<usize> {
    let last = buckets.len().checked_sub(1)?;
    buckets.iter().enumerate().position(|(i, b)| b.within(value, i == last))
}

/// Largest `p` with `base^p <= x`, for finite `x > 0` and `base > 1`.
fn floor_power(x: f64, base: f64) -> i32 {
    let mut p = (x.log2() / base.log2()).floor() as i32;
    while p > i32::MIN && base.powf(p as f64) > x {
        p -= 1;
    }
    while p < i32::MAX - 1 && base.powf((p + 1) as f64) <= x {
        p += 1;
    }
    p
}

fn power_bound<T: Sample>(base: f64, p: i32) -> T {
    T::from_f64(base.powf(p as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ordered<T: Sample>(h: &Histogram<T>) {
        for pair in h.buckets().windows(2) {
            assert!(pair[0].min <= pair[0].max, "{:?}", pair[0]);
            assert!(pair[0].max <= pair[1].min, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }

    fn assert_last_inclusive<T: Sample>(h: &Histogram<T>) {
        let last = h.buckets().len() - 1;
        assert_eq!(h.index(h.buckets()[last].max), (last, true));
    }

    fn float_data() -> Vec<f64> {
        vec![
            0.1, 0.2, 0.21, 0.22, 0.22, 0.3, 0.4, 0.5, 0.51, 0.52, 0.53, 0.54, 0.55, 0.56, 0.57,
            0.58, 0.6, 0.8, 0.9, 1.0,
        ]
    }

    fn spread_data() -> Vec<f64> {
        vec![1.0, 2.0, 2.1, 2.5, 2.8, 3.0, 5.0, 5.5, 6.5, 6.6, 7.0, 10.0]
    }

    #[test]
    fn create_floats() {
        let data = float_data();
        let h = Histogram::create(9, data.clone());
        assert_eq!(h.buckets().len(), 9);
        assert_eq!(h.count(), data.len());
        assert_eq!(h.index(1.0), (8, true));
        assert_eq!(h.buckets()[0].min, 0.1);
        assert_eq!(h.buckets()[8].max, 1.0);
        assert_ordered(&h);
        assert_last_inclusive(&h);
    }

    #[test]
    fn create_counts_every_sample_and_indexes_it() {
        let data = float_data();
        let h = Histogram::create(7, data.clone());
        let total: usize = h.buckets().iter().map(|b| b.count).sum();
        assert_eq!(total, data.len());
        for v in data {
            assert!(h.index(v).1, "{v} not found");
        }
    }

    #[test]
    fn create_integers() {
        let h = Histogram::create(4, 0..=20i32);
        let bounds: Vec<(i32, i32, usize)> =
            h.buckets().iter().map(|b| (b.min, b.max, b.count)).collect();
        assert_eq!(bounds, vec![(0, 5, 5), (5, 10, 5), (10, 15, 5), (15, 20, 6)]);
        assert_eq!(h.min_bucket_count(), 5);
        assert_eq!(h.max_bucket_count(), 6);
        assert_last_inclusive(&h);
    }

    #[test]
    fn create_negative_integers_floor_offsets() {
        let h = Histogram::create(3, vec![-7i64, -1, 0, 5]);
        let bounds: Vec<(i64, i64, usize)> =
            h.buckets().iter().map(|b| (b.min, b.max, b.count)).collect();
        assert_eq!(bounds, vec![(-7, -3, 1), (-3, 1, 2), (1, 5, 1)]);
    }

    #[test]
    fn create_full_width_small_types() {
        let h = Histogram::create(2, vec![0u8, 255]);
        assert_eq!((h.buckets()[0].min, h.buckets()[0].max), (0, 127));
        assert_eq!((h.buckets()[1].min, h.buckets()[1].max), (127, 255));
        assert_eq!(h.count(), 2);

        let h = Histogram::create(2, vec![i8::MIN, i8::MAX]);
        assert_eq!(h.buckets()[0].min, i8::MIN);
        assert_eq!(h.buckets()[1].max, i8::MAX);
        assert_eq!(h.count(), 2);
    }

    #[test]
    fn create_more_bins_than_integer_span() {
        let h = Histogram::create(10, vec![0u32, 1, 2, 3]);
        assert_eq!(h.buckets().len(), 10);
        assert_eq!(h.count(), 4);
        assert_eq!(h.min_bucket_count(), 0);
        assert_ordered(&h);
        assert_last_inclusive(&h);
    }

    #[test]
    fn create_degenerate() {
        let h = Histogram::<f64>::create(5, Vec::new());
        assert!(h.is_empty());
        assert_eq!(h.count(), 0);
        let h = Histogram::create(0, vec![1, 2, 3]);
        assert!(h.is_empty());
        assert_eq!(h.count(), 0);
        assert_eq!(h.index(2), (0, false));
    }

    #[test]
    fn create_keeps_wide_integer_bounds_exact() {
        let lo = (1i64 << 53) + 3;
        let hi = (1i64 << 53) + 1003;
        let h = Histogram::create(2, vec![lo, hi]);
        assert_eq!(h.buckets()[0].min, lo);
        assert_eq!(h.buckets()[1].max, hi);
        assert_eq!(h.count(), 2);
        assert_eq!(h.index(lo), (0, true));
        assert_eq!(h.index(hi), (1, true));
        assert_ordered(&h);

        let h = Histogram::create(3, vec![u128::MAX - 7, u128::MAX]);
        assert_eq!(h.buckets()[0].min, u128::MAX - 7);
        assert_eq!(h.count(), 2);
        assert_ordered(&h);
    }

    #[test]
    fn create_rejects_too_many_buckets() {
        assert!(Histogram::create(MAX_BUCKETS + 1, vec![0.0, 1.0]).is_empty());
        assert!(Histogram::create(usize::MAX, vec![0, 1]).is_empty());
        // all-equal samples collapse to one bucket first
        assert_eq!(Histogram::create(usize::MAX, vec![4, 4]).buckets().len(), 1);
    }

    #[test]
    fn create_all_equal() {
        let h = Histogram::create(5, vec![3, 3, 3, 3]);
        assert_eq!(h.buckets().len(), 1);
        assert_eq!((h.buckets()[0].min, h.buckets()[0].max), (3, 3));
        assert_eq!(h.count(), 4);
        assert_eq!(h.index(3), (0, true));
    }

    #[test]
    fn create_skips_nan() {
        let h = Histogram::create(2, vec![1.0, f64::NAN, 3.0]);
        assert_eq!(h.count(), 2);
        assert_eq!(h.index(f64::NAN), (1, false));
    }

    #[test]
    fn create_is_order_independent() {
        let data = spread_data();
        let mut shuffled = Vec::new();
        for (a, b) in data.iter().zip(data.iter().rev()).take(data.len() / 2) {
            shuffled.push(*b);
            shuffled.push(*a);
        }
        let sorted = Histogram::create(5, data);
        let mixed = Histogram::create(5, shuffled);
        assert_eq!(sorted, mixed);
    }

    #[test]
    fn caller_data_is_not_reordered() {
        let data = vec![5, 1, 3];
        let _ = Histogram::create(2, data.iter().copied());
        assert_eq!(data, vec![5, 1, 3]);
    }

    #[test]
    fn ranged_includes_whole_range() {
        let data = spread_data();
        let h = Histogram::create_ranged(0.5, 20.0, 2.0, data.clone());
        assert_eq!(h.count(), data.len());
        assert_eq!(h.buckets().len(), 9);
        assert_eq!(h.buckets()[3].count, 3);
        assert_eq!(h.buckets().last().map(|b| b.max), Some(18.5));
        assert_ordered(&h);
        assert_last_inclusive(&h);
    }

    #[test]
    fn ranged_cross_range() {
        let h = Histogram::create_ranged(6.0, 20.0, 2.0, spread_data());
        assert_eq!(h.count(), 4);
        assert_eq!(h.buckets().len(), 7);
    }

    #[test]
    fn ranged_excludes_outside_samples() {
        let h = Histogram::create_ranged(6, 20, 2, vec![-1, 1, 10]);
        assert_eq!(h.count(), 1);
        assert_eq!(h.buckets().len(), 7);

        let h = Histogram::create_ranged(6.0, 20.0, 2.0, vec![-1.0, 1.0]);
        assert_eq!(h.count(), 0);
        assert_eq!(h.buckets().len(), 7);
        assert_eq!(h.index(1.0), (6, false));
    }

    #[test]
    fn ranged_uneven_interval_drops_remainder() {
        let h = Histogram::create_ranged(0, 10, 3, vec![0, 5, 10]);
        let bounds: Vec<(i32, i32, usize)> =
            h.buckets().iter().map(|b| (b.min, b.max, b.count)).collect();
        assert_eq!(bounds, vec![(0, 3, 1), (3, 6, 1), (6, 9, 0)]);
        assert_eq!(h.count(), 2);
        assert_eq!(h.index(10), (2, false));

        let h = Histogram::create_ranged(0.0, 5.0, 2.0, vec![1.0, 4.0, 4.9, 5.0]);
        let bounds: Vec<(f64, f64)> = h.buckets().iter().map(|b| (b.min, b.max)).collect();
        assert_eq!(bounds, vec![(0.0, 2.0), (2.0, 4.0)]);
        assert_eq!(h.count(), 2);
    }

    #[test]
    fn ranged_interval_wider_than_range() {
        let h = Histogram::create_ranged(0, 1, 2, vec![0, 1, 2]);
        let bounds: Vec<(i32, i32, usize)> =
            h.buckets().iter().map(|b| (b.min, b.max, b.count)).collect();
        assert_eq!(bounds, vec![(0, 1, 2)]);
    }

    #[test]
    fn ranged_does_not_overflow_narrow_types() {
        let h = Histogram::create_ranged(0u8, 250, 125, vec![0, 124, 125, 250]);
        let bounds: Vec<(u8, u8, usize)> =
            h.buckets().iter().map(|b| (b.min, b.max, b.count)).collect();
        assert_eq!(bounds, vec![(0, 125, 2), (125, 250, 2)]);
    }

    #[test]
    fn ranged_keeps_wide_integer_bounds_exact() {
        let lo = (1i64 << 53) + 3;
        let h = Histogram::create_ranged(lo, lo + 1001, 500, vec![lo, lo + 999]);
        assert_eq!(h.buckets()[0].min, lo);
        assert_eq!(h.buckets().last().map(|b| b.max), Some(lo + 1001));
        assert_eq!(h.count(), 2);
        assert_eq!(h.index(lo), (0, true));
        assert_ordered(&h);
    }

    #[test]
    fn ranged_rejects_too_many_buckets() {
        assert!(Histogram::create_ranged(0.0, 1.0, 1e-300, vec![0.5]).is_empty());
        assert!(Histogram::create_ranged(0, i64::MAX, 1, vec![5]).is_empty());
    }

    #[test]
    fn ranged_single_point() {
        let h = Histogram::create_ranged(5, 5, 1, vec![5, 5, 6]);
        assert_eq!(h.buckets().len(), 1);
        assert_eq!(h.count(), 2);
    }

    #[test]
    fn ranged_degenerate() {
        assert!(Histogram::create_ranged(0, 10, 0, vec![1, 2]).is_empty());
        assert!(Histogram::create_ranged(0, 10, -2, vec![1, 2]).is_empty());
        assert!(Histogram::create_ranged(10, 0, 2, vec![1, 2]).is_empty());
        assert!(Histogram::<i32>::create_ranged(0, 10, 2, vec![]).is_empty());
        assert!(Histogram::create_ranged(0.0, 10.0, f64::NAN, vec![1.0]).is_empty());
    }

    #[test]
    fn log_binary() {
        let mut data = spread_data();
        data.push(100.0);
        let h = Histogram::create_log(2.0, data.clone());
        assert_eq!(h.index(10.0), (3, true));
        assert_eq!((h.buckets()[3].min, h.buckets()[3].max), (8.0, 16.0));
        assert_eq!(h.buckets().len(), 7);
        assert_eq!(h.count(), data.len());
        assert_ordered(&h);
        assert_last_inclusive(&h);
    }

    #[test]
    fn log_decimal() {
        let mut data = spread_data();
        data.push(100.0);
        let h = Histogram::create_log(10.0, data);
        assert_eq!(h.index(10.0), (1, true));
        assert_eq!(h.buckets().len(), 3);
        assert_eq!(h.buckets()[2].min, 100.0);
    }

    #[test]
    fn log_integers() {
        let h = Histogram::create_log(2.0, vec![1u32, 3, 4, 1000]);
        assert_eq!(h.buckets().len(), 10);
        assert_eq!(h.index(1000), (9, true));
        assert_eq!((h.buckets()[9].min, h.buckets()[9].max), (512, 1024));
        assert_eq!(h.count(), 4);
    }

    #[test]
    fn log_skips_non_positive_samples() {
        let h = Histogram::create_log(10.0, vec![-5.0, 0.0, 1.0, 50.0]);
        assert_eq!(h.buckets().len(), 2);
        assert_eq!(h.count(), 2);
        assert_eq!(h.index(0.0), (1, false));
    }

    #[test]
    fn log_fractional_samples() {
        let h = Histogram::create_log(2.0, vec![0.3, 0.6, 1.5]);
        assert_eq!(h.buckets()[0].min, 0.25);
        assert_eq!(h.buckets().last().map(|b| b.max), Some(2.0));
        assert_eq!(h.count(), 3);
    }

    #[test]
    fn log_degenerate() {
        assert!(Histogram::<f64>::create_log(2.0, vec![]).is_empty());
        assert!(Histogram::create_log(0.0, vec![1.0, 2.0]).is_empty());
        assert!(Histogram::create_log(-3.0, vec![1.0, 2.0]).is_empty());
        assert!(Histogram::create_log(1.0, vec![1.0, 2.0]).is_empty());
        assert!(Histogram::create_log(2.0, vec![-1.0, 0.0]).is_empty());
    }

    #[test]
    fn log_rejects_too_many_buckets() {
        assert!(Histogram::create_log(1.000_000_1, vec![1.0, 1e300]).is_empty());
    }

    #[test]
    fn try_index_reports_out_of_range() {
        let h = Histogram::create(2, vec![1, 5, 9]);
        assert_eq!(h.try_index(5).unwrap(), 1);
        match h.try_index(42) {
            Err(HistoError::ValueOutOfRange { clamped }) => assert_eq!(clamped, 1),
            other => panic!("unexpected {other:?}"),
        }
    }
}
