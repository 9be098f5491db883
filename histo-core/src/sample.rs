use num_traits::{Num, NumCast, ToPrimitive};
use std::fmt::{Debug, Display};

/// Numeric element type a histogram can be built over.
///
/// Boundary arithmetic runs in `f64` and is converted back with
/// [`Sample::from_f64`], which truncates toward zero and saturates at the
/// type's bounds for integers.
pub trait Sample:
    Num + NumCast + ToPrimitive + PartialOrd + Copy + Debug + Display + Send + Sync + 'static
{
    /// `true` for integer types, whose bucket offsets are floored.
    const INTEGRAL: bool;

    fn from_f64(v: f64) -> Self;

    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// NaN is the only value that does not compare with itself.
    fn is_comparable(&self) -> bool {
        self.partial_cmp(self).is_some()
    }
}

macro_rules! impl_sample {
    ($integral:expr => $($t:ty),*) => {
        $(
            impl Sample for $t {
                const INTEGRAL: bool = $integral;
                fn from_f64(v: f64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

impl_sample!(true => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_sample!(false => f32, f64);
