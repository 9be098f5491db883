use std::fmt;
use std::num::ParseIntError;
use std::ops::{Add, Div, Mul, Rem, Sub};
use std::str::FromStr;
use std::time::Duration;

use histo_common::{HistoError, Result};
use num_traits::{Num, NumCast, One, ToPrimitive, Zero};
use serde::Serialize;

use crate::sample::Sample;

const MICROSECOND: u64 = 1_000;
const MILLISECOND: u64 = 1_000_000;
const SECOND: u64 = 1_000_000_000;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// A signed span of time in nanoseconds, usable as a histogram sample.
///
/// Displays with a unit, e.g. `250ms`, `1.5s` or `1h2m3s`, so the stock
/// integer layout prints ranges such as `100ms-200ms`. Parses the same
/// notation back (sequences like `1m30s` included) or a bare integer
/// nanosecond count. Serializes as the nanosecond count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Nanos(pub i64);

impl Nanos {
    pub fn from_millis(ms: i64) -> Self {
        Nanos(ms.saturating_mul(MILLISECOND as i64))
    }
}

impl From<Duration> for Nanos {
    /// Saturates at `i64::MAX` nanoseconds (about 292 years).
    fn from(d: Duration) -> Self {
        Nanos(i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
    }
}

/// `v / unit` with the remainder as trailing decimals, zeros trimmed.
fn fraction(v: u64, unit: u64) -> String {
    let (whole, rest) = (v / unit, v % unit);
    if rest == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let decimals = format!("{rest:0width$}");
    format!("{whole}.{}", decimals.trim_end_matches('0'))
}

impl fmt::Display for Nanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0s");
        }
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let n = self.0.unsigned_abs();
        if n < SECOND {
            let (unit, suffix) = if n < MICROSECOND {
                (1, "ns")
            } else if n < MILLISECOND {
                (MICROSECOND, "µs")
            } else {
                (MILLISECOND, "ms")
            };
            return write!(f, "{}{suffix}", fraction(n, unit));
        }
        let (hours, minutes) = (n / HOUR, n % HOUR / MINUTE);
        if hours > 0 {
            write!(f, "{hours}h")?;
        }
        if hours > 0 || minutes > 0 {
            write!(f, "{minutes}m")?;
        }
        write!(f, "{}s", fraction(n % MINUTE, SECOND))
    }
}

impl FromStr for Nanos {
    type Err = HistoError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Nanos(n));
        }
        let invalid = || HistoError::Other(format!("invalid duration {s:?}"));
        let (sign, mut rest) = match s.strip_prefix('-') {
            Some(r) => (-1.0, r),
            None => (1.0, s.strip_prefix('+').unwrap_or(s)),
        };
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut total = 0.0;
        while !rest.is_empty() {
            let number_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(invalid)?;
            let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
            let tail = &rest[number_len..];
            let unit_len = tail
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(tail.len());
            let scale = match &tail[..unit_len] {
                "ns" => 1,
                "us" | "µs" | "μs" => MICROSECOND,
                "ms" => MILLISECOND,
                "s" => SECOND,
                "m" => MINUTE,
                "h" => HOUR,
                _ => return Err(invalid()),
            };
            total += value * scale as f64;
            rest = &tail[unit_len..];
        }
        let total = (sign * total).round();
        if !(total.abs() <= i64::MAX as f64) {
            return Err(invalid());
        }
        Ok(Nanos(total as i64))
    }
}

macro_rules! forward_op {
    ($($op:ident $method:ident),*) => {
        $(
            impl $op for Nanos {
                type Output = Nanos;
                fn $method(self, rhs: Nanos) -> Nanos {
                    Nanos(self.0.$method(rhs.0))
                }
            }
        )*
    };
}

forward_op!(Add add, Sub sub, Mul mul, Div div, Rem rem);

impl Zero for Nanos {
    fn zero() -> Self {
        Nanos(0)
    }

    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl One for Nanos {
    fn one() -> Self {
        Nanos(1)
    }
}

impl Num for Nanos {
    type FromStrRadixErr = ParseIntError;

    fn from_str_radix(s: &str, radix: u32) -> std::result::Result<Self, ParseIntError> {
        i64::from_str_radix(s, radix).map(Nanos)
    }
}

impl ToPrimitive for Nanos {
    fn to_i64(&self) -> Option<i64> {
        Some(self.0)
    }

    fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    fn to_f64(&self) -> Option<f64> {
        Some(self.0 as f64)
    }
}

impl NumCast for Nanos {
    fn from<N: ToPrimitive>(n: N) -> Option<Self> {
        n.to_i64().map(Nanos)
    }
}

impl Sample for Nanos {
    const INTEGRAL: bool = true;

    fn from_f64(v: f64) -> Self {
        Nanos(v as i64)
    }
}
