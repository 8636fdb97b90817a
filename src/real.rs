//! Arbitrary precision reals.
//!
//! Every [`Real`] the crate creates goes through a [`Precision`], which pins
//! the mantissa width for the lifetime of the process. Mixing values with
//! different precisions would silently widen results, so the precision is
//! chosen once at start-up and then copied around.

use std::str::FromStr;

use dashu_float::round::mode::Zero;
use dashu_float::{DBig, FBig};

use crate::error::{Error, Result};

/// Binary float, rounding towards zero.
pub type Real = FBig;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Precision {
    bits: usize,
}

impl Precision {
    /// Below this the plane can't even be sampled at f32 quality.
    pub const MIN_BITS: usize = 24;

    /// About 315 000 decimal digits.
    pub const MAX_BITS: usize = 1 << 20;

    pub fn from_bits(bits: usize) -> Result<Self> {
        if bits < Self::MIN_BITS {
            return Err(Error::invalid_argument(format!(
                "precision of {} bits is below the minimum of {}",
                bits,
                Self::MIN_BITS
            )));
        }
        if bits > Self::MAX_BITS {
            return Err(Error::invalid_argument(format!(
                "precision of {} bits is above the maximum of {}",
                bits,
                Self::MAX_BITS
            )));
        }
        Ok(Self { bits })
    }

    /// Decimal digits to bits, rounding up.
    pub fn from_digits(digits: usize) -> Result<Self> {
        let bits = (digits as f64 * std::f64::consts::LOG2_10).ceil() as usize;
        Self::from_bits(bits)
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Decimal digits that are fully significant at this precision.
    pub fn digits(&self) -> usize {
        ((self.bits as f64 / std::f64::consts::LOG2_10).floor() as usize).max(1)
    }

    /// Largest decimal exponent, either sign, that text may carry. Beyond
    /// it a value can't share a box with the plane at this precision, and
    /// rebasing it would take time proportional to the exponent.
    pub fn max_exponent(&self) -> usize {
        self.bits
    }

    pub fn zero(&self) -> Real {
        self.fix(Real::ZERO)
    }

    pub fn int(&self, n: i64) -> Real {
        self.fix(Real::from(n))
    }

    /// Goes through the shortest decimal that round-trips `v`, so `0.9` means
    /// nine tenths at full precision rather than the f64 nearest to it.
    pub fn real(&self, v: f64) -> Result<Real> {
        if !v.is_finite() {
            return Err(Error::invalid_argument(format!("{} is not a finite number", v)));
        }
        self.parse(&format!("{:e}", v))
    }

    /// Parse decimal text (`-0.75`, `1.5e-300`, ...) at this precision.
    ///
    /// Parsing goes through a decimal float first so that inputs like `0.1`
    /// are rounded once, at the target precision, instead of being read as
    /// binary digits.
    pub fn parse(&self, text: &str) -> Result<Real> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid_argument("expected a number, got empty text"));
        }
        let decimal = DBig::from_str(text)
            .map_err(|e| Error::invalid_argument(format!("'{}' is not a number: {}", text, e)))?;
        let repr = decimal.repr();
        if !repr.is_zero() {
            // order of magnitude of the leading digit
            let magnitude = repr.exponent().saturating_add(repr.digits() as isize - 1);
            if magnitude.unsigned_abs() > self.max_exponent() {
                return Err(Error::invalid_argument(format!(
                    "'{}' is outside 1e-{n}..1e{n}",
                    text,
                    n = self.max_exponent()
                )));
            }
        }
        let binary = decimal
            .with_base_and_precision::<2>(self.bits)
            .value()
            .with_rounding::<Zero>();
        if !binary.repr().is_finite() {
            return Err(Error::invalid_argument(format!(
                "'{}' is out of the supported range",
                text
            )));
        }
        Ok(binary)
    }

    /// Re-round `v` to this precision.
    pub fn fix(&self, v: Real) -> Real {
        v.with_precision(self.bits).value()
    }
}

/// 500 decimal digits.
impl Default for Precision {
    fn default() -> Self {
        Self { bits: 1661 }
    }
}

pub fn is_finite(v: &Real) -> bool {
    v.repr().is_finite()
}

/// Lossy, for tests and logging.
pub fn to_f64(v: &Real) -> f64 {
    v.to_f64().value()
}

/// Decimal rendering limited to `digits` significant digits.
pub fn to_decimal(v: &Real, digits: usize) -> String {
    v.to_decimal()
        .value()
        .with_precision(digits)
        .value()
        .to_string()
}
