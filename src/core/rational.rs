//! Exact rational arithmetic.
//!
//! All geometric decisions (destination origin and extent, source sub-rectangle
//! boundaries, per-pixel source positions) are taken on [`Rational`] values.
//! Floating-point approximations of the scale factors drift when composed and
//! can move a boundary pixel, so floats are only used to produce the rational
//! once and for quantizing interpolation weights at the very end.
//!
//! A [`Rational`] is always reduced and its denominator is always positive; the
//! sign lives on the numerator.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// Arbitrary-precision fraction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rational(BigRational);

impl Rational {
    /// Create `num / den`.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "rational with zero denominator");
        Self(BigRational::new(BigInt::from(num), BigInt::from(den)))
    }

    /// Create from big integer parts.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    pub fn from_parts(num: BigInt, den: BigInt) -> Self {
        assert!(!den.is_zero(), "rational with zero denominator");
        Self(BigRational::new(num, den))
    }

    /// Create an integral rational.
    pub fn from_integer(value: i64) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }

    /// The value zero.
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    /// The value one.
    pub fn one() -> Self {
        Self(BigRational::one())
    }

    /// The value one half.
    pub fn half() -> Self {
        Self::new(1, 2)
    }

    /// Approximate a float by the first continued-fraction convergent that
    /// lies within `tolerance` of it.
    ///
    /// Returns `None` for NaN or infinite input.
    pub fn approximate(value: f64, tolerance: f64) -> Option<Self> {
        let exact = BigRational::from_float(value)?;
        let tolerance = BigRational::from_float(tolerance.abs())?;

        // Convergent recurrence h(n) = a(n) h(n-1) + h(n-2), same for k.
        let (mut h_prev, mut h) = (BigInt::zero(), BigInt::one());
        let (mut k_prev, mut k) = (BigInt::one(), BigInt::zero());
        let mut rest = exact.clone();

        loop {
            let a = rest.floor().to_integer();
            let h_next = &a * &h + &h_prev;
            let k_next = &a * &k + &k_prev;
            h_prev = std::mem::replace(&mut h, h_next);
            k_prev = std::mem::replace(&mut k, k_next);

            let candidate = BigRational::new(h.clone(), k.clone());
            let remainder = &rest - BigRational::from_integer(a);
            if (&candidate - &exact).abs() <= tolerance || remainder.is_zero() {
                return Some(Self(candidate));
            }
            rest = remainder.recip();
        }
    }

    /// Exact value of a float. Returns `None` for NaN or infinite input.
    pub fn from_f64_exact(value: f64) -> Option<Self> {
        BigRational::from_float(value).map(Self)
    }

    /// Numerator (carries the sign).
    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    /// Denominator (always positive).
    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    /// Largest integer not greater than this value.
    pub fn floor(&self) -> i64 {
        clamp_to_i64(&floor_div(self.numer(), self.denom()))
    }

    /// Smallest integer not less than this value.
    pub fn ceil(&self) -> i64 {
        clamp_to_i64(&ceil_div(self.numer(), self.denom()))
    }

    /// Fractional part, always in `[0, 1)`.
    pub fn fract(&self) -> Self {
        self - &Self::from_integer(self.floor())
    }

    /// Multiplicative inverse.
    ///
    /// # Panics
    ///
    /// Panics if the value is zero.
    pub fn recip(&self) -> Self {
        assert!(!self.is_zero(), "reciprocal of zero");
        Self(self.0.recip())
    }

    /// Floored modulo: the result has the sign of `modulus`.
    pub fn modulo(&self, modulus: &Rational) -> Self {
        let quotient = (self / modulus).floor();
        self - &(modulus * quotient)
    }

    /// Check for zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Check for a strictly positive value.
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Check for an integral value.
    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    /// Nearest `f64`. Only meant for weights and display.
    pub fn to_f64(&self) -> f64 {
        let (num, den) = (self.numer(), self.denom());
        let excess = num.bits().max(den.bits()).saturating_sub(1000) as usize;
        let (num, den) = (num >> excess, den >> excess);
        match (num.to_f64(), den.to_f64()) {
            (Some(n), Some(d)) if d != 0.0 => n / d,
            _ => f64::NAN,
        }
    }
}

/// `floor(num / den)` on big integers.
pub fn floor_div(num: &BigInt, den: &BigInt) -> BigInt {
    num.div_floor(den)
}

/// `ceil(num / den)` on big integers.
pub fn ceil_div(num: &BigInt, den: &BigInt) -> BigInt {
    -((-num).div_floor(den))
}

fn clamp_to_i64(value: &BigInt) -> i64 {
    value.to_i64().unwrap_or(if value.is_negative() { i64::MIN } else { i64::MAX })
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numer())
        } else {
            write!(f, "{}/{}", self.numer(), self.denom())
        }
    }
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident, $body:expr) => {
        impl<'a> $trait<&'a Rational> for &'a Rational {
            type Output = Rational;

            fn $method(self, rhs: &'a Rational) -> Rational {
                let op: fn(&BigRational, &BigRational) -> BigRational = $body;
                Rational(op(&self.0, &rhs.0))
            }
        }

        impl $trait for Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                (&self).$method(&rhs)
            }
        }

        impl<'a> $trait<&'a Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: &'a Rational) -> Rational {
                (&self).$method(rhs)
            }
        }

        impl $trait<i64> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: i64) -> Rational {
                self.$method(&Rational::from_integer(rhs))
            }
        }

        impl $trait<i64> for Rational {
            type Output = Rational;

            fn $method(self, rhs: i64) -> Rational {
                (&self).$method(&Rational::from_integer(rhs))
            }
        }
    };
}

forward_binop!(Add, add, |a, b| a + b);
forward_binop!(Sub, sub, |a, b| a - b);
forward_binop!(Mul, mul, |a, b| a * b);
forward_binop!(Div, div, |a, b| {
    assert!(!b.is_zero(), "division by zero rational");
    a / b
});

impl Rem for &Rational {
    type Output = Rational;

    fn rem(self, rhs: &Rational) -> Rational {
        self.modulo(rhs)
    }
}

impl Rem for Rational {
    type Output = Rational;

    fn rem(self, rhs: Rational) -> Rational {
        self.modulo(&rhs)
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-self.0.clone())
    }
}
