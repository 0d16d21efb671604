//! Per-column and per-row source positions of a destination interval.

use crate::scale::mapping::AxisMapping;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

/// Key pixels and quantized fractional offsets along one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPositions {
    start: i64,
    index: Vec<i64>,
    frac: Vec<u32>,
}

impl AxisPositions {
    /// Positions of destination pixels `[d0, d1)`.
    ///
    /// Starts from the exact position of `d0` and steps by the exact inverse
    /// scale. The fractional part is kept as a numerator over a common
    /// denominator, so the walk never drifts from the direct computation.
    pub fn compute(axis: &AxisMapping, d0: i64, d1: i64, subsample_bits: u32) -> Self {
        let len = (d1 - d0).max(0) as usize;
        let mut index = Vec::with_capacity(len);
        let mut frac = Vec::with_capacity(len);
        if len == 0 {
            return Self { start: d0, index, frac };
        }

        let first = axis.position(d0);
        let step = axis.inv_scale();
        let mut key = first.floor();
        let step_int = step.floor();

        let (first_frac, step_frac) = (first.fract(), step.fract());
        let den = first_frac.denom().lcm(step_frac.denom());
        let mut acc = first_frac.numer() * (&den / first_frac.denom());
        let step_num = step_frac.numer() * (&den / step_frac.denom());

        for _ in 0..len {
            index.push(key);
            frac.push(quantize(&acc, &den, subsample_bits));

            key += step_int;
            acc += &step_num;
            if acc >= den {
                acc -= &den;
                key += 1;
            }
        }

        Self { start: d0, index, frac }
    }

    /// First destination coordinate.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Number of destination positions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check for an empty range.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Key source pixel of every destination pixel.
    pub fn index(&self) -> &[i64] {
        &self.index
    }

    /// Quantized fractional offset of every destination pixel.
    pub fn frac(&self) -> &[u32] {
        &self.frac
    }
}

/// `floor(num / den * 2^bits)` for `0 <= num < den`.
fn quantize(num: &BigInt, den: &BigInt, bits: u32) -> u32 {
    if num.is_zero() {
        return 0;
    }
    let scaled: BigInt = num << bits as usize;
    scaled.div_floor(den).to_u32().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rational::Rational;
    use crate::scale::interp::Interpolation;
    use crate::scale::mapping::Mapper;
    use crate::scale::params::ScaleParams;
    use proptest::prelude::*;

    fn direct(axis: &AxisMapping, d: i64, bits: u32) -> (i64, u32) {
        let pos = axis.position(d);
        let scaled = pos.fract() * Rational::from_integer(1i64 << bits);
        (pos.floor(), scaled.floor() as u32)
    }

    #[test]
    fn test_bilinear_half_scale() {
        let params = ScaleParams::new(2.0, 2.0, 0.0, 0.0).unwrap();
        let interp = Interpolation::bilinear();
        let mapper = Mapper::new(&params, &interp);
        let positions = AxisPositions::compute(mapper.x(), 0, 4, 2);
        // pos(d) = (d + 1/2) / 2 - 1/2 = -1/4, 1/4, 3/4, 5/4
        assert_eq!(positions.index(), &[-1, 0, 0, 1]);
        assert_eq!(positions.frac(), &[3, 1, 3, 1]);
        assert_eq!(positions.start(), 0);
    }

    #[test]
    fn test_empty_interval() {
        let params = ScaleParams::identity();
        let mapper = Mapper::new(&params, &Interpolation::nearest());
        let positions = AxisPositions::compute(mapper.x(), 5, 5, 8);
        assert!(positions.is_empty());
        assert_eq!(positions.len(), 0);
    }

    proptest! {
        #[test]
        fn prop_recurrence_matches_direct(
            d0 in -100i64..100, len in 0i64..80,
            num in 1i64..200, den in 1i64..200,
            t in -40i64..40,
            bits in 0u32..12,
            kind in 0usize..3,
        ) {
            let interp = [Interpolation::nearest(), Interpolation::bilinear(), Interpolation::bicubic()][kind].clone();
            let params = ScaleParams::new(num as f64 / den as f64, 1.0, t as f64 / 8.0, 0.0).unwrap();
            let mapper = Mapper::new(&params, &interp);
            let positions = AxisPositions::compute(mapper.x(), d0, d0 + len, bits);
            prop_assert_eq!(positions.len(), len as usize);
            for (i, d) in (d0..d0 + len).enumerate() {
                let (key, frac) = direct(mapper.x(), d, bits);
                prop_assert_eq!(positions.index()[i], key);
                prop_assert_eq!(positions.frac()[i], frac);
            }
        }
    }
}
