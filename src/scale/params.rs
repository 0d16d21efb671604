//! Affine scale parameters held both as floats and as exact rationals.

use crate::core::error::{ConfigError, ConfigResult};
use crate::core::rational::Rational;
use std::fmt;

/// Maximum distance between a configured float and its rational stand-in.
pub const RATIONAL_TOLERANCE: f64 = 1e-8;

/// Scale, translation and inverse scale of one axis, exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisParams {
    /// Destination pixels per source pixel.
    pub scale: Rational,
    /// Destination offset of the source origin.
    pub trans: Rational,
    /// `1 / scale`, derived from the rational scale.
    pub inv_scale: Rational,
}

impl AxisParams {
    fn new(axis: char, scale: f64, trans: f64) -> ConfigResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::InvalidScale { axis, value: scale });
        }
        if !trans.is_finite() {
            return Err(ConfigError::InvalidTranslation { axis, value: trans });
        }

        // Very small scales approximate to zero; fall back to the exact float.
        let scale_exact = Rational::approximate(scale, RATIONAL_TOLERANCE)
            .filter(Rational::is_positive)
            .or_else(|| Rational::from_f64_exact(scale))
            .ok_or(ConfigError::InvalidScale { axis, value: scale })?;
        let trans_exact = Rational::approximate(trans, RATIONAL_TOLERANCE)
            .ok_or(ConfigError::InvalidTranslation { axis, value: trans })?;

        Ok(Self {
            inv_scale: scale_exact.recip(),
            scale: scale_exact,
            trans: trans_exact,
        })
    }
}

/// Parameters of a scale-and-translate transform.
///
/// A destination pixel centre `d + 1/2` corresponds to the source position
/// `(d + 1/2 - trans) / scale`. The floats are what the caller configured and
/// are kept for display only.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleParams {
    scale_x: f64,
    scale_y: f64,
    trans_x: f64,
    trans_y: f64,
    x: AxisParams,
    y: AxisParams,
}

impl ScaleParams {
    /// Validate the factors and derive their rational forms.
    pub fn new(scale_x: f64, scale_y: f64, trans_x: f64, trans_y: f64) -> ConfigResult<Self> {
        Ok(Self {
            scale_x,
            scale_y,
            trans_x,
            trans_y,
            x: AxisParams::new('x', scale_x, trans_x)?,
            y: AxisParams::new('y', scale_y, trans_y)?,
        })
    }

    /// Scale 1, no translation.
    pub fn identity() -> Self {
        let axis = AxisParams {
            scale: Rational::one(),
            trans: Rational::zero(),
            inv_scale: Rational::one(),
        };
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            trans_x: 0.0,
            trans_y: 0.0,
            x: axis.clone(),
            y: axis,
        }
    }

    /// Horizontal scale factor as given.
    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Vertical scale factor as given.
    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Horizontal translation as given.
    pub fn trans_x(&self) -> f64 {
        self.trans_x
    }

    /// Vertical translation as given.
    pub fn trans_y(&self) -> f64 {
        self.trans_y
    }

    /// Exact parameters of the horizontal axis.
    pub fn x(&self) -> &AxisParams {
        &self.x
    }

    /// Exact parameters of the vertical axis.
    pub fn y(&self) -> &AxisParams {
        &self.y
    }
}

impl fmt::Display for ScaleParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scale ({}, {}) translate ({}, {})",
            self.x.scale, self.y.scale, self.x.trans, self.y.trans
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rationals_match_floats() {
        let params = ScaleParams::new(0.1, 2.5, -3.25, 1.0 / 3.0).unwrap();
        assert_eq!(params.x().scale, Rational::new(1, 10));
        assert_eq!(params.x().inv_scale, Rational::from_integer(10));
        assert_eq!(params.y().scale, Rational::new(5, 2));
        assert_eq!(params.x().trans, Rational::new(-13, 4));
        assert_eq!(params.y().trans, Rational::new(1, 3));
        assert_eq!(params.scale_x(), 0.1);
    }

    #[test]
    fn test_inverse_is_exact() {
        let params = ScaleParams::new(0.3, 0.7, 0.0, 0.0).unwrap();
        let x = params.x();
        assert_eq!(&x.scale * &x.inv_scale, Rational::one());
    }

    #[test]
    fn test_tiny_scale_stays_positive() {
        let params = ScaleParams::new(1e-12, 1.0, 0.0, 0.0).unwrap();
        assert!(params.x().scale.is_positive());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            ScaleParams::new(0.0, 1.0, 0.0, 0.0),
            Err(ConfigError::InvalidScale { axis: 'x', .. })
        ));
        assert!(matches!(
            ScaleParams::new(1.0, -2.0, 0.0, 0.0),
            Err(ConfigError::InvalidScale { axis: 'y', .. })
        ));
        assert!(matches!(
            ScaleParams::new(1.0, f64::NAN, 0.0, 0.0),
            Err(ConfigError::InvalidScale { .. })
        ));
        assert!(matches!(
            ScaleParams::new(1.0, 1.0, f64::INFINITY, 0.0),
            Err(ConfigError::InvalidTranslation { axis: 'x', .. })
        ));
    }

    #[test]
    fn test_display() {
        let params = ScaleParams::new(2.0, 0.5, 1.5, 0.0).unwrap();
        assert_eq!(params.to_string(), "scale (2, 1/2) translate (3/2, 0)");
    }
}
