//! Core scalar traits for axb.

use core::fmt;

/// Per-scalar tolerance defaults and coercion.
///
/// Floating-point scalars default both tolerances to the square root of
/// machine epsilon; exact scalars (integers) default to zero. User-supplied
/// tolerances are coerced through [`Tolerance::coerce_tolerance`] so that
/// all arithmetic during a solve happens in the rhs element's real type.
pub trait Tolerance {
    /// Real type of the scalar, used to store tolerances.
    type Real: Copy + PartialOrd + fmt::Debug;
    /// Default absolute/relative tolerance for this scalar.
    fn default_tolerance() -> Self::Real;
    /// Coerce a user-supplied tolerance into the scalar's real type.
    fn coerce_tolerance(value: f64) -> Self::Real;
}

impl Tolerance for f64 {
    type Real = f64;
    fn default_tolerance() -> f64 {
        f64::EPSILON.sqrt()
    }
    fn coerce_tolerance(value: f64) -> f64 {
        value
    }
}

impl Tolerance for f32 {
    type Real = f32;
    fn default_tolerance() -> f32 {
        f32::EPSILON.sqrt()
    }
    fn coerce_tolerance(value: f64) -> f32 {
        value as f32
    }
}

macro_rules! exact_tolerance {
    ($($t:ty),*) => {$(
        impl Tolerance for $t {
            type Real = $t;
            fn default_tolerance() -> $t {
                0
            }
            fn coerce_tolerance(value: f64) -> $t {
                value as $t
            }
        }
    )*};
}

exact_tolerance!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Scalar types usable as operator/rhs elements in the cache protocol.
///
/// Bundles the faer field traits needed by the direct factorizations with
/// the num-traits surface the iterative methods are written against.
pub trait Scalar:
    faer::traits::ComplexField
    + faer::traits::RealField
    + num_traits::Float
    + num_traits::FromPrimitive
    + Tolerance<Real = Self>
    + fmt::Debug
    + 'static
{
}

impl<T> Scalar for T where
    T: faer::traits::ComplexField
        + faer::traits::RealField
        + num_traits::Float
        + num_traits::FromPrimitive
        + Tolerance<Real = Self>
        + fmt::Debug
        + 'static
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_tolerance_defaults_to_sqrt_eps() {
        assert_eq!(f64::default_tolerance(), f64::EPSILON.sqrt());
        assert_eq!(f32::default_tolerance(), f32::EPSILON.sqrt());
    }

    #[test]
    fn exact_tolerance_defaults_to_zero() {
        assert_eq!(i32::default_tolerance(), 0);
        assert_eq!(i64::default_tolerance(), 0);
        assert_eq!(u64::default_tolerance(), 0);
    }

    #[test]
    fn user_tolerance_is_coerced_to_element_type() {
        assert_eq!(f32::coerce_tolerance(1e-3), 1e-3f32);
        assert_eq!(i64::coerce_tolerance(0.9), 0);
    }
}
