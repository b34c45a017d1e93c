use std::fmt;
use std::ops::{AddAssign, Div, Mul, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

/// Field-like value the stamping and reduction code is written against.
///
/// Implemented for `f64` (numeric networks) and for [`crate::symbolic::Expr`]
/// (component values kept as free symbols). Assembly and elimination run the
/// same code path for both.
pub trait Scalar:
    Clone
    + fmt::Debug
    + fmt::Display
    + PartialEq
    + Zero
    + One
    + Neg<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + SubAssign
{
    /// Exact representations never need a tolerance to recognise zero.
    const EXACT: bool;

    fn from_f64(value: f64) -> Self;

    /// A free variable, or `None` if this representation cannot hold one.
    fn from_symbol(name: &str) -> Option<Self>;

    /// Pivot preference. Larger is better; zero only for a zero value.
    fn pivot_score(&self) -> f64;

    fn recip(&self) -> Self {
        Self::one() / self.clone()
    }
}

impl Scalar for f64 {
    const EXACT: bool = false;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn from_symbol(_name: &str) -> Option<Self> {
        None
    }

    fn pivot_score(&self) -> f64 {
        self.abs()
    }
}
