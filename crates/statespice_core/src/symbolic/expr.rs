use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use num_traits::{One, Zero};
use statespice_netlist::Bindings;

use super::poly::Poly;
use crate::scalar::Scalar;

/// Rational function of named component values.
///
/// Kept normalised after every operation: a zero numerator has denominator
/// `1`, monomial factors shared by numerator and denominator are cancelled,
/// an exact polynomial quotient is collapsed, and the denominator's leading
/// coefficient is `1`.
#[derive(Debug, Clone)]
pub struct Expr {
    num: Poly,
    den: Poly,
}

impl Expr {
    pub fn constant(value: f64) -> Self {
        Self {
            num: Poly::constant(value),
            den: Poly::constant(1.0),
        }
    }

    pub fn symbol(name: &str) -> Self {
        Self {
            num: Poly::symbol(name),
            den: Poly::constant(1.0),
        }
    }

    fn from_parts(num: Poly, den: Poly) -> Self {
        assert!(!den.is_zero(), "symbolic division by zero");
        if num.is_zero() {
            return Self::zero();
        }

        let shared = num.monomial_content().gcd(&den.monomial_content());
        let (mut num, mut den) = if shared.is_one() {
            (num, den)
        } else {
            match (num.div_monomial(&shared), den.div_monomial(&shared)) {
                (Some(n), Some(d)) => (n, d),
                _ => (num, den),
            }
        };

        if den.as_constant().is_none() {
            if let Some(q) = num.div_exact(&den) {
                num = q;
                den = Poly::constant(1.0);
            } else if let Some(q) = den.div_exact(&num) {
                num = Poly::constant(1.0);
                den = q;
            }
        }

        if let Some((_, lead)) = den.leading() {
            if lead != 1.0 {
                let k = lead.recip();
                num = num.scale(k);
                den = den.scale(k);
            }
        }
        Self { num, den }
    }

    pub fn numerator(&self) -> &Poly {
        &self.num
    }

    pub fn denominator(&self) -> &Poly {
        &self.den
    }

    /// The value if no symbols remain.
    pub fn as_constant(&self) -> Option<f64> {
        Some(self.num.as_constant()? / self.den.as_constant()?)
    }

    /// Numeric value with every symbol taken from `bindings`.
    pub fn evaluate(&self, bindings: &Bindings) -> Option<f64> {
        let lookup = |name: &str| bindings.get(name);
        Some(self.num.eval(&lookup)? / self.den.eval(&lookup)?)
    }

    pub fn symbols(&self) -> BTreeSet<&str> {
        self.num.symbols().chain(self.den.symbols()).collect()
    }
}

impl Zero for Expr {
    fn zero() -> Self {
        Self {
            num: Poly::zero(),
            den: Poly::constant(1.0),
        }
    }

    fn is_zero(&self) -> bool {
        self.num.is_zero()
    }
}

impl One for Expr {
    fn one() -> Self {
        Self::constant(1.0)
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.num
            .mul(&other.den)
            .sub(&other.num.mul(&self.den))
            .is_zero()
    }
}

impl Add for &Expr {
    type Output = Expr;

    fn add(self, rhs: &Expr) -> Expr {
        if self.den == rhs.den {
            return Expr::from_parts(self.num.add(&rhs.num), self.den.clone());
        }
        Expr::from_parts(
            self.num.mul(&rhs.den).add(&rhs.num.mul(&self.den)),
            self.den.mul(&rhs.den),
        )
    }
}

impl Sub for &Expr {
    type Output = Expr;

    fn sub(self, rhs: &Expr) -> Expr {
        if self.den == rhs.den {
            return Expr::from_parts(self.num.sub(&rhs.num), self.den.clone());
        }
        Expr::from_parts(
            self.num.mul(&rhs.den).sub(&rhs.num.mul(&self.den)),
            self.den.mul(&rhs.den),
        )
    }
}

impl Mul for &Expr {
    type Output = Expr;

    fn mul(self, rhs: &Expr) -> Expr {
        if self.is_zero() || rhs.is_zero() {
            return Expr::zero();
        }
        Expr::from_parts(self.num.mul(&rhs.num), self.den.mul(&rhs.den))
    }
}

impl Div for &Expr {
    type Output = Expr;

    fn div(self, rhs: &Expr) -> Expr {
        assert!(!rhs.is_zero(), "symbolic division by zero");
        Expr::from_parts(self.num.mul(&rhs.den), self.den.mul(&rhs.num))
    }
}

macro_rules! forward_binop {
    ($($trait:ident::$method:ident),*) => {$(
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                (&self).$method(&rhs)
            }
        }
    )*};
}

forward_binop!(Add::add, Sub::sub, Mul::mul, Div::div);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr {
            num: self.num.neg(),
            den: self.den,
        }
    }
}

impl AddAssign for Expr {
    fn add_assign(&mut self, rhs: Expr) {
        *self = &*self + &rhs;
    }
}

impl SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Expr) {
        *self = &*self - &rhs;
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl Scalar for Expr {
    const EXACT: bool = true;

    fn from_f64(value: f64) -> Self {
        Expr::constant(value)
    }

    fn from_symbol(name: &str) -> Option<Self> {
        Some(Expr::symbol(name))
    }

    // Prefer the pivot with the fewest terms; it keeps intermediate
    // expressions small.
    fn pivot_score(&self) -> f64 {
        if self.is_zero() {
            0.0
        } else {
            1.0 / (self.num.len() + self.den.len()) as f64
        }
    }
}

fn is_atom(p: &Poly) -> bool {
    match p.terms().next() {
        Some((m, c)) if p.len() == 1 => {
            c == 1.0 && (m.is_one() || (m.factors().len() == 1 && m.factors()[0].1 == 1))
        }
        _ => false,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.as_constant() == Some(1.0) {
            return write!(f, "{}", self.num);
        }
        if self.num.len() > 1 {
            write!(f, "({})", self.num)?;
        } else {
            write!(f, "{}", self.num)?;
        }
        if is_atom(&self.den) {
            write!(f, "/{}", self.den)
        } else {
            write!(f, "/({})", self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> Expr {
        Expr::symbol(name)
    }

    #[test]
    fn reciprocal_of_reciprocal() {
        let r = s("R");
        let g = r.recip();
        assert_eq!(g.to_string(), "1/R");
        assert_eq!(g.recip().to_string(), "R");
    }

    #[test]
    fn sign_moves_to_numerator() {
        let a = s("R") / -s("L");
        assert_eq!(a.to_string(), "-R/L");
        assert_eq!((Expr::one() / (s("L") * s("C"))).to_string(), "1/(C*L)");
    }

    #[test]
    fn cancellation_through_sums() {
        let g = s("R").recip();
        assert!((g.clone() - g.clone()).is_zero());
        assert_eq!(&(&s("R") * &g) + &Expr::one(), Expr::constant(2.0));
    }

    #[test]
    fn common_factor_divides_out() {
        let sum = &s("R") + &s("L");
        let ratio = &(&sum * &s("C")) / &sum;
        assert_eq!(ratio.to_string(), "C");
    }

    #[test]
    fn equality_is_structural_up_to_normalisation() {
        let a = &s("x") / &s("y");
        let b = &(&s("x") * &s("z")) / &(&s("y") * &s("z"));
        assert_eq!(a, b);
        assert_ne!(a, s("x"));
    }

    #[test]
    fn evaluate_with_bindings() {
        let e = &s("R") / &(&s("L") + &Expr::constant(1.0));
        let bindings: Bindings = [("R".to_string(), 6.0), ("L".to_string(), 2.0)]
            .into_iter()
            .collect();
        assert_eq!(e.evaluate(&bindings), Some(2.0));
        assert_eq!(e.evaluate(&Bindings::new()), None);
        assert_eq!(e.symbols().into_iter().collect::<Vec<_>>(), vec!["L", "R"]);
    }

    #[test]
    #[should_panic(expected = "symbolic division by zero")]
    fn division_by_zero_panics() {
        let _ = s("R") / Expr::zero();
    }
}
