use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Coefficients whose magnitude falls this far below the operands they came
/// from are cancellation noise and are dropped.
const CANCELLATION_EPS: f64 = 1e-12;

/// Product of symbols with positive exponents, kept sorted by symbol name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Monomial(Vec<(String, u32)>);

impl Monomial {
    pub fn one() -> Self {
        Self(Vec::new())
    }

    pub fn symbol(name: &str) -> Self {
        Self(vec![(name.to_string(), 1)])
    }

    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    pub fn degree(&self) -> u32 {
        self.0.iter().map(|(_, e)| e).sum()
    }

    pub fn factors(&self) -> &[(String, u32)] {
        &self.0
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut out = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut a, mut b) = (self.0.iter().peekable(), other.0.iter().peekable());
        loop {
            match (a.peek(), b.peek()) {
                (Some((va, ea)), Some((vb, eb))) => match va.cmp(vb) {
                    Ordering::Less => {
                        out.push((va.clone(), *ea));
                        a.next();
                    }
                    Ordering::Greater => {
                        out.push((vb.clone(), *eb));
                        b.next();
                    }
                    Ordering::Equal => {
                        out.push((va.clone(), ea + eb));
                        a.next();
                        b.next();
                    }
                },
                (Some(_), None) => out.extend(a.by_ref().cloned()),
                (None, Some(_)) => out.extend(b.by_ref().cloned()),
                (None, None) => break,
            }
        }
        Monomial(out)
    }

    /// `self / other` if every exponent of `other` is covered.
    pub fn checked_div(&self, other: &Monomial) -> Option<Monomial> {
        let mut out = Vec::with_capacity(self.0.len());
        let mut b = other.0.iter().peekable();
        for (va, ea) in &self.0 {
            let mut e = *ea;
            if let Some((vb, eb)) = b.peek() {
                match va.cmp(vb) {
                    Ordering::Greater => return None,
                    Ordering::Equal => {
                        e = e.checked_sub(*eb)?;
                        b.next();
                    }
                    Ordering::Less => {}
                }
            }
            if e > 0 {
                out.push((va.clone(), e));
            }
        }
        if b.next().is_some() {
            return None;
        }
        Some(Monomial(out))
    }

    pub fn gcd(&self, other: &Monomial) -> Monomial {
        let mut out = Vec::new();
        let mut b = other.0.iter().peekable();
        for (va, ea) in &self.0 {
            while let Some((vb, _)) = b.peek() {
                if vb < va {
                    b.next();
                } else {
                    break;
                }
            }
            if let Some((vb, eb)) = b.peek() {
                if vb == va {
                    out.push((va.clone(), (*ea).min(*eb)));
                }
            }
        }
        Monomial(out)
    }

    fn eval(&self, lookup: &impl Fn(&str) -> Option<f64>) -> Option<f64> {
        self.0
            .iter()
            .try_fold(1.0, |acc, (name, e)| lookup(name).map(|v| acc * v.powi(*e as i32)))
    }
}

// Graded lexicographic order, alphabetically first symbol most significant.
// Leading terms under this order drive the exact division below.
impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        self.degree().cmp(&other.degree()).then_with(|| {
            let (mut a, mut b) = (self.0.iter(), other.0.iter());
            loop {
                match (a.next(), b.next()) {
                    (None, None) => return Ordering::Equal,
                    (Some(_), None) => return Ordering::Greater,
                    (None, Some(_)) => return Ordering::Less,
                    (Some((va, ea)), Some((vb, eb))) => match va.cmp(vb) {
                        Ordering::Less => return Ordering::Greater,
                        Ordering::Greater => return Ordering::Less,
                        Ordering::Equal => match ea.cmp(eb) {
                            Ordering::Equal => {}
                            unequal => return unequal,
                        },
                    },
                }
            }
        })
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, e)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("*")?;
            }
            if *e == 1 {
                write!(f, "{name}")?;
            } else {
                write!(f, "{name}^{e}")?;
            }
        }
        Ok(())
    }
}

/// Sparse multivariate polynomial with `f64` coefficients.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Poly {
    terms: BTreeMap<Monomial, f64>,
}

impl Poly {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(c: f64) -> Self {
        Self::term(Monomial::one(), c)
    }

    pub fn symbol(name: &str) -> Self {
        Self::term(Monomial::symbol(name), 1.0)
    }

    pub fn term(monomial: Monomial, c: f64) -> Self {
        let mut terms = BTreeMap::new();
        if c != 0.0 {
            terms.insert(monomial, c);
        }
        Self { terms }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The value if the polynomial has no symbols.
    pub fn as_constant(&self) -> Option<f64> {
        match self.terms.len() {
            0 => Some(0.0),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(m, _)| m.is_one())
                .map(|(_, c)| *c),
            _ => None,
        }
    }

    pub fn leading(&self) -> Option<(&Monomial, f64)> {
        self.terms.iter().next_back().map(|(m, c)| (m, *c))
    }

    pub fn terms(&self) -> impl DoubleEndedIterator<Item = (&Monomial, f64)> {
        self.terms.iter().map(|(m, c)| (m, *c))
    }

    fn accumulate(&mut self, monomial: Monomial, c: f64) {
        if c == 0.0 {
            return;
        }
        match self.terms.get_mut(&monomial) {
            Some(existing) => {
                let sum = *existing + c;
                if sum.abs() <= CANCELLATION_EPS * (existing.abs() + c.abs()) {
                    self.terms.remove(&monomial);
                } else {
                    *existing = sum;
                }
            }
            None => {
                self.terms.insert(monomial, c);
            }
        }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.accumulate(m.clone(), *c);
        }
        out
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &other.terms {
            out.accumulate(m.clone(), -c);
        }
        out
    }

    pub fn neg(&self) -> Poly {
        Poly {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), -c)).collect(),
        }
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                out.accumulate(ma.mul(mb), ca * cb);
            }
        }
        out
    }

    pub fn scale(&self, k: f64) -> Poly {
        if k == 0.0 {
            return Poly::zero();
        }
        Poly {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), c * k)).collect(),
        }
    }

    pub fn mul_monomial(&self, monomial: &Monomial) -> Poly {
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.mul(monomial), *c))
                .collect(),
        }
    }

    /// Largest monomial dividing every term.
    pub fn monomial_content(&self) -> Monomial {
        let mut iter = self.terms.keys();
        let Some(first) = iter.next() else {
            return Monomial::one();
        };
        iter.fold(first.clone(), |acc, m| acc.gcd(m))
    }

    pub fn div_monomial(&self, monomial: &Monomial) -> Option<Poly> {
        let mut terms = BTreeMap::new();
        for (m, c) in &self.terms {
            terms.insert(m.checked_div(monomial)?, *c);
        }
        Some(Poly { terms })
    }

    /// Quotient of multivariate long division, if the remainder is zero.
    pub fn div_exact(&self, divisor: &Poly) -> Option<Poly> {
        let (lead_m, lead_c) = divisor.leading()?;
        let (lead_m, lead_c) = (lead_m.clone(), lead_c);
        let mut remainder = self.clone();
        let mut quotient = Poly::zero();

        while let Some((m, c)) = remainder.leading() {
            let factor_m = m.checked_div(&lead_m)?;
            let factor_c = c / lead_c;
            let top = m.clone();

            let step = divisor.mul_monomial(&factor_m).scale(factor_c);
            remainder = remainder.sub(&step);
            // the leading term cancels by construction; drop any rounding residue
            remainder.terms.remove(&top);
            quotient.accumulate(factor_m, factor_c);
        }
        Some(quotient)
    }

    /// Value under `lookup`, or `None` if some symbol has no value.
    pub fn eval(&self, lookup: &impl Fn(&str) -> Option<f64>) -> Option<f64> {
        self.terms
            .iter()
            .try_fold(0.0, |acc, (m, c)| m.eval(lookup).map(|v| acc + c * v))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.terms
            .keys()
            .flat_map(|m| m.factors().iter().map(|(name, _)| name.as_str()))
    }
}

fn write_coefficient(f: &mut fmt::Formatter<'_>, c: f64, monomial: &Monomial) -> fmt::Result {
    if monomial.is_one() {
        write!(f, "{c}")
    } else if c == 1.0 {
        write!(f, "{monomial}")
    } else {
        write!(f, "{c}*{monomial}")
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        for (i, (m, c)) in self.terms.iter().rev().enumerate() {
            if i == 0 {
                if *c < 0.0 {
                    f.write_str("-")?;
                }
            } else if *c < 0.0 {
                f.write_str(" - ")?;
            } else {
                f.write_str(" + ")?;
            }
            write_coefficient(f, c.abs(), m)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Poly {
        Poly::symbol("x")
    }

    fn y() -> Poly {
        Poly::symbol("y")
    }

    #[test]
    fn monomial_order_is_multiplicative() {
        let xy = Monomial::symbol("x").mul(&Monomial::symbol("y"));
        let y = Monomial::symbol("y");
        let x = Monomial::symbol("x");
        assert!(xy > y);
        assert!(x > y);
        assert!(xy.mul(&x) > y.mul(&x));
    }

    #[test]
    fn cancellation_removes_terms() {
        let p = x().add(&y()).sub(&x());
        assert_eq!(p, y());
        assert!(x().sub(&x()).is_zero());
    }

    #[test]
    fn exact_division_of_product() {
        let a = x().add(&Poly::constant(1.0));
        let b = x().sub(&y());
        let product = a.mul(&b);
        assert_eq!(product.div_exact(&b), Some(a.clone()));
        assert_eq!(product.div_exact(&a), Some(b));
        assert_eq!(a.div_exact(&y()), None);
    }

    #[test]
    fn monomial_content_of_sum() {
        let p = x().mul(&x()).mul(&y()).add(&x().mul(&y()).scale(3.0));
        assert_eq!(p.monomial_content(), Monomial::symbol("x").mul(&Monomial::symbol("y")));
    }

    #[test]
    fn display_orders_leading_term_first() {
        let p = x().mul(&x()).sub(&y().scale(2.0)).add(&Poly::constant(1.0));
        assert_eq!(p.to_string(), "x^2 - 2*y + 1");
    }
}
