//! Exact arithmetic over named component values.

mod expr;
pub mod poly;

pub use expr::Expr;
pub use poly::{Monomial, Poly};
