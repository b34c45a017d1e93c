//! Dense elimination over any [`Scalar`].
//!
//! `ndarray`'s `dot` needs `LinalgScalar`, which a symbolic value cannot
//! provide, so the few products the reducer needs are written out here.

use ndarray::{Array2, ArrayView2};

use crate::scalar::Scalar;

/// Column of the coefficient matrix where no usable pivot was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Singular {
    pub column: usize,
}

/// Solve `a · x = b` for `x` by Gauss-Jordan elimination with partial pivoting.
///
/// Pivots are chosen by [`Scalar::pivot_score`]. For exact scalars a column
/// is singular only when every candidate is zero. Inexact systems are first
/// equilibrated so every row and column peaks at 1, and a pivot must then
/// exceed `tolerance`.
pub fn solve<T: Scalar>(
    a: ArrayView2<'_, T>,
    b: ArrayView2<'_, T>,
    tolerance: f64,
) -> Result<Array2<T>, Singular> {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols());
    debug_assert_eq!(n, b.nrows());

    let mut a = a.to_owned();
    let mut x = b.to_owned();
    let (threshold, col_scale) = if T::EXACT {
        (0.0, None)
    } else {
        (tolerance, Some(equilibrate(&mut a, &mut x)))
    };

    for col in 0..n {
        let (pivot_row, score) = (col..n)
            .map(|row| (row, a[[row, col]].pivot_score()))
            .fold((col, f64::NEG_INFINITY), |best, candidate| {
                if candidate.1 > best.1 { candidate } else { best }
            });
        if score <= threshold || score.is_nan() {
            return Err(Singular { column: col });
        }

        if pivot_row != col {
            for j in 0..n {
                a.swap([col, j], [pivot_row, j]);
            }
            for j in 0..x.ncols() {
                x.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = a[[col, col]].clone();
        for j in col..n {
            a[[col, j]] = a[[col, j]].clone() / pivot.clone();
        }
        for j in 0..x.ncols() {
            x[[col, j]] = x[[col, j]].clone() / pivot.clone();
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]].clone();
            if factor.is_zero() {
                continue;
            }
            for j in col..n {
                let delta = factor.clone() * a[[col, j]].clone();
                a[[row, j]] -= delta;
            }
            for j in 0..x.ncols() {
                let delta = factor.clone() * x[[col, j]].clone();
                x[[row, j]] -= delta;
            }
        }
    }

    if let Some(col_scale) = col_scale {
        for (i, scale) in col_scale.into_iter().enumerate() {
            let scale = T::from_f64(scale);
            for j in 0..x.ncols() {
                x[[i, j]] = x[[i, j]].clone() * scale.clone();
            }
        }
    }
    Ok(x)
}

fn peak<'a, T: Scalar + 'a>(values: impl Iterator<Item = &'a T>) -> Option<f64> {
    let max = values.map(Scalar::pivot_score).fold(0.0, f64::max);
    (max > 0.0 && max.is_finite()).then_some(max)
}

/// Scale the rows of `a` (and `b` with them), then the columns of `a`, so
/// each peaks at 1. Returns the column factors, which map the solution of
/// the scaled system back onto the original unknowns. Zero rows and columns
/// are left alone for the pivot search to report.
fn equilibrate<T: Scalar>(a: &mut Array2<T>, b: &mut Array2<T>) -> Vec<f64> {
    for i in 0..a.nrows() {
        let Some(max) = peak(a.row(i).iter()) else {
            continue;
        };
        let scale = T::from_f64(max.recip());
        for j in 0..a.ncols() {
            a[[i, j]] = a[[i, j]].clone() * scale.clone();
        }
        for j in 0..b.ncols() {
            b[[i, j]] = b[[i, j]].clone() * scale.clone();
        }
    }

    (0..a.ncols())
        .map(|j| {
            let Some(max) = peak(a.column(j).iter()) else {
                return 1.0;
            };
            let scale = max.recip();
            for i in 0..a.nrows() {
                a[[i, j]] = a[[i, j]].clone() * T::from_f64(scale);
            }
            scale
        })
        .collect()
}

/// Matrix product `a · b`.
pub fn matmul<T: Scalar>(a: ArrayView2<'_, T>, b: ArrayView2<'_, T>) -> Array2<T> {
    debug_assert_eq!(a.ncols(), b.nrows());
    let mut out = Array2::zeros((a.nrows(), b.ncols()));
    for i in 0..a.nrows() {
        for k in 0..a.ncols() {
            let aik = &a[[i, k]];
            if aik.is_zero() {
                continue;
            }
            for j in 0..b.ncols() {
                if b[[k, j]].is_zero() {
                    continue;
                }
                out[[i, j]] += aik.clone() * b[[k, j]].clone();
            }
        }
    }
    out
}

/// The submatrix at the given rows and columns.
pub fn select<T: Clone>(m: ArrayView2<'_, T>, rows: &[usize], cols: &[usize]) -> Array2<T> {
    Array2::from_shape_fn((rows.len(), cols.len()), |(i, j)| m[[rows[i], cols[j]]].clone())
}

/// Blocks with equal row counts placed side by side.
pub fn hstack<T: Clone>(blocks: &[ArrayView2<'_, T>]) -> Array2<T> {
    let rows = blocks.first().map_or(0, |b| b.nrows());
    debug_assert!(blocks.iter().all(|b| b.nrows() == rows));
    let offsets: Vec<(usize, usize)> = blocks
        .iter()
        .enumerate()
        .flat_map(|(block, b)| (0..b.ncols()).map(move |col| (block, col)))
        .collect();
    Array2::from_shape_fn((rows, offsets.len()), |(i, j)| {
        let (block, col) = offsets[j];
        blocks[block][[i, col]].clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::Expr;
    use ndarray::array;
    use num_traits::{One, Zero};

    #[test]
    fn solves_with_row_exchange() {
        let a = array![[0.0, 2.0], [1.0, 1.0]];
        let b = array![[4.0], [3.0]];
        let x = solve(a.view(), b.view(), 1e-12).unwrap();
        assert!((x[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((x[[1, 0]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn detects_singular_numeric_matrix() {
        let a = array![[1.0, 1.0, 1.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let b = Array2::<f64>::zeros((3, 1));
        assert_eq!(solve(a.view(), b.view(), 1e-12), Err(Singular { column: 2 }));
    }

    #[test]
    fn empty_system_returns_rhs() {
        let a = Array2::<f64>::zeros((0, 0));
        let b = Array2::<f64>::zeros((0, 3));
        assert_eq!(solve(a.view(), b.view(), 1e-12).unwrap().dim(), (0, 3));
    }

    #[test]
    fn mixed_scale_system_is_not_singular() {
        let a = array![[1e-15, 1e-15], [1.0, 1e6]];
        let b = array![[3e-15], [2e6 + 1.0]];
        let x = solve(a.view(), b.view(), 1e-12).unwrap();
        assert!((x[[0, 0]] - 1.0).abs() < 1e-9, "{x}");
        assert!((x[[1, 0]] - 2.0).abs() < 1e-9, "{x}");
    }

    #[test]
    fn near_singular_after_scaling_is_rejected() {
        let a = array![[1e-15, 2e-15], [1e6, 2e6 + 1e-12]];
        let b = Array2::<f64>::zeros((2, 1));
        assert_eq!(solve(a.view(), b.view(), 1e-12), Err(Singular { column: 1 }));
    }

    #[test]
    fn solves_symbolic_system() {
        let r = Expr::symbol("R");
        let g = r.recip();
        let a = array![[g.clone(), Expr::one()], [Expr::one(), Expr::zero()]];
        let b = array![[Expr::zero()], [Expr::symbol("V")]];
        let x = solve(a.view(), b.view(), 0.0).unwrap();
        assert_eq!(x[[0, 0]].to_string(), "V");
        assert_eq!(x[[1, 0]].to_string(), "-V/R");
    }

    #[test]
    fn hstack_joins_columns() {
        let a = array![[1.0], [2.0]];
        let b = array![[3.0, 4.0], [5.0, 6.0]];
        let empty = Array2::<f64>::zeros((2, 0));
        assert_eq!(
            hstack(&[a.view(), empty.view(), b.view()]),
            array![[1.0, 3.0, 4.0], [2.0, 5.0, 6.0]]
        );
    }

    #[test]
    fn matmul_matches_hand_product() {
        let a = array![[1.0, 2.0], [0.0, 1.0]];
        let b = array![[3.0], [4.0]];
        assert_eq!(matmul(a.view(), b.view()), array![[11.0], [4.0]]);
    }
}
