use std::fmt;

use rug::Rational;

use crate::error::{CalcError, CalcResult};
use crate::numeric::atom::NumericAtom;
use crate::numeric::ops::{self, BinOp};

/// A dense row-major matrix of numeric atoms, entered as a bracketed
/// literal (`[[1 2][3 4]]`).
#[derive(Clone, Debug)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<NumericAtom>,
}

impl Matrix {
    pub fn from_rows(rows: Vec<Vec<NumericAtom>>) -> CalcResult<Matrix> {
        let nrows = rows.len();
        if nrows == 0 {
            return Err(CalcError::Domain("matrix must have at least one row".into()));
        }
        let ncols = rows[0].len();
        if ncols == 0 || rows.iter().any(|r| r.len() != ncols) {
            return Err(CalcError::Domain("matrix rows must all be the same non-zero length".into()));
        }
        let values = rows.into_iter().flatten().collect();
        Ok(Matrix { rows: nrows, cols: ncols, values })
    }

    fn get(&self, r: usize, c: usize) -> &NumericAtom {
        &self.values[r * self.cols + c]
    }

    pub fn same_shape(&self, other: &Matrix) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// Elementwise op against another matrix of identical shape.
    pub fn elementwise(&self, op: BinOp, other: &Matrix, prec_bits: u32) -> CalcResult<Matrix> {
        if !self.same_shape(other) {
            return Err(CalcError::Domain(format!(
                "matrix shape mismatch: {}x{} vs {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut values = Vec::with_capacity(self.values.len());
        for (a, b) in self.values.iter().zip(other.values.iter()) {
            values.push(ops::binary_op(op, a, b, prec_bits)?);
        }
        Ok(Matrix { rows: self.rows, cols: self.cols, values })
    }

    /// Broadcast a scalar across every entry.
    pub fn broadcast(&self, op: BinOp, scalar: &NumericAtom, prec_bits: u32) -> CalcResult<Matrix> {
        let mut values = Vec::with_capacity(self.values.len());
        for a in &self.values {
            values.push(ops::binary_op(op, a, scalar, prec_bits)?);
        }
        Ok(Matrix { rows: self.rows, cols: self.cols, values })
    }

    /// Standard matrix multiplication; `self.cols` must equal `other.rows`.
    pub fn matmul(&self, other: &Matrix, prec_bits: u32) -> CalcResult<Matrix> {
        if self.cols != other.rows {
            return Err(CalcError::Domain(format!(
                "cannot multiply a {}x{} matrix by a {}x{} matrix",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut values = Vec::with_capacity(self.rows * other.cols);
        for r in 0..self.rows {
            for c in 0..other.cols {
                let mut acc = NumericAtom::zero_int();
                for k in 0..self.cols {
                    let term = ops::binary_op(BinOp::Mul, self.get(r, k), other.get(k, c), prec_bits)?;
                    acc = ops::binary_op(BinOp::Add, &acc, &term, prec_bits)?;
                }
                values.push(acc);
            }
        }
        Ok(Matrix { rows: self.rows, cols: other.cols, values })
    }

    /// Determinant via cofactor expansion along the first row; `Domain`
    /// if the matrix isn't square.
    pub fn determinant(&self, prec_bits: u32) -> CalcResult<NumericAtom> {
        if self.rows != self.cols {
            return Err(CalcError::Domain("determinant requires a square matrix".into()));
        }
        self.det_recursive(&(0..self.rows).collect::<Vec<_>>(), &(0..self.cols).collect::<Vec<_>>(), prec_bits)
    }

    fn det_recursive(&self, rows: &[usize], cols: &[usize], prec_bits: u32) -> CalcResult<NumericAtom> {
        if rows.len() == 1 {
            return Ok(self.get(rows[0], cols[0]).clone());
        }
        let mut total = NumericAtom::zero_int();
        let sub_rows = &rows[1..];
        for (i, &c) in cols.iter().enumerate() {
            let mut sub_cols: Vec<usize> = cols.to_vec();
            sub_cols.remove(i);
            let minor = self.det_recursive(sub_rows, &sub_cols, prec_bits)?;
            let term = ops::binary_op(BinOp::Mul, self.get(rows[0], c), &minor, prec_bits)?;
            total = if i % 2 == 0 {
                ops::binary_op(BinOp::Add, &total, &term, prec_bits)?
            } else {
                ops::binary_op(BinOp::Sub, &total, &term, prec_bits)?
            };
        }
        Ok(total)
    }

    /// Matrix inverse via Gauss-Jordan elimination over `Rational`
    /// arithmetic; `Domain` if singular or non-square.
    pub fn inverse(&self, prec_bits: u32) -> CalcResult<Matrix> {
        if self.rows != self.cols {
            return Err(CalcError::Domain("inverse requires a square matrix".into()));
        }
        let n = self.rows;
        let mut left: Vec<Rational> = self
            .values
            .iter()
            .map(|a| to_rational(a))
            .collect::<CalcResult<Vec<_>>>()?;
        let mut right: Vec<Rational> = (0..n * n)
            .map(|i| if i / n == i % n { Rational::from(1) } else { Rational::from(0) })
            .collect();

        for pivot in 0..n {
            let pivot_row = (pivot..n).find(|&r| left[r * n + pivot] != 0).ok_or_else(|| {
                CalcError::Domain("matrix is singular".into())
            })?;
            if pivot_row != pivot {
                for c in 0..n {
                    left.swap(pivot * n + c, pivot_row * n + c);
                    right.swap(pivot * n + c, pivot_row * n + c);
                }
            }
            let scale = left[pivot * n + pivot].clone();
            for c in 0..n {
                left[pivot * n + c] = left[pivot * n + c].clone() / scale.clone();
                right[pivot * n + c] = right[pivot * n + c].clone() / scale.clone();
            }
            for r in 0..n {
                if r == pivot {
                    continue;
                }
                let factor = left[r * n + pivot].clone();
                if factor == 0 {
                    continue;
                }
                for c in 0..n {
                    let l = left[pivot * n + c].clone();
                    let rr = right[pivot * n + c].clone();
                    left[r * n + c] -= factor.clone() * l;
                    right[r * n + c] -= factor.clone() * rr;
                }
            }
        }

        let values = right.into_iter().map(|r| NumericAtom::Rat(r).reduce()).collect();
        Ok(Matrix { rows: n, cols: n, values })
    }
}

fn to_rational(a: &NumericAtom) -> CalcResult<Rational> {
    match a {
        NumericAtom::Int(i) => Ok(Rational::from(i.clone())),
        NumericAtom::Rat(r) => Ok(r.clone()),
        NumericAtom::Flt(f) => NumericAtom::float_to_rational(f, 30),
        _ => Err(CalcError::Domain("matrix inversion requires real-valued entries".into())),
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            write!(f, "[")?;
            for c in 0..self.cols {
                write!(f, "{}", self.get(r, c))?;
                if c + 1 < self.cols {
                    write!(f, " ")?;
                }
            }
            write!(f, "]")?;
        }
        write!(f, "]")?;
        Ok(())
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.values == other.values
    }
}
