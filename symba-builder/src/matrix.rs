//! Symbolic matrices over the node algebra.
//!
//! A [`Matrix`] is a row-major grid of expression nodes. Inverse and
//! determinant use recursive cofactor expansion, built from the same smart
//! constructors as everything else, so a matrix of constants folds as it is
//! combined and a symbolic matrix yields symbolic entries. Shape violations
//! are [`MatrixError`]s, never panics.

use crate::IntoTerm;
use symba_compute::expr::{self, Node};
use symba_compute::{Assignments, EvalError, Substitutions};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("new rows must match the matrix width {width}, got {got}")]
    RowWidth { width: usize, got: usize },
    #[error("element-wise operation on a {left_rows}x{left_cols} and a {right_rows}x{right_cols} matrix")]
    ShapeMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },
    #[error("number of columns {cols} should be {expected}")]
    InnerDimension { cols: usize, expected: usize },
    #[error("can only take the determinant of a square matrix, given {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
}

/// Starts a matrix from its first row.
pub fn matrix<T: IntoTerm, const N: usize>(row: [T; N]) -> Matrix {
    Matrix {
        width: N,
        exps: row.into_iter().map(IntoTerm::into_node).collect(),
    }
}

/// A row-major matrix of expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    width: usize,
    exps: Vec<Node>,
}

impl Matrix {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.exps.len() / self.width
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Node> {
        if col >= self.width {
            return None;
        }
        self.exps.get(row * self.width + col)
    }

    /// Appends a row, which must match the width.
    pub fn add_row<T: IntoTerm, const N: usize>(&self, row: [T; N]) -> Result<Matrix, MatrixError> {
        if N != self.width {
            return Err(MatrixError::RowWidth {
                width: self.width,
                got: N,
            });
        }
        let mut exps = self.exps.clone();
        exps.extend(row.into_iter().map(IntoTerm::into_node));
        Ok(Matrix {
            width: self.width,
            exps,
        })
    }

    fn zip_with(
        &self,
        other: &Matrix,
        f: impl Fn(Node, Node) -> Node,
    ) -> Result<Matrix, MatrixError> {
        if self.width != other.width || self.exps.len() != other.exps.len() {
            return Err(MatrixError::ShapeMismatch {
                left_rows: self.height(),
                left_cols: self.width,
                right_rows: other.height(),
                right_cols: other.width,
            });
        }
        let exps = self
            .exps
            .iter()
            .zip(&other.exps)
            .map(|(a, b)| f(a.clone(), b.clone()))
            .collect();
        Ok(Matrix {
            width: self.width,
            exps,
        })
    }

    pub fn plus(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, expr::add)
    }

    pub fn minus(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, expr::sub)
    }

    /// Element-wise `(a - b)²` error terms.
    pub fn eq(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip_with(other, expr::eq)
    }

    /// Multiplies every entry by a scalar term.
    pub fn scale(&self, t: impl IntoTerm) -> Matrix {
        let s = t.into_node();
        Matrix {
            width: self.width,
            exps: self
                .exps
                .iter()
                .map(|e| expr::mult(e.clone(), s.clone()))
                .collect(),
        }
    }

    /// Matrix product.
    pub fn times(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.width != other.height() {
            return Err(MatrixError::InnerDimension {
                cols: self.width,
                expected: other.height(),
            });
        }
        let mut exps = Vec::with_capacity(self.height() * other.width);
        for j in 0..self.height() {
            for i in 0..other.width {
                let mut acc = expr::zero();
                for k in 0..other.height() {
                    let a = &self.exps[j * self.width + k];
                    let b = &other.exps[k * other.width + i];
                    acc = expr::add(acc, expr::mult(a.clone(), b.clone()));
                }
                exps.push(acc);
            }
        }
        Ok(Matrix {
            width: other.width,
            exps,
        })
    }

    pub fn divided_by(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.times(&other.inverse()?)
    }

    /// The matrix with row `row` and column `col` deleted.
    fn minor(&self, col: usize, row: usize) -> Matrix {
        let mut exps = Vec::new();
        for (k, e) in self.exps.iter().enumerate() {
            let (r, c) = (k / self.width, k % self.width);
            if r != row && c != col {
                exps.push(e.clone());
            }
        }
        Matrix {
            width: self.width - 1,
            exps,
        }
    }

    /// Determinant by cofactor expansion along the first row.
    pub fn determinant(&self) -> Result<Node, MatrixError> {
        if self.exps.len() != self.width * self.width {
            return Err(MatrixError::NotSquare {
                rows: self.height(),
                cols: self.width,
            });
        }
        if self.exps.len() == 1 {
            return Ok(self.exps[0].clone());
        }
        let mut sum = expr::zero();
        for i in 0..self.width {
            let mut cofactor = self.minor(i, 0).determinant()?;
            if i % 2 == 1 {
                cofactor = expr::mult(cofactor, expr::neg_one());
            }
            sum = expr::add(sum, expr::mult(self.exps[i].clone(), cofactor));
        }
        Ok(sum)
    }

    /// Inverse via the adjugate: the transposed cofactor matrix over the
    /// determinant. A singular symbolic matrix yields entries that are
    /// indeterminate or divide by a symbolic zero, surfacing on evaluation.
    pub fn inverse(&self) -> Result<Matrix, MatrixError> {
        let det = self.determinant()?;
        let mut exps = Vec::with_capacity(self.exps.len());
        for k in 0..self.exps.len() {
            let (j, i) = (k / self.width, k % self.width);
            // minor with the transposed indices gives the adjugate directly
            let mut cofactor = self.minor(j, i).determinant()?;
            if (i + j) % 2 == 1 {
                cofactor = expr::mult(cofactor, expr::neg_one());
            }
            exps.push(cofactor);
        }
        let scale = expr::div(expr::one(), det);
        Ok(Matrix {
            width: self.width,
            exps: exps
                .into_iter()
                .map(|e| expr::mult(scale.clone(), e))
                .collect(),
        })
    }

    pub fn apply(&self, subs: &Substitutions) -> Matrix {
        Matrix {
            width: self.width,
            exps: self.exps.iter().map(|e| e.apply(subs)).collect(),
        }
    }

    /// Evaluates every entry, row by row.
    pub fn eval(&self, assign: &Assignments) -> Result<Vec<Vec<f64>>, EvalError> {
        self.exps
            .chunks(self.width)
            .map(|row| row.iter().map(|e| e.eval(assign)).collect())
            .collect()
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (k, e) in self.exps.iter().enumerate() {
            if k > 0 {
                write!(f, "{}", if k % self.width == 0 { "; " } else { ", " })?;
            }
            write!(f, "{e}")?;
        }
        write!(f, "]")
    }
}
