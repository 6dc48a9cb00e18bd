//! Dense vector and matrix algebra.
//!
//! [`Vector`] wraps one contiguous `Vec<f64>`; [`Matrix`] is a single row-major buffer
//! with shape `(rows, cols)`. Row `r` is the slice `data[r * cols..(r + 1) * cols]`.
//!
//! The free functions are the checked API: each one validates its operands and
//! returns [`Error::InvalidShape`] naming the expected and actual dimensions. The
//! network's hot path uses the crate-private in-place kernels instead, which only
//! `debug_assert!` shapes that were validated once at the public boundary.

use std::ops::{Deref, DerefMut, Index, IndexMut};

use crate::matmul::gemm_f64;
use crate::{Error, Result};

/// Fixed-length sequence of reals.
///
/// The length is fixed at construction: `Vector` derefs to `[f64]`, so elements can be
/// read and written but the vector can never grow or shrink.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector(Vec<f64>);

impl Vector {
    #[inline]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[inline]
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Build a vector of `len` entries, each produced by one call to `fill`.
    pub fn filled(len: usize, mut fill: impl FnMut() -> f64) -> Self {
        Self((0..len).map(|_| fill()).collect())
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }

    #[inline]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    #[inline]
    pub(crate) fn fill_zero(&mut self) {
        self.0.fill(0.0);
    }

    /// `self += other`.
    #[inline]
    pub(crate) fn add_assign_unchecked(&mut self, other: &[f64]) {
        debug_assert_eq!(self.0.len(), other.len());
        for (a, b) in self.0.iter_mut().zip(other) {
            *a += b;
        }
    }

    /// `self -= scale * other`.
    #[inline]
    pub(crate) fn scaled_sub_assign_unchecked(&mut self, scale: f64, other: &[f64]) {
        debug_assert_eq!(self.0.len(), other.len());
        for (a, b) in self.0.iter_mut().zip(other) {
            *a = (-scale).mul_add(*b, *a);
        }
    }
}

impl Deref for Vector {
    type Target = [f64];

    #[inline]
    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl DerefMut for Vector {
    #[inline]
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut self.0
    }
}

impl From<Vec<f64>> for Vector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<&[f64]> for Vector {
    fn from(values: &[f64]) -> Self {
        Self(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Vector {
    fn from(values: [f64; N]) -> Self {
        Self(values.to_vec())
    }
}

impl From<Vector> for Vec<f64> {
    fn from(v: Vector) -> Self {
        v.0
    }
}

impl FromIterator<f64> for Vector {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Non-empty rectangular matrix stored row-major in one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        check_dims("Matrix::zeros", rows, cols)?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        })
    }

    /// Build a `rows x cols` matrix, filling entries row by row with `fill`.
    pub fn filled(rows: usize, cols: usize, mut fill: impl FnMut() -> f64) -> Result<Self> {
        check_dims("Matrix::filled", rows, cols)?;
        let data = (0..rows * cols).map(|_| fill()).collect();
        Ok(Self { rows, cols, data })
    }

    /// Build from a flat row-major buffer.
    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        check_dims("Matrix::from_flat", rows, cols)?;
        if data.len() != rows * cols {
            return Err(Error::InvalidShape(format!(
                "Matrix::from_flat: buffer length {} does not match rows * cols ({rows} * {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from per-row vectors. All rows must have the same, non-zero length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::InvalidShape(
                "Matrix::from_rows: matrix must have at least one row".to_owned(),
            ));
        };
        let cols = first.len();
        check_dims("Matrix::from_rows", rows.len(), cols)?;

        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidShape(format!(
                    "Matrix::from_rows: row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row `r` as a slice. Panics if `r >= rows`.
    #[inline]
    pub fn row(&self, r: usize) -> &[f64] {
        let start = r * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        let start = r * self.cols;
        &mut self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.cols)
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> Option<f64> {
        if r < self.rows && c < self.cols {
            Some(self.data[r * self.cols + c])
        } else {
            None
        }
    }

    /// Row-major view of all entries.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for r in 0..self.rows {
            for c in 0..self.cols {
                data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// `transpose(self) · v`, without materialising the transpose.
    ///
    /// Entry `c` of the result is column `c` of `self` dotted with `v`, so `v` must
    /// have one entry per row.
    pub fn transpose_times_vector(&self, v: &[f64]) -> Result<Vector> {
        if v.len() != self.rows {
            return Err(Error::InvalidShape(format!(
                "transpose_times_vector: vector len {} does not match matrix rows {} (matrix is {}x{})",
                v.len(),
                self.rows,
                self.rows,
                self.cols
            )));
        }
        let mut out = Vector::zeros(self.cols);
        self.transpose_mul_vec_into(v, &mut out);
        Ok(out)
    }

    /// `out[r] = row(r) · v`.
    #[inline]
    pub(crate) fn mul_vec_into(&self, v: &[f64], out: &mut [f64]) {
        debug_assert_eq!(v.len(), self.cols);
        debug_assert_eq!(out.len(), self.rows);
        for (o, row) in out.iter_mut().zip(self.iter_rows()) {
            let mut sum = 0.0;
            for (w, x) in row.iter().zip(v) {
                sum = w.mul_add(*x, sum);
            }
            *o = sum;
        }
    }

    /// `out = transpose(self) · v`.
    #[inline]
    pub(crate) fn transpose_mul_vec_into(&self, v: &[f64], out: &mut [f64]) {
        debug_assert_eq!(v.len(), self.rows);
        debug_assert_eq!(out.len(), self.cols);
        out.fill(0.0);
        for (row, &d) in self.iter_rows().zip(v) {
            for (o, w) in out.iter_mut().zip(row) {
                *o = w.mul_add(d, *o);
            }
        }
    }

    /// Overwrite `self` with the outer product `v wᵀ`.
    #[inline]
    pub(crate) fn set_outer_unchecked(&mut self, v: &[f64], w: &[f64]) {
        debug_assert_eq!(v.len(), self.rows);
        debug_assert_eq!(w.len(), self.cols);
        for (r, &vr) in v.iter().enumerate() {
            let row = self.row_mut(r);
            for (dst, &wc) in row.iter_mut().zip(w) {
                *dst = vr * wc;
            }
        }
    }

    #[inline]
    pub(crate) fn fill_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// `self += other`.
    #[inline]
    pub(crate) fn add_assign_unchecked(&mut self, other: &Matrix) {
        debug_assert_eq!(self.shape(), other.shape());
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }

    /// `self -= scale * other`.
    #[inline]
    pub(crate) fn scaled_sub_assign_unchecked(&mut self, scale: f64, other: &Matrix) {
        debug_assert_eq!(self.shape(), other.shape());
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a = (-scale).mul_add(*b, *a);
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        assert!(c < self.cols, "column {c} out of range for {} columns", self.cols);
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        assert!(c < self.cols, "column {c} out of range for {} columns", self.cols);
        &mut self.data[r * self.cols + c]
    }
}

fn check_dims(op: &str, rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidShape(format!(
            "{op}: matrix must be non-empty, got {rows}x{cols}"
        )));
    }
    rows.checked_mul(cols)
        .ok_or_else(|| Error::InvalidShape(format!("{op}: {rows}x{cols} overflows")))?;
    Ok(())
}

fn check_same_len(op: &str, v: &[f64], w: &[f64]) -> Result<()> {
    if v.len() != w.len() {
        return Err(Error::InvalidShape(format!(
            "{op}: vector lengths differ ({} vs {})",
            v.len(),
            w.len()
        )));
    }
    Ok(())
}

fn check_same_shape(op: &str, a: &Matrix, b: &Matrix) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::InvalidShape(format!(
            "{op}: matrix shapes differ ({}x{} vs {}x{})",
            a.rows, a.cols, b.rows, b.cols
        )));
    }
    Ok(())
}

/// New vector of `len` entries produced by `fill`. Use [`Vector::zeros`] for the
/// zero-filled default.
pub fn new_vector(len: usize, fill: impl FnMut() -> f64) -> Vector {
    Vector::filled(len, fill)
}

/// New `rows x cols` matrix produced by `fill`. Use [`Matrix::zeros`] for the
/// zero-filled default.
pub fn new_matrix(rows: usize, cols: usize, fill: impl FnMut() -> f64) -> Result<Matrix> {
    Matrix::filled(rows, cols, fill)
}

/// True when every entry is a finite real number.
pub fn is_vector(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// True when `rows` is non-empty, rectangular with non-zero width, and every row
/// satisfies [`is_vector`].
pub fn is_matrix(rows: &[Vec<f64>]) -> bool {
    let Some(first) = rows.first() else {
        return false;
    };
    let cols = first.len();
    cols > 0 && rows.iter().all(|r| r.len() == cols && is_vector(r))
}

pub fn vector_add(v: &[f64], w: &[f64]) -> Result<Vector> {
    check_same_len("vector_add", v, w)?;
    Ok(v.iter().zip(w).map(|(a, b)| a + b).collect())
}

pub fn vector_subtract(v: &[f64], w: &[f64]) -> Result<Vector> {
    check_same_len("vector_subtract", v, w)?;
    Ok(v.iter().zip(w).map(|(a, b)| a - b).collect())
}

pub fn scalar_times_vector(s: f64, v: &[f64]) -> Vector {
    v.iter().map(|x| s * x).collect()
}

/// Element-wise product. Not a reduction; see [`dot_product`].
pub fn hadamard(v: &[f64], w: &[f64]) -> Result<Vector> {
    check_same_len("hadamard", v, w)?;
    Ok(v.iter().zip(w).map(|(a, b)| a * b).collect())
}

/// `sum(hadamard(v, w))`.
pub fn dot_product(v: &[f64], w: &[f64]) -> Result<f64> {
    check_same_len("dot_product", v, w)?;
    Ok(v.iter().zip(w).map(|(a, b)| a * b).sum())
}

/// Each row of `m` dotted with `v`, i.e. `m · v`.
///
/// With the rows of `m` being the neurons of a layer and `v` the previous layer's
/// activation, this is the layer's weighted sum. The result has one entry per row.
pub fn vector_times_matrix(v: &[f64], m: &Matrix) -> Result<Vector> {
    if v.len() != m.cols {
        return Err(Error::InvalidShape(format!(
            "vector_times_matrix: vector len {} does not match matrix row length {} (matrix is {}x{})",
            v.len(),
            m.cols,
            m.rows,
            m.cols
        )));
    }
    let mut out = Vector::zeros(m.rows);
    m.mul_vec_into(v, &mut out);
    Ok(out)
}

pub fn matrix_add(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    check_same_shape("matrix_add", a, b)?;
    let mut out = a.clone();
    out.add_assign_unchecked(b);
    Ok(out)
}

pub fn matrix_subtract(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    check_same_shape("matrix_subtract", a, b)?;
    let mut out = a.clone();
    out.scaled_sub_assign_unchecked(1.0, b);
    Ok(out)
}

pub fn scalar_times_matrix(s: f64, m: &Matrix) -> Matrix {
    Matrix {
        rows: m.rows,
        cols: m.cols,
        data: m.data.iter().map(|x| s * x).collect(),
    }
}

/// Standard product `a · b`; requires `a.cols() == b.rows()`.
pub fn matrix_times_matrix(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.cols != b.rows {
        return Err(Error::InvalidShape(format!(
            "matrix_times_matrix: left has {} columns but right has {} rows ({}x{} · {}x{})",
            a.cols, b.rows, a.rows, a.cols, b.rows, b.cols
        )));
    }
    let mut out = Matrix::zeros(a.rows, b.cols)?;
    gemm_f64(
        a.rows,
        b.cols,
        a.cols,
        1.0,
        &a.data,
        a.cols,
        1,
        &b.data,
        b.cols,
        1,
        0.0,
        &mut out.data,
        b.cols,
        1,
    );
    Ok(out)
}

/// Outer product `v wᵀ`: entry `(r, c)` is `v[r] * w[c]`.
pub fn outer_product(v: &[f64], w: &[f64]) -> Result<Matrix> {
    let mut out = Matrix::zeros(v.len(), w.len())
        .map_err(|e| Error::InvalidShape(format!("outer_product: {e}")))?;
    out.set_outer_unchecked(v, w);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> Matrix {
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn constructors_fill_in_row_order() {
        let mut k = 0.0;
        let mat = new_matrix(2, 3, || {
            k += 1.0;
            k
        })
        .unwrap();
        assert_eq!(mat.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(mat.row(1), &[4.0, 5.0, 6.0]);

        let v = new_vector(3, || 2.5);
        assert_eq!(v.as_slice(), &[2.5, 2.5, 2.5]);
        assert_eq!(Vector::zeros(2).as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn empty_matrices_are_rejected() {
        assert!(matches!(Matrix::zeros(0, 3), Err(Error::InvalidShape(_))));
        assert!(matches!(Matrix::zeros(3, 0), Err(Error::InvalidShape(_))));
        assert!(Matrix::from_rows(&[]).is_err());
        assert!(Matrix::from_flat(2, 2, vec![1.0; 3]).is_err());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(format!("{err}").contains("row 1"));
    }

    #[test]
    fn predicates() {
        assert!(is_vector(&[1.0, -2.0]));
        assert!(is_vector(&[]));
        assert!(!is_vector(&[1.0, f64::NAN]));

        assert!(is_matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]]));
        assert!(!is_matrix(&[]));
        assert!(!is_matrix(&[vec![]]));
        assert!(!is_matrix(&[vec![1.0, 2.0], vec![3.0]]));
        assert!(!is_matrix(&[vec![f64::INFINITY]]));
    }

    #[test]
    fn vector_ops() {
        let v = [1.0, 2.0, 3.0];
        let w = [4.0, 5.0, 6.0];
        assert_eq!(vector_add(&v, &w).unwrap().as_slice(), &[5.0, 7.0, 9.0]);
        assert_eq!(vector_subtract(&w, &v).unwrap().as_slice(), &[3.0, 3.0, 3.0]);
        assert_eq!(scalar_times_vector(2.0, &v).as_slice(), &[2.0, 4.0, 6.0]);
        assert_eq!(hadamard(&v, &w).unwrap().as_slice(), &[4.0, 10.0, 18.0]);
        assert_eq!(dot_product(&v, &w).unwrap(), 32.0);
    }

    #[test]
    fn vector_ops_reject_length_mismatch() {
        let v = [1.0, 2.0];
        let w = [1.0, 2.0, 3.0];
        let err = vector_add(&v, &w).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidShape("vector_add: vector lengths differ (2 vs 3)".to_owned())
        );
        assert!(vector_subtract(&v, &w).is_err());
        assert!(hadamard(&v, &w).is_err());
        assert!(dot_product(&v, &w).is_err());
    }

    #[test]
    fn vector_times_matrix_dots_each_row() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        let out = vector_times_matrix(&[1.0, -1.0], &a).unwrap();
        assert_eq!(out.as_slice(), &[-1.0, -1.0, -1.0]);

        assert!(vector_times_matrix(&[1.0, 2.0, 3.0], &a).is_err());
    }

    #[test]
    fn transpose_times_vector_uses_columns() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        let out = a.transpose_times_vector(&[1.0, 0.0, 2.0]).unwrap();
        assert_eq!(out.as_slice(), &[11.0, 14.0]);

        let explicit = vector_times_matrix(&[1.0, 0.0, 2.0], &a.transpose()).unwrap();
        assert_eq!(out, explicit);
        assert!(a.transpose_times_vector(&[1.0, 0.0]).is_err());
    }

    #[test]
    fn matrix_elementwise_ops() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = m(&[&[0.5, 0.5], &[1.0, 1.0]]);
        assert_eq!(matrix_add(&a, &b).unwrap(), m(&[&[1.5, 2.5], &[4.0, 5.0]]));
        assert_eq!(matrix_subtract(&a, &b).unwrap(), m(&[&[0.5, 1.5], &[2.0, 3.0]]));
        assert_eq!(scalar_times_matrix(2.0, &a), m(&[&[2.0, 4.0], &[6.0, 8.0]]));

        let c = m(&[&[1.0, 2.0, 3.0]]);
        assert!(matrix_add(&a, &c).is_err());
        assert!(matrix_subtract(&a, &c).is_err());
    }

    #[test]
    fn matrix_product_shapes() {
        let a = m(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let b = m(&[&[7.0, 8.0], &[9.0, 10.0], &[11.0, 12.0]]);
        let ab = matrix_times_matrix(&a, &b).unwrap();
        assert_eq!(ab.shape(), (2, 2));
        assert_eq!(ab, m(&[&[58.0, 64.0], &[139.0, 154.0]]));

        let ba = matrix_times_matrix(&b, &a).unwrap();
        assert_eq!(ba.shape(), (3, 3));

        let err = matrix_times_matrix(&a, &a).unwrap_err();
        assert!(format!("{err}").contains("3 columns but right has 2 rows"));
    }

    #[test]
    fn outer_product_orientation() {
        let o = outer_product(&[1.0, 2.0], &[3.0, 4.0, 5.0]).unwrap();
        assert_eq!(o.shape(), (2, 3));
        assert_eq!(o.row(1), &[6.0, 8.0, 10.0]);
        assert!(outer_product(&[], &[1.0]).is_err());
    }

    #[test]
    fn indexing_and_rows() {
        let mut a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        assert_eq!(a[(1, 0)], 3.0);
        a[(1, 0)] = 7.0;
        assert_eq!(a.get(1, 0), Some(7.0));
        assert_eq!(a.get(2, 0), None);
        assert_eq!(a.to_rows(), vec![vec![1.0, 2.0], vec![7.0, 4.0]]);
    }
}
