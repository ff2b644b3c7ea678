use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub};

use crate::{Aabb, Ray, Vec3};

/// Row and column count of [`Matrix4`].
pub const MATRIX_DIM: usize = 4;

/// Comparison tolerance for row reduction. Loose enough to absorb the
/// rounding accumulated across a full elimination; values this close are
/// treated as equal when pivoting and when checking the reduced form
/// against the identity.
const MATRIX_EPSILON: f64 = 1e-9;

/// Equality within [`MATRIX_EPSILON`], absolute near zero and relative
/// elsewhere.
fn nearly_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    if diff <= MATRIX_EPSILON {
        return true;
    }
    let largest = a.abs().max(b.abs());
    diff <= largest * MATRIX_EPSILON
}

/// A single row of a 4x4 matrix.
///
/// Indexing outside `[0, 4)` panics. Arithmetic snaps results within
/// [`MATRIX_EPSILON`] of an integer onto that integer, which keeps the
/// reduced form of an invertible matrix comparable against the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatrixRow([f64; MATRIX_DIM]);

impl MatrixRow {
    /// Create a row from its four column values.
    pub fn new(c0: f64, c1: f64, c2: f64, c3: f64) -> Self {
        Self([c0, c1, c2, c3])
    }

    /// Returns the column of the first nonzero value in the row, or `None`
    /// if the entire row is zero.
    pub fn first_nonzero(&self) -> Option<usize> {
        self.0.iter().position(|&c| !nearly_equal(c, 0.0))
    }

    /// Returns true if every column matches `other` within epsilon.
    pub fn approx_eq(&self, other: &MatrixRow) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(&a, &b)| nearly_equal(a, b))
    }

    fn snap_to_ints(&mut self) {
        for col in &mut self.0 {
            let closest = col.round();
            if (closest - *col).abs() <= MATRIX_EPSILON {
                *col = closest;
            }
        }
    }
}

impl Index<usize> for MatrixRow {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl IndexMut<usize> for MatrixRow {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.0[index]
    }
}

impl Add for MatrixRow {
    type Output = MatrixRow;

    fn add(self, other: MatrixRow) -> MatrixRow {
        let mut result = MatrixRow::default();
        for i in 0..MATRIX_DIM {
            result.0[i] = self.0[i] + other.0[i];
        }
        result.snap_to_ints();
        result
    }
}

impl AddAssign for MatrixRow {
    fn add_assign(&mut self, other: MatrixRow) {
        *self = *self + other;
    }
}

impl Sub for MatrixRow {
    type Output = MatrixRow;

    fn sub(self, other: MatrixRow) -> MatrixRow {
        let mut result = MatrixRow::default();
        for i in 0..MATRIX_DIM {
            result.0[i] = self.0[i] - other.0[i];
        }
        result.snap_to_ints();
        result
    }
}

impl Neg for MatrixRow {
    type Output = MatrixRow;

    fn neg(self) -> MatrixRow {
        let mut result = self;
        for c in &mut result.0 {
            *c = -*c;
        }
        result
    }
}

impl Mul<f64> for MatrixRow {
    type Output = MatrixRow;

    fn mul(self, c: f64) -> MatrixRow {
        let mut result = self;
        for col in &mut result.0 {
            *col *= c;
        }
        result.snap_to_ints();
        result
    }
}

impl MulAssign<f64> for MatrixRow {
    fn mul_assign(&mut self, c: f64) {
        *self = *self * c;
    }
}

impl Div<f64> for MatrixRow {
    type Output = MatrixRow;

    fn div(self, c: f64) -> MatrixRow {
        let mut result = self;
        for col in &mut result.0 {
            *col /= c;
        }
        result.snap_to_ints();
        result
    }
}

/// An elementary row operation on a [`Matrix4`].
///
/// Row reduction records the operations it applies; replaying the sequence
/// against the identity produces the inverse, and the swap/scale entries
/// carry the determinant's sign and scale bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOp {
    /// Swap rows `a` and `b`.
    Swap { a: usize, b: usize },
    /// Multiply `row` by `factor`.
    Scale { row: usize, factor: f64 },
    /// Add `factor * src` to `dest`.
    AddScaled { dest: usize, src: usize, factor: f64 },
}

fn push_op(ops: &mut Option<&mut Vec<RowOp>>, op: RowOp) {
    if let Some(list) = ops.as_deref_mut() {
        list.push(op);
    }
}

/// A 4x4 matrix of f64, inverted by Gauss-Jordan elimination.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Matrix4([MatrixRow; MATRIX_DIM]);

impl Matrix4 {
    /// The identity matrix.
    pub fn identity() -> Self {
        let mut m = Self::default();
        for i in 0..MATRIX_DIM {
            m.0[i][i] = 1.0;
        }
        m
    }

    /// A translation by (x, y, z).
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        let mut m = Self::identity();
        m.0[0][3] = x;
        m.0[1][3] = y;
        m.0[2][3] = z;
        m
    }

    /// A rotation about the x axis, in radians.
    pub fn rotation_x(angle: f64) -> Self {
        let mut m = Self::identity();
        m.0[1][1] = angle.cos();
        m.0[1][2] = -angle.sin();
        m.0[2][1] = angle.sin();
        m.0[2][2] = angle.cos();
        m
    }

    /// A rotation about the y axis, in radians.
    pub fn rotation_y(angle: f64) -> Self {
        let mut m = Self::identity();
        m.0[0][0] = angle.cos();
        m.0[0][2] = angle.sin();
        m.0[2][0] = -angle.sin();
        m.0[2][2] = angle.cos();
        m
    }

    /// A rotation about the z axis, in radians.
    pub fn rotation_z(angle: f64) -> Self {
        let mut m = Self::identity();
        m.0[0][0] = angle.cos();
        m.0[0][1] = -angle.sin();
        m.0[1][0] = angle.sin();
        m.0[1][1] = angle.cos();
        m
    }

    /// A rotation about x, then y, then z, in radians.
    pub fn rotation(x: f64, y: f64, z: f64) -> Self {
        Self::rotation_z(z) * Self::rotation_y(y) * Self::rotation_x(x)
    }

    /// A scale by (x, y, z).
    pub fn scale(x: f64, y: f64, z: f64) -> Self {
        let mut m = Self::identity();
        m.0[0][0] = x;
        m.0[1][1] = y;
        m.0[2][2] = z;
        m
    }

    /// The transpose of the matrix.
    pub fn transpose(&self) -> Self {
        let mut result = Self::default();
        for i in 0..MATRIX_DIM {
            for j in 0..MATRIX_DIM {
                result.0[i][j] = self.0[j][i];
            }
        }
        result
    }

    /// Returns true if every element matches `other` within epsilon.
    pub fn approx_eq(&self, other: &Matrix4) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| a.approx_eq(b))
    }

    /// The determinant, computed from the echelon form.
    ///
    /// Reduce to upper triangular form while recording the operations
    /// applied; swaps flip the sign and scales rescale, so the determinant
    /// is the diagonal product corrected by those bookkeeping entries.
    pub fn determinant(&self) -> f64 {
        let mut reduced = *self;
        let mut ops = Vec::new();
        reduced.row_reduce(false, Some(&mut ops));

        let mut scalar = 1.0;
        for op in &ops {
            match op {
                RowOp::Swap { .. } => scalar *= -1.0,
                RowOp::Scale { factor, .. } => scalar /= factor,
                RowOp::AddScaled { .. } => {}
            }
        }

        let mut det = 1.0;
        for i in 0..MATRIX_DIM {
            det *= reduced.0[i][i];
        }
        scalar * det
    }

    /// The inverse, or `None` if the matrix is singular.
    ///
    /// Reduces a copy to reduced echelon form while recording the row
    /// operations. An invertible matrix reduces to the identity; replaying
    /// the recorded operations against the identity yields the inverse.
    pub fn inverse(&self) -> Option<Matrix4> {
        let mut reduced = *self;
        let mut ops = Vec::new();
        reduced.row_reduce(true, Some(&mut ops));

        if !reduced.approx_eq(&Matrix4::identity()) {
            return None;
        }

        let mut result = Matrix4::identity();
        for op in ops {
            result.apply_op(op);
        }
        Some(result)
    }

    /// Row reduce in place. With `reduced` false the matrix is left in
    /// echelon form; with `reduced` true, in reduced echelon form. Every
    /// operation applied is appended to `ops` when one is supplied.
    pub fn row_reduce(&mut self, reduced: bool, mut ops: Option<&mut Vec<RowOp>>) {
        for top_row in 0..MATRIX_DIM {
            // Leftmost column with a nonzero entry at or below top_row is
            // the pivot column. None left means the rest is all zero.
            let pivot_col = match (0..MATRIX_DIM).find(|&col| !self.is_column_zero(col, top_row)) {
                Some(col) => col,
                None => break,
            };

            // Partial pivoting: bring the largest-magnitude entry to the top.
            let mut pivot_row = top_row;
            for row in top_row..MATRIX_DIM {
                if self.0[row][pivot_col].abs() > self.0[pivot_row][pivot_col].abs() {
                    pivot_row = row;
                }
            }
            if pivot_row != top_row {
                let op = RowOp::Swap {
                    a: pivot_row,
                    b: top_row,
                };
                self.apply_op(op);
                push_op(&mut ops, op);
            }

            // Zero out the pivot column below the pivot.
            for row in top_row + 1..MATRIX_DIM {
                if let Some(op) = self.eliminate_with_pivot(top_row, pivot_col, row) {
                    self.apply_op(op);
                    push_op(&mut ops, op);
                }
            }
        }

        if reduced {
            self.back_substitute(&mut ops);
        }

        // Scale each row so its leading value is 1.
        for row in 0..MATRIX_DIM {
            let leading = match self.0[row].first_nonzero() {
                Some(col) => self.0[row][col],
                None => continue,
            };
            if nearly_equal(leading, 1.0) {
                continue;
            }
            let op = RowOp::Scale {
                row,
                factor: 1.0 / leading,
            };
            self.apply_op(op);
            push_op(&mut ops, op);
        }
    }

    /// Apply a single elementary row operation.
    pub fn apply_op(&mut self, op: RowOp) {
        match op {
            RowOp::Swap { a, b } => self.0.swap(a, b),
            RowOp::Scale { row, factor } => self.0[row] *= factor,
            RowOp::AddScaled { dest, src, factor } => {
                let scaled = self.0[src] * factor;
                self.0[dest] += scaled;
            }
        }
    }

    /// Starting from echelon form, create zeros above each pivot.
    fn back_substitute(&mut self, ops: &mut Option<&mut Vec<RowOp>>) {
        for pivot_row in (0..MATRIX_DIM).rev() {
            let pivot_col = match self.0[pivot_row].first_nonzero() {
                Some(col) => col,
                None => continue,
            };
            for row in 0..pivot_row {
                if let Some(op) = self.eliminate_with_pivot(pivot_row, pivot_col, row) {
                    self.apply_op(op);
                    push_op(ops, op);
                }
            }
        }
    }

    /// The row operation that cancels `target_row`'s entry in `pivot_col`
    /// using `pivot_row`, or `None` when either entry is already zero.
    fn eliminate_with_pivot(
        &self,
        pivot_row: usize,
        pivot_col: usize,
        target_row: usize,
    ) -> Option<RowOp> {
        let value = self.0[target_row][pivot_col];
        let pivot = self.0[pivot_row][pivot_col];
        if nearly_equal(value, 0.0) || nearly_equal(pivot, 0.0) {
            return None;
        }
        Some(RowOp::AddScaled {
            dest: target_row,
            src: pivot_row,
            factor: -value / pivot,
        })
    }

    fn is_column_zero(&self, column: usize, start_row: usize) -> bool {
        (start_row..MATRIX_DIM).all(|row| nearly_equal(self.0[row][column], 0.0))
    }

    /// Transform a point (w = 1).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = [p.x, p.y, p.z, 1.0];
        self.transform4(v)
    }

    /// Transform a direction vector (w = 0); translation does not apply.
    pub fn transform_vector(&self, d: Vec3) -> Vec3 {
        let v = [d.x, d.y, d.z, 0.0];
        self.transform4(v)
    }

    fn transform4(&self, v: [f64; MATRIX_DIM]) -> Vec3 {
        let mut out = [0.0; MATRIX_DIM];
        for (row, slot) in out.iter_mut().enumerate() {
            for col in 0..MATRIX_DIM {
                *slot += self.0[row][col] * v[col];
            }
        }
        Vec3::new(out[0], out[1], out[2])
    }

    /// Transform a ray: the origin as a point, the direction as a vector.
    /// The direction is not renormalized, so hit parameters found along the
    /// transformed ray are valid along the original one.
    pub fn transform_ray(&self, ray: &Ray) -> Ray {
        Ray::new(
            self.transform_point(ray.origin),
            self.transform_vector(ray.direction),
        )
    }

    /// Transform an AABB by transforming all eight corners and re-bounding.
    pub fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let lo = aabb.min_point();
        let hi = aabb.max_point();
        let corners = [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ];
        let transformed: Vec<Vec3> = corners.iter().map(|&c| self.transform_point(c)).collect();
        Aabb::from_point_set(&transformed)
    }
}

impl Index<usize> for Matrix4 {
    type Output = MatrixRow;

    fn index(&self, index: usize) -> &MatrixRow {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix4 {
    fn index_mut(&mut self, index: usize) -> &mut MatrixRow {
        &mut self.0[index]
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, other: Matrix4) -> Matrix4 {
        let mut result = Matrix4::default();
        for row in 0..MATRIX_DIM {
            for col in 0..MATRIX_DIM {
                for i in 0..MATRIX_DIM {
                    result.0[row][col] += self.0[row][i] * other.0[i][col];
                }
            }
        }
        result
    }
}

impl MulAssign for Matrix4 {
    fn mul_assign(&mut self, other: Matrix4) {
        *self = *self * other;
    }
}
