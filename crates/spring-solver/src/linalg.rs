//! Dense linear algebra for small stiffness systems.
//!
//! Models are capped at ten nodes, so everything here is plain O(n³)
//! elimination on `nalgebra` dense storage:
//!
//! - [`determinant`]: Gaussian elimination with partial pivoting and sign tracking
//! - [`invert_matrix`]: Gauss-Jordan elimination on the augmented matrix `[M | I]`
//! - [`multiply_matrix_vector`]: dense product with a dimension check
//!
//! Singularity is never an error at this level. `determinant` returns `0.0` as
//! soon as a pivot falls below [`PIVOT_TOLERANCE`] and `invert_matrix` returns
//! `None`; callers decide what to do with that.
//!
//! ## Tolerances
//!
//! | Constant | Value | Used for |
//! |---|---|---|
//! | [`PIVOT_TOLERANCE`] | 1e-12 | pivot rejection during elimination |
//! | [`SINGULARITY_TOLERANCE`] | 1e-9 | `|det|` threshold callers use before inverting |
//!
//! Both are absolute, so a model scaled by a very small global multiplier can
//! trip them even when it is well conditioned. Use [`Tolerances`] and the
//! `*_with_tolerance` variants to override them.

use crate::error::{Result, ValidationError};
use nalgebra::{DMatrix, DVector};

/// Pivot magnitude below which elimination treats the matrix as singular.
pub const PIVOT_TOLERANCE: f64 = 1e-12;

/// Determinant magnitude below which a reduced matrix is not inverted.
pub const SINGULARITY_TOLERANCE: f64 = 1e-9;

/// Numerical thresholds for elimination and singularity checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Smallest acceptable pivot magnitude
    pub pivot: f64,
    /// Smallest acceptable `|det|` before inversion
    pub singularity: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            pivot: PIVOT_TOLERANCE,
            singularity: SINGULARITY_TOLERANCE,
        }
    }
}

impl Tolerances {
    /// Whether a determinant is too small to proceed with inversion.
    pub fn is_singular(&self, determinant: f64) -> bool {
        !determinant.is_finite() || determinant.abs() < self.singularity
    }
}

/// Row in `column_start..rows` holding the largest `|value|` in `column`.
///
/// Ties keep the earliest row so that no swap happens unless it helps.
fn select_pivot(matrix: &DMatrix<f64>, column: usize, rows: usize) -> (usize, f64) {
    let mut pivot_row = column;
    let mut pivot_value = matrix[(column, column)].abs();
    for r in (column + 1)..rows {
        let candidate = matrix[(r, column)].abs();
        if candidate > pivot_value {
            pivot_value = candidate;
            pivot_row = r;
        }
    }
    (pivot_row, pivot_value)
}

/// Determinant by partial-pivot Gaussian elimination.
///
/// An empty matrix has determinant 1.
///
/// # Panics
/// Panics if `matrix` is not square.
pub fn determinant(matrix: &DMatrix<f64>) -> f64 {
    determinant_with_tolerance(matrix, PIVOT_TOLERANCE)
}

/// [`determinant`] with an explicit pivot tolerance.
pub fn determinant_with_tolerance(matrix: &DMatrix<f64>, pivot_tolerance: f64) -> f64 {
    assert!(
        matrix.is_square(),
        "Unable to compute the determinant of a non-square matrix."
    );

    let size = matrix.nrows();
    if size == 0 {
        return 1.0;
    }

    let mut working = matrix.clone();
    let mut sign = 1.0;

    for i in 0..size {
        let (pivot_row, pivot_value) = select_pivot(&working, i, size);
        // NaN entries fail this comparison too and are treated as singular.
        if !(pivot_value >= pivot_tolerance) {
            return 0.0;
        }
        if pivot_row != i {
            working.swap_rows(i, pivot_row);
            sign = -sign;
        }

        let pivot = working[(i, i)];
        for r in (i + 1)..size {
            let factor = working[(r, i)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in i..size {
                working[(r, c)] -= factor * working[(i, c)];
            }
        }
    }

    sign * (0..size).map(|i| working[(i, i)]).product::<f64>()
}

/// Inverse by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` when the matrix is not square or no pivot above
/// [`PIVOT_TOLERANCE`] can be found for some column.
pub fn invert_matrix(matrix: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    invert_matrix_with_tolerance(matrix, PIVOT_TOLERANCE)
}

/// [`invert_matrix`] with an explicit pivot tolerance.
pub fn invert_matrix_with_tolerance(
    matrix: &DMatrix<f64>,
    pivot_tolerance: f64,
) -> Option<DMatrix<f64>> {
    if !matrix.is_square() {
        return None;
    }

    let size = matrix.nrows();
    if size == 0 {
        return Some(DMatrix::zeros(0, 0));
    }

    let width = 2 * size;
    let mut augmented = DMatrix::<f64>::zeros(size, width);
    augmented.view_mut((0, 0), (size, size)).copy_from(matrix);
    augmented
        .view_mut((0, size), (size, size))
        .fill_with_identity();

    for i in 0..size {
        let (pivot_row, pivot_value) = select_pivot(&augmented, i, size);
        if !(pivot_value >= pivot_tolerance) {
            return None;
        }
        if pivot_row != i {
            augmented.swap_rows(i, pivot_row);
        }

        let divisor = augmented[(i, i)];
        for j in i..width {
            augmented[(i, j)] /= divisor;
        }

        for k in 0..size {
            if k == i {
                continue;
            }
            let factor = augmented[(k, i)];
            if factor == 0.0 {
                continue;
            }
            for j in i..width {
                augmented[(k, j)] -= factor * augmented[(i, j)];
            }
        }
    }

    Some(augmented.columns(size, size).into_owned())
}

/// Dense matrix-vector product `M * v`.
pub fn multiply_matrix_vector(matrix: &DMatrix<f64>, vector: &DVector<f64>) -> Result<DVector<f64>> {
    if matrix.ncols() != vector.len() {
        return Err(ValidationError::Dimension {
            context: "matrix-vector product",
            expected: matrix.ncols(),
            actual: vector.len(),
        });
    }
    Ok(matrix * vector)
}
