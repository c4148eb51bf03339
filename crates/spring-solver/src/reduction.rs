//! Reduction of the global matrix to the free degrees of freedom.

use nalgebra::DMatrix;

/// Principal sub-matrix of `multiplier * global` on `free_indices`.
///
/// Entry `(a, b)` is `global[(free_indices[a], free_indices[b])] * multiplier`.
/// The order of `free_indices` fixes the order of every free-DOF vector that
/// is later solved with the inverse of this matrix.
///
/// # Panics
/// Panics if an index in `free_indices` is outside the global matrix.
pub fn build_reduced_matrix(
    global: &DMatrix<f64>,
    free_indices: &[usize],
    multiplier: f64,
) -> DMatrix<f64> {
    let n = free_indices.len();
    DMatrix::from_fn(n, n, |a, b| {
        global[(free_indices[a], free_indices[b])] * multiplier
    })
}
