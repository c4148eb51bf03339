//! Solution of the reduced system and recovery of reactions.
//!
//! With the global matrix partitioned into free (f) and fixed (c) blocks,
//! `λK d = F` reads
//!
//! ```text
//! [K_ff K_fc] [d_f]   [F_f]
//! [K_cf K_cc] [d_c] = [F_c + R_c]
//! ```
//!
//! The free block is solved with the prescribed values moved to the right
//! hand side:
//!
//! ```text
//! d_f = K_ff⁻¹ (F_f - K_fc d_c)
//! ```
//!
//! and the reactions follow from the full product `R = λK d - F`, which
//! vanishes at the free nodes up to round-off.

use crate::error::{Result, ValidationError};
use crate::linalg::multiply_matrix_vector;
use nalgebra::{DMatrix, DVector};

/// Everything needed to solve for the free-node values.
#[derive(Debug, Clone, Copy)]
pub struct DisplacementInput<'a> {
    /// Inverse of the reduced matrix, `None` if inversion failed upstream
    pub inverted_reduced_matrix: Option<&'a DMatrix<f64>>,
    /// Free node indices (0-based), in reduced-matrix order
    pub free_indices: &'a [usize],
    /// Fixed node indices (0-based). Empty means "every node that is not free".
    pub fixed_indices: &'a [usize],
    /// Applied loads per node; missing trailing entries are 0
    pub forces: &'a [f64],
    /// Prescribed values per node; `None` means all zero
    pub known_displacements: Option<&'a [f64]>,
    /// Unscaled global matrix
    pub global_matrix: &'a DMatrix<f64>,
    /// Global multiplier λ
    pub global_multiplier: f64,
}

/// Solved nodal values and reactions.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementResult {
    /// Solved values at the free nodes, in free-index order
    pub displacements: DVector<f64>,
    /// Values at every node, prescribed values included
    pub full_displacement_vector: DVector<f64>,
    /// `λK d - F` at every node; meaningful at fixed nodes
    pub reaction_forces: DVector<f64>,
}

impl DisplacementResult {
    /// Largest `|R|` over the given (free) indices.
    pub fn max_reaction_at(&self, indices: &[usize]) -> f64 {
        indices
            .iter()
            .filter_map(|&i| self.reaction_forces.get(i))
            .fold(0.0, |worst: f64, r| worst.max(r.abs()))
    }
}

fn check_indices(indices: &[usize], num_nodes: usize, seen: &mut [bool]) -> Result<()> {
    for &index in indices {
        if index >= num_nodes {
            return Err(ValidationError::IndexOutOfRange { index, num_nodes });
        }
        if seen[index] {
            return Err(ValidationError::DuplicateIndex(index));
        }
        seen[index] = true;
    }
    Ok(())
}

/// Resolve the fixed index set, validating the free/fixed partition.
fn partition(free: &[usize], fixed: &[usize], num_nodes: usize) -> Result<Vec<usize>> {
    let mut seen = vec![false; num_nodes];
    check_indices(free, num_nodes, &mut seen)?;

    if fixed.is_empty() {
        return Ok((0..num_nodes).filter(|&i| !seen[i]).collect());
    }

    check_indices(fixed, num_nodes, &mut seen)?;
    let covered = free.len() + fixed.len();
    if covered != num_nodes {
        return Err(ValidationError::Dimension {
            context: "free/fixed partition",
            expected: num_nodes,
            actual: covered,
        });
    }
    Ok(fixed.to_vec())
}

/// Solve for the free-node values and recover reactions.
///
/// # Errors
/// [`ValidationError::MissingInverse`] if no inverse was supplied, and
/// dimension/index errors if the inputs do not describe one consistent model.
pub fn compute_displacements(input: DisplacementInput<'_>) -> Result<DisplacementResult> {
    let inverse = input
        .inverted_reduced_matrix
        .ok_or(ValidationError::MissingInverse)?;

    let global = input.global_matrix;
    let n = global.nrows();
    if global.ncols() != n {
        return Err(ValidationError::Dimension {
            context: "global matrix columns",
            expected: n,
            actual: global.ncols(),
        });
    }

    let free = input.free_indices;
    let fixed = partition(free, input.fixed_indices, n)?;

    if inverse.nrows() != free.len() || inverse.ncols() != free.len() {
        return Err(ValidationError::Dimension {
            context: "inverted reduced matrix",
            expected: free.len(),
            actual: inverse.nrows().max(inverse.ncols()),
        });
    }
    if input.forces.len() > n {
        return Err(ValidationError::Dimension {
            context: "load vector",
            expected: n,
            actual: input.forces.len(),
        });
    }
    let prescribed = input.known_displacements.unwrap_or(&[]);
    if prescribed.len() > n {
        return Err(ValidationError::Dimension {
            context: "known displacements",
            expected: n,
            actual: prescribed.len(),
        });
    }

    let force_at = |i: usize| input.forces.get(i).copied().unwrap_or(0.0);
    let scaled = global * input.global_multiplier;

    let mut full = DVector::zeros(n);
    for &c in &fixed {
        full[c] = prescribed.get(c).copied().unwrap_or(0.0);
    }

    let effective = DVector::from_iterator(
        free.len(),
        free.iter().map(|&f| {
            let coupling: f64 = fixed.iter().map(|&c| scaled[(f, c)] * full[c]).sum();
            force_at(f) - coupling
        }),
    );

    let displacements = multiply_matrix_vector(inverse, &effective)?;
    for (a, &f) in free.iter().enumerate() {
        full[f] = displacements[a];
    }

    let loads = DVector::from_fn(n, |i, _| force_at(i));
    let reaction_forces = multiply_matrix_vector(&scaled, &full)? - loads;

    tracing::debug!(
        num_nodes = n,
        num_free = free.len(),
        num_fixed = fixed.len(),
        "recovered displacements and reactions"
    );

    Ok(DisplacementResult {
        displacements,
        full_displacement_vector: full,
        reaction_forces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{SpringElement, assemble_global_stiffness_matrix};
    use crate::linalg::invert_matrix;
    use crate::reduction::build_reduced_matrix;

    fn chain(num_nodes: usize, k: f64) -> DMatrix<f64> {
        let elements: Vec<_> = (1..num_nodes)
            .map(|i| SpringElement::new(i, i + 1, k))
            .collect();
        assemble_global_stiffness_matrix(num_nodes, &elements).unwrap()
    }

    fn solve(
        global: &DMatrix<f64>,
        free: &[usize],
        fixed: &[usize],
        forces: &[f64],
        known: Option<&[f64]>,
        multiplier: f64,
    ) -> DisplacementResult {
        let reduced = build_reduced_matrix(global, free, multiplier);
        let inverse = invert_matrix(&reduced).expect("reduced matrix is invertible");
        compute_displacements(DisplacementInput {
            inverted_reduced_matrix: Some(&inverse),
            free_indices: free,
            fixed_indices: fixed,
            forces,
            known_displacements: known,
            global_matrix: global,
            global_multiplier: multiplier,
        })
        .unwrap()
    }

    #[test]
    fn chain_with_center_load() {
        let k = chain(3, 1000.0);
        let result = solve(&k, &[1], &[0, 2], &[0.0, 100.0, 0.0], None, 1.0);

        assert_eq!(result.displacements.len(), 1);
        assert!((result.displacements[0] - 0.05).abs() < 1e-12);
        assert!((result.full_displacement_vector[1] - 0.05).abs() < 1e-12);
        assert!((result.reaction_forces[0] + 50.0).abs() < 1e-9);
        assert!((result.reaction_forces[2] + 50.0).abs() < 1e-9);
        assert!(result.max_reaction_at(&[1]) < 1e-9);
    }

    #[test]
    fn prescribed_values_drive_free_node() {
        let k = chain(3, 100.0);
        let known = [10.0, 0.0, 20.0];
        let result = solve(&k, &[1], &[0, 2], &[0.0; 3], Some(&known), 1.0);

        assert!((result.full_displacement_vector[1] - 15.0).abs() < 1e-9);
        assert_eq!(result.full_displacement_vector[0], 10.0);
        assert_eq!(result.full_displacement_vector[2], 20.0);
        assert!((result.reaction_forces[0] + 500.0).abs() < 1e-9);
        assert!((result.reaction_forces[2] - 500.0).abs() < 1e-9);
        assert!(result.max_reaction_at(&[1]) < 1e-9);
    }

    #[test]
    fn three_prescribed_nodes() {
        // 1 -- 2 -- 3 -- 4 -- 5 with nodes 1, 3, 5 held at 1, 2, 4.
        let k = chain(5, 100.0);
        let known = [1.0, 0.0, 2.0, 0.0, 4.0];
        let result = solve(&k, &[1, 3], &[0, 2, 4], &[0.0; 5], Some(&known), 1.0);

        let d = &result.full_displacement_vector;
        assert!((d[1] - 1.5).abs() < 1e-9, "node 2 = {}", d[1]);
        assert!((d[3] - 3.0).abs() < 1e-9, "node 4 = {}", d[3]);

        let r = &result.reaction_forces;
        assert!((r[0] + 50.0).abs() < 1e-9);
        assert!((r[2] + 50.0).abs() < 1e-9);
        assert!((r[4] - 100.0).abs() < 1e-9);
        assert!(result.max_reaction_at(&[1, 3]) < 1e-9);
        assert!(r.sum().abs() < 1e-9, "unloaded model must be in equilibrium");
    }

    #[test]
    fn prescribed_values_combine_with_loads() {
        let k = chain(3, 100.0);
        let known = [10.0, 0.0, 20.0];
        let result = solve(&k, &[1], &[0, 2], &[0.0, 40.0, 0.0], Some(&known), 1.0);

        // 200 d2 - 100*10 - 100*20 = 40
        assert!((result.full_displacement_vector[1] - 15.2).abs() < 1e-9);
        assert!(result.max_reaction_at(&[1]) < 1e-9);
        // Supports carry the applied load.
        let total: f64 = result.reaction_forces.sum();
        assert!((total + 40.0).abs() < 1e-9);
    }

    #[test]
    fn zero_prescribed_values_match_load_only_path() {
        let k = chain(4, 250.0);
        let forces = [0.0, 30.0, -10.0, 0.0];
        let legacy = solve(&k, &[1, 2], &[], &forces, None, 1.0);
        let explicit = solve(&k, &[1, 2], &[0, 3], &forces, Some(&[0.0; 4]), 1.0);
        assert!((legacy.full_displacement_vector - explicit.full_displacement_vector).norm() < 1e-12);
        assert!((legacy.reaction_forces - explicit.reaction_forces).norm() < 1e-9);
    }

    #[test]
    fn doubling_multiplier_halves_displacements() {
        let k = chain(3, 500.0);
        let forces = [0.0, 200.0, 0.0];
        let single = solve(&k, &[1], &[0, 2], &forces, None, 1.0);
        let double = solve(&k, &[1], &[0, 2], &forces, None, 2.0);
        assert!((single.displacements[0] - 0.2).abs() < 1e-12);
        assert!((double.displacements[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn missing_inverse_is_rejected() {
        let k = chain(3, 1.0);
        let err = compute_displacements(DisplacementInput {
            inverted_reduced_matrix: None,
            free_indices: &[1],
            fixed_indices: &[0, 2],
            forces: &[],
            known_displacements: None,
            global_matrix: &k,
            global_multiplier: 1.0,
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingInverse);
        assert_eq!(err.to_string(), "Inverted reduced matrix is required.");
    }

    #[test]
    fn inconsistent_partition_is_rejected() {
        let k = chain(3, 1.0);
        let inverse = DMatrix::from_element(1, 1, 0.5);
        let base = DisplacementInput {
            inverted_reduced_matrix: Some(&inverse),
            free_indices: &[1],
            fixed_indices: &[0, 1],
            forces: &[],
            known_displacements: None,
            global_matrix: &k,
            global_multiplier: 1.0,
        };
        assert_eq!(
            compute_displacements(base).unwrap_err(),
            ValidationError::DuplicateIndex(1)
        );

        let uncovered = DisplacementInput {
            fixed_indices: &[0],
            ..base
        };
        assert!(matches!(
            compute_displacements(uncovered).unwrap_err(),
            ValidationError::Dimension { expected: 3, actual: 2, .. }
        ));

        let out_of_range = DisplacementInput {
            free_indices: &[3],
            fixed_indices: &[],
            ..base
        };
        assert!(matches!(
            compute_displacements(out_of_range).unwrap_err(),
            ValidationError::IndexOutOfRange { index: 3, num_nodes: 3 }
        ));
    }

    #[test]
    fn inverse_size_must_match_free_set() {
        let k = chain(3, 1.0);
        let inverse = DMatrix::identity(2, 2);
        let err = compute_displacements(DisplacementInput {
            inverted_reduced_matrix: Some(&inverse),
            free_indices: &[1],
            fixed_indices: &[],
            forces: &[],
            known_displacements: None,
            global_matrix: &k,
            global_multiplier: 1.0,
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::Dimension { context: "inverted reduced matrix", .. }));
    }
}
