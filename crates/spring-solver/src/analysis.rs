//! Analysis pipeline for a complete spring model.
//!
//! The core operations are free functions over explicit inputs. This module
//! strings them together for callers that hold a whole model:
//!
//! ```text
//! SpringModel ──assemble──▶ K ──reduce(λ)──▶ K_r ──det/invert──▶ K_r⁻¹
//!                                                              │
//!            element forces/stresses ◀──post-process── d, R ◀──┘
//! ```
//!
//! The caller owns the [`SpringModel`] and passes it in on every run; the
//! pipeline keeps nothing between runs.

use crate::assembly::{SpringElement, assemble_global_stiffness_matrix, symmetry_error};
use crate::boundary_conditions::BoundaryConditions;
use crate::error::{AnalysisError, ValidationError};
use crate::linalg::{Tolerances, determinant_with_tolerance, invert_matrix_with_tolerance};
use crate::postprocess::{
    ElementForce, ElementStress, calculate_element_forces, calculate_element_stresses,
};
use crate::recovery::{DisplacementInput, DisplacementResult, compute_displacements};
use crate::reduction::build_reduced_matrix;
use nalgebra::DMatrix;

/// A 1-D network: node count, elements and boundary state.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringModel {
    pub num_nodes: usize,
    pub elements: Vec<SpringElement>,
    pub boundary: BoundaryConditions,
}

impl SpringModel {
    /// Model with every node free and unloaded
    pub fn new(num_nodes: usize, elements: Vec<SpringElement>) -> Self {
        Self {
            num_nodes,
            elements,
            boundary: BoundaryConditions::new(num_nodes),
        }
    }

    pub fn with_boundary(mut self, boundary: BoundaryConditions) -> Self {
        self.boundary = boundary;
        self
    }
}

/// Analysis configuration and control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Scalar λ applied to the assembled matrix
    pub global_multiplier: f64,
    /// Pivot and singularity thresholds
    pub tolerances: Tolerances,
    /// Allowed free-node reaction, relative to the largest load (or 1)
    pub reaction_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            global_multiplier: 1.0,
            tolerances: Tolerances::default(),
            reaction_tolerance: 1e-6,
        }
    }
}

/// Reduced matrix with its determinant and inverse
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedSystem {
    pub free_indices: Vec<usize>,
    pub matrix: DMatrix<f64>,
    pub determinant: f64,
    pub inverse: DMatrix<f64>,
}

/// Everything a run produces
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResults {
    /// Unscaled global matrix K
    pub global_matrix: DMatrix<f64>,
    /// Multiplier the run was made with
    pub global_multiplier: f64,
    pub reduced: ReducedSystem,
    pub fixed_indices: Vec<usize>,
    pub solution: DisplacementResult,
    pub element_forces: Vec<ElementForce>,
    pub element_stresses: Vec<ElementStress>,
}

impl AnalysisResults {
    /// `(node, reaction)` pairs at the fixed nodes, nodes 1-based.
    pub fn reactions(&self) -> Vec<(usize, f64)> {
        self.fixed_indices
            .iter()
            .map(|&i| (i + 1, self.solution.reaction_forces[i]))
            .collect()
    }

    /// `(node, value)` pairs at the free nodes, nodes 1-based.
    pub fn free_displacements(&self) -> Vec<(usize, f64)> {
        self.reduced
            .free_indices
            .iter()
            .zip(self.solution.displacements.iter())
            .map(|(&i, &d)| (i + 1, d))
            .collect()
    }

    /// Largest reaction at a free node; should be round-off.
    pub fn free_residual(&self) -> f64 {
        self.solution.max_reaction_at(&self.reduced.free_indices)
    }
}

/// Main analysis pipeline orchestrator
#[derive(Debug, Clone, Default)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Default configuration with a different global multiplier
    pub fn with_multiplier(global_multiplier: f64) -> Self {
        Self::new(AnalysisConfig {
            global_multiplier,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Assemble K and check the boundary state matches the node count.
    pub fn assemble(&self, model: &SpringModel) -> Result<DMatrix<f64>, AnalysisError> {
        let global = assemble_global_stiffness_matrix(model.num_nodes, &model.elements)?;
        if model.boundary.num_nodes() != model.num_nodes {
            return Err(ValidationError::Dimension {
                context: "boundary conditions",
                expected: model.num_nodes,
                actual: model.boundary.num_nodes(),
            }
            .into());
        }
        Ok(global)
    }

    /// Reduce K to the free nodes and invert, refusing singular systems.
    pub fn reduce(
        &self,
        global: &DMatrix<f64>,
        free_indices: &[usize],
    ) -> Result<ReducedSystem, AnalysisError> {
        if free_indices.is_empty() {
            return Err(AnalysisError::NoFreeNodes);
        }

        let tolerances = self.config.tolerances;
        let matrix = build_reduced_matrix(global, free_indices, self.config.global_multiplier);
        let determinant = determinant_with_tolerance(&matrix, tolerances.pivot);

        if tolerances.is_singular(determinant) {
            tracing::warn!(determinant, "reduced matrix is singular");
            return Err(AnalysisError::Singular { determinant });
        }

        let inverse = invert_matrix_with_tolerance(&matrix, tolerances.pivot).ok_or_else(|| {
            tracing::warn!(determinant, "elimination found no usable pivot");
            AnalysisError::Singular { determinant }
        })?;

        tracing::debug!(size = matrix.nrows(), determinant, "inverted reduced matrix");
        Ok(ReducedSystem {
            free_indices: free_indices.to_vec(),
            matrix,
            determinant,
            inverse,
        })
    }

    /// Run the full pipeline on a model.
    pub fn run(&self, model: &SpringModel) -> Result<AnalysisResults, AnalysisError> {
        let multiplier = self.config.global_multiplier;
        let global = self.assemble(model)?;

        let asymmetry = symmetry_error(&global);
        if asymmetry > 0.0 {
            tracing::warn!(asymmetry, "assembled matrix is not symmetric");
        }

        let free_indices = model.boundary.free_indices();
        let fixed_indices = model.boundary.fixed_indices();
        let reduced = self.reduce(&global, &free_indices)?;

        let forces = model.boundary.loads();
        let known = model.boundary.known_displacements();
        let solution = compute_displacements(DisplacementInput {
            inverted_reduced_matrix: Some(&reduced.inverse),
            free_indices: &reduced.free_indices,
            fixed_indices: &fixed_indices,
            forces: &forces,
            known_displacements: Some(&known),
            global_matrix: &global,
            global_multiplier: multiplier,
        })?;

        let element_forces =
            calculate_element_forces(&model.elements, &solution.full_displacement_vector, multiplier);
        let element_stresses = calculate_element_stresses(
            &model.elements,
            &solution.full_displacement_vector,
            multiplier,
        );

        let results = AnalysisResults {
            global_matrix: global,
            global_multiplier: multiplier,
            reduced,
            fixed_indices,
            solution,
            element_forces,
            element_stresses,
        };

        let load_scale = forces.iter().fold(1.0_f64, |acc, f| acc.max(f.abs()));
        let residual = results.free_residual();
        if residual > self.config.reaction_tolerance * load_scale {
            tracing::warn!(residual, load_scale, "free-node reactions exceed tolerance");
        }

        tracing::debug!(
            num_nodes = model.num_nodes,
            num_elements = model.elements.len(),
            residual,
            "analysis complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_chain() -> SpringModel {
        let elements = vec![
            SpringElement::new(1, 2, 1000.0).with_area(1.0),
            SpringElement::new(2, 3, 1000.0).with_area(1.0),
        ];
        let mut bcs = BoundaryConditions::new(3);
        bcs.fix(1).unwrap();
        bcs.fix(3).unwrap();
        bcs.add_load(2, 100.0).unwrap();
        SpringModel::new(3, elements).with_boundary(bcs)
    }

    #[test]
    fn runs_loaded_chain() {
        let results = AnalysisPipeline::default().run(&loaded_chain()).unwrap();

        assert!((results.reduced.determinant - 2000.0).abs() < 1e-9);
        assert_eq!(results.free_displacements().len(), 1);
        assert!((results.free_displacements()[0].1 - 0.05).abs() < 1e-12);

        let reactions = results.reactions();
        assert_eq!(reactions.len(), 2);
        assert_eq!(reactions[0].0, 1);
        assert_eq!(reactions[1].0, 3);
        assert!((reactions[0].1 + 50.0).abs() < 1e-9);
        assert!((reactions[1].1 + 50.0).abs() < 1e-9);
        assert!(results.free_residual() < 1e-9);

        assert!((results.element_forces[0].force - 50.0).abs() < 1e-9);
        assert!((results.element_stresses[1].stress + 50.0).abs() < 1e-9);
    }

    #[test]
    fn unconstrained_model_is_singular() {
        let mut model = loaded_chain();
        model.boundary.release(1).unwrap();
        model.boundary.release(3).unwrap();
        let err = AnalysisPipeline::default().run(&model).unwrap_err();
        assert!(matches!(err, AnalysisError::Singular { .. }));
    }

    #[test]
    fn disconnected_model_is_singular() {
        let elements = vec![SpringElement::new(1, 2, 10.0), SpringElement::new(3, 4, 10.0)];
        let mut bcs = BoundaryConditions::new(4);
        bcs.fix(1).unwrap();
        let model = SpringModel::new(4, elements).with_boundary(bcs);
        let err = AnalysisPipeline::default().run(&model).unwrap_err();
        assert!(matches!(err, AnalysisError::Singular { .. }));
    }

    #[test]
    fn fully_fixed_model_has_no_free_nodes() {
        let mut model = loaded_chain();
        model.boundary.fix(2).unwrap();
        assert_eq!(
            AnalysisPipeline::default().run(&model).unwrap_err(),
            AnalysisError::NoFreeNodes
        );
    }

    #[test]
    fn validation_errors_pass_through() {
        let model = SpringModel::new(1, vec![SpringElement::new(1, 2, 1.0)]);
        let err = AnalysisPipeline::default().run(&model).unwrap_err();
        assert_eq!(err, AnalysisError::Validation(ValidationError::NodeCount(1)));
    }

    #[test]
    fn boundary_size_must_match_model() {
        let model = loaded_chain().with_boundary(BoundaryConditions::new(2));
        let err = AnalysisPipeline::default().run(&model).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Validation(ValidationError::Dimension { context: "boundary conditions", .. })
        ));
    }

    #[test]
    fn multiplier_is_carried_through() {
        let results = AnalysisPipeline::with_multiplier(2.0)
            .run(&loaded_chain())
            .unwrap();
        assert_eq!(results.global_multiplier, 2.0);
        assert!((results.reduced.determinant - 4000.0).abs() < 1e-9);
        assert!((results.free_displacements()[0].1 - 0.025).abs() < 1e-12);
        // Element forces are load-driven and do not change with λ.
        assert!((results.element_forces[0].force - 50.0).abs() < 1e-9);
    }
}
