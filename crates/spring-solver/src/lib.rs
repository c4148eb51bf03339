//! Direct solver for 1-D spring, bar and conduction networks.
//!
//! Nodes carry one scalar unknown (displacement or temperature) and elements
//! couple two nodes through a single coefficient (`EA/L`, `kA/L`, a spring
//! rate). The crate assembles the global matrix, reduces it to the free
//! nodes, inverts it by pivoting elimination, and recovers nodal values,
//! reactions, and element forces/stresses.
//!
//! ```
//! use spring_solver::{AnalysisPipeline, BoundaryConditions, SpringElement, SpringModel};
//!
//! let elements = vec![SpringElement::new(1, 2, 1000.0), SpringElement::new(2, 3, 1000.0)];
//! let mut bcs = BoundaryConditions::new(3);
//! bcs.fix(1).unwrap();
//! bcs.fix(3).unwrap();
//! bcs.add_load(2, 100.0).unwrap();
//!
//! let model = SpringModel::new(3, elements).with_boundary(bcs);
//! let results = AnalysisPipeline::default().run(&model).unwrap();
//! assert!((results.solution.full_displacement_vector[1] - 0.05).abs() < 1e-12);
//! ```

pub mod analysis;
pub mod assembly;
pub mod boundary_conditions;
pub mod error;
pub mod linalg;
pub mod postprocess;
pub mod presets;
pub mod recovery;
pub mod reduction;

pub use analysis::{AnalysisConfig, AnalysisPipeline, AnalysisResults, ReducedSystem, SpringModel};
pub use assembly::{
    AssemblyStep, SpringElement, assemble_global_stiffness_matrix, assembly_steps,
    axial_stiffness, symmetry_error,
};
pub use boundary_conditions::{BoundaryConditions, NodeCondition};
pub use error::{AnalysisError, MAX_NODES, MIN_NODES, ValidationError};
pub use linalg::{
    PIVOT_TOLERANCE, SINGULARITY_TOLERANCE, Tolerances, determinant, determinant_with_tolerance,
    invert_matrix, invert_matrix_with_tolerance, multiply_matrix_vector,
};
pub use postprocess::{
    ElementForce, ElementStress, calculate_element_forces, calculate_element_stresses,
};
pub use presets::Preset;
pub use recovery::{DisplacementInput, DisplacementResult, compute_displacements};
pub use reduction::build_reduced_matrix;

pub use nalgebra::{DMatrix, DVector};
