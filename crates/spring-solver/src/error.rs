//! Error types for spring-solver

use thiserror::Error;

/// Smallest supported model.
pub const MIN_NODES: usize = 2;
/// Largest supported model.
pub const MAX_NODES: usize = 10;

/// Rejected input to one of the core operations.
///
/// Element positions are reported 1-based, matching how users number rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Number of nodes must be an integer between {MIN_NODES} and {MAX_NODES}, got {0}.")]
    NodeCount(usize),

    #[error("At least one element must be defined.")]
    NoElements,

    #[error("Element {index} has an invalid stiffness ({stiffness}).")]
    Stiffness { index: usize, stiffness: f64 },

    #[error("Element {index} has invalid node assignments ({node1}, {node2}).")]
    NodeAssignment {
        index: usize,
        node1: usize,
        node2: usize,
    },

    #[error("Inverted reduced matrix is required.")]
    MissingInverse,

    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}.")]
    Dimension {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Node index {index} is out of range for a model with {num_nodes} nodes.")]
    IndexOutOfRange { index: usize, num_nodes: usize },

    #[error("Node index {0} is listed more than once in the free/fixed partition.")]
    DuplicateIndex(usize),
}

/// Failure of a full analysis run.
///
/// Wraps validation problems and adds the numerical outcomes a caller must
/// check before solving: no unknowns left, or a singular reduced matrix.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot invert: no free nodes. Unfix at least one node.")]
    NoFreeNodes,

    #[error("The reduced matrix is singular (determinant {determinant:e}). Check the boundary conditions.")]
    Singular { determinant: f64 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
