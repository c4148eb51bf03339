//! Global matrix assembly for 1-D spring networks.
//!
//! Every element couples exactly two nodes with one scalar degree of freedom
//! each, so its local matrix is the 2×2 stencil
//!
//! ```text
//! k_e = k * [ 1  -1]
//!           [-1   1]
//! ```
//!
//! scattered into rows/columns `(node1 - 1, node2 - 1)` of the global matrix.
//! The coefficient `k` is whatever the caller says it is: `EA/L` for a bar,
//! `kA/L` for a conduction path. Nothing here knows the physics.
//!
//! ## Assembly Process
//!
//! 1. Validate the node count (2..=10) and that at least one element exists
//! 2. Validate each element: finite positive stiffness, distinct in-range nodes
//! 3. Accumulate each stencil; parallel elements between the same pair add up
//!
//! The result is symmetric and every row sums to zero. It is singular until
//! at least one node is constrained.

use crate::error::{MAX_NODES, MIN_NODES, Result, ValidationError};
use nalgebra::{DMatrix, Matrix2};

/// Two-node axial element (spring, bar or conduction path)
#[derive(Debug, Clone, PartialEq)]
pub struct SpringElement {
    /// First node (1-based)
    pub node1: usize,
    /// Second node (1-based)
    pub node2: usize,
    /// Stiffness or conductance coefficient
    pub stiffness: f64,
    /// Cross-sectional area, only needed for stress/flux
    pub area: Option<f64>,
    /// Display label
    pub label: Option<String>,
}

impl SpringElement {
    /// Create an element without area or label
    pub fn new(node1: usize, node2: usize, stiffness: f64) -> Self {
        Self {
            node1,
            node2,
            stiffness,
            area: None,
            label: None,
        }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for result tables; `index` is the 0-based position in the element list.
    pub fn display_label(&self, index: usize) -> String {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => label.to_string(),
            _ => format!("Element {}", index + 1),
        }
    }

    /// 0-based node indices, or `None` if either node falls outside `1..=num_nodes`.
    pub fn node_indices(&self, num_nodes: usize) -> Option<(usize, usize)> {
        let in_range = |node: usize| (1..=num_nodes).contains(&node);
        if in_range(self.node1) && in_range(self.node2) {
            Some((self.node1 - 1, self.node2 - 1))
        } else {
            None
        }
    }

    /// Local 2×2 stiffness stencil
    pub fn local_stiffness(&self) -> Matrix2<f64> {
        let k = self.stiffness;
        Matrix2::new(k, -k, -k, k)
    }

    fn validate(&self, index: usize, num_nodes: usize) -> Result<(usize, usize)> {
        if !self.stiffness.is_finite() || self.stiffness <= 0.0 {
            return Err(ValidationError::Stiffness {
                index: index + 1,
                stiffness: self.stiffness,
            });
        }
        match self.node_indices(num_nodes) {
            Some((i, j)) if i != j => Ok((i, j)),
            _ => Err(ValidationError::NodeAssignment {
                index: index + 1,
                node1: self.node1,
                node2: self.node2,
            }),
        }
    }
}

/// Axial stiffness `A * E / L` from section data.
///
/// Returns `None` for non-finite input or zero length.
pub fn axial_stiffness(youngs_modulus: f64, area: f64, length: f64) -> Option<f64> {
    if !youngs_modulus.is_finite() || !area.is_finite() || !length.is_finite() || length == 0.0 {
        return None;
    }
    Some(area * youngs_modulus / length)
}

fn check_model(num_nodes: usize, elements: &[SpringElement]) -> Result<()> {
    if !(MIN_NODES..=MAX_NODES).contains(&num_nodes) {
        return Err(ValidationError::NodeCount(num_nodes));
    }
    if elements.is_empty() {
        return Err(ValidationError::NoElements);
    }
    Ok(())
}

/// Validate one element and add its stencil, returning the stencil and the
/// four global entries it touched.
fn scatter(
    matrix: &mut DMatrix<f64>,
    element: &SpringElement,
    index: usize,
) -> Result<(Matrix2<f64>, [(usize, usize); 4])> {
    let (i, j) = element.validate(index, matrix.nrows())?;
    let k_e = element.local_stiffness();
    let dofs = [i, j];

    for (a, &row) in dofs.iter().enumerate() {
        for (b, &col) in dofs.iter().enumerate() {
            matrix[(row, col)] += k_e[(a, b)];
        }
    }
    Ok((k_e, [(i, i), (i, j), (j, i), (j, j)]))
}

/// Assemble the `num_nodes × num_nodes` global stiffness matrix.
///
/// # Errors
/// Returns [`ValidationError`] for a node count outside 2..=10, an empty element
/// list, or the first element with a bad stiffness or node assignment.
pub fn assemble_global_stiffness_matrix(
    num_nodes: usize,
    elements: &[SpringElement],
) -> Result<DMatrix<f64>> {
    check_model(num_nodes, elements)?;

    let mut matrix = DMatrix::zeros(num_nodes, num_nodes);
    for (index, element) in elements.iter().enumerate() {
        scatter(&mut matrix, element, index)?;
    }

    tracing::debug!(num_nodes, num_elements = elements.len(), "assembled global matrix");
    Ok(matrix)
}

/// One element's contribution during assembly
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyStep {
    /// 0-based position in the element list
    pub element_index: usize,
    /// Local 2×2 stencil of the element
    pub local: Matrix2<f64>,
    /// Global matrix after the element was added
    pub global: DMatrix<f64>,
    /// Global `(row, col)` entries the element touched, 0-based
    pub touched: Vec<(usize, usize)>,
}

/// Assemble element by element, keeping a snapshot of K after each one.
///
/// The last snapshot equals [`assemble_global_stiffness_matrix`]. Validation
/// and its errors are identical too.
pub fn assembly_steps(num_nodes: usize, elements: &[SpringElement]) -> Result<Vec<AssemblyStep>> {
    check_model(num_nodes, elements)?;

    let mut matrix = DMatrix::zeros(num_nodes, num_nodes);
    let mut steps = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let (local, touched) = scatter(&mut matrix, element, index)?;
        steps.push(AssemblyStep {
            element_index: index,
            local,
            global: matrix.clone(),
            touched: touched.to_vec(),
        });
    }
    Ok(steps)
}

/// Largest `|K[i][j] - K[j][i]|` over the matrix.
pub fn symmetry_error(matrix: &DMatrix<f64>) -> f64 {
    let n = matrix.nrows().min(matrix.ncols());
    let mut worst: f64 = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((matrix[(i, j)] - matrix[(j, i)]).abs());
        }
    }
    worst
}
