//! Boundary conditions and nodal loads.
//!
//! Each node carries one scalar degree of freedom. A node is either:
//! - **fixed**: its value is prescribed (0 unless stated otherwise) and a
//!   reaction is recovered there, or
//! - **free**: its value is solved for from the applied loads.
//!
//! The free and fixed index lists are always ascending and together partition
//! `0..num_nodes`. Downstream vectors (reduced matrix rows, free displacements)
//! follow the same order.

use crate::error::{Result, ValidationError};

/// Constraint and load state of one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeCondition {
    /// Whether the node value is prescribed
    pub fixed: bool,
    /// Prescribed value for a fixed node (`None` means 0)
    pub prescribed: Option<f64>,
    /// Applied load (force or heat input)
    pub load: f64,
}

/// Supports, prescribed values and loads for every node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryConditions {
    /// One entry per node, 0-based
    pub nodes: Vec<NodeCondition>,
}

impl BoundaryConditions {
    /// All nodes free and unloaded
    pub fn new(num_nodes: usize) -> Self {
        Self {
            nodes: vec![NodeCondition::default(); num_nodes],
        }
    }

    /// Build from per-node fixed flags and loads.
    ///
    /// Missing loads default to 0; extra loads beyond `fixed.len()` are ignored.
    pub fn from_flags(fixed: &[bool], loads: &[f64]) -> Self {
        let nodes = fixed
            .iter()
            .enumerate()
            .map(|(i, &fixed)| NodeCondition {
                fixed,
                prescribed: None,
                load: loads.get(i).copied().unwrap_or(0.0),
            })
            .collect();
        Self { nodes }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn node_mut(&mut self, node: usize) -> Result<&mut NodeCondition> {
        let num_nodes = self.nodes.len();
        node.checked_sub(1)
            .and_then(|index| self.nodes.get_mut(index))
            .ok_or(ValidationError::IndexOutOfRange {
                index: node,
                num_nodes,
            })
    }

    /// Fix a node (1-based) at zero
    pub fn fix(&mut self, node: usize) -> Result<()> {
        let condition = self.node_mut(node)?;
        condition.fixed = true;
        condition.prescribed = None;
        Ok(())
    }

    /// Fix a node (1-based) at a prescribed value
    pub fn prescribe(&mut self, node: usize, value: f64) -> Result<()> {
        let condition = self.node_mut(node)?;
        condition.fixed = true;
        condition.prescribed = Some(value);
        Ok(())
    }

    /// Make a node (1-based) free again, dropping any prescribed value
    pub fn release(&mut self, node: usize) -> Result<()> {
        let condition = self.node_mut(node)?;
        condition.fixed = false;
        condition.prescribed = None;
        Ok(())
    }

    /// Add a load at a node (1-based). Loads at the same node accumulate.
    pub fn add_load(&mut self, node: usize, magnitude: f64) -> Result<()> {
        self.node_mut(node)?.load += magnitude;
        Ok(())
    }

    /// Ascending 0-based indices of free nodes
    pub fn free_indices(&self) -> Vec<usize> {
        self.indices_where(|c| !c.fixed)
    }

    /// Ascending 0-based indices of fixed nodes
    pub fn fixed_indices(&self) -> Vec<usize> {
        self.indices_where(|c| c.fixed)
    }

    fn indices_where(&self, predicate: impl Fn(&NodeCondition) -> bool) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, c)| predicate(c))
            .map(|(i, _)| i)
            .collect()
    }

    /// Full load vector
    pub fn loads(&self) -> Vec<f64> {
        self.nodes.iter().map(|c| c.load).collect()
    }

    /// Full vector of known values: the prescribed value at fixed nodes, 0 elsewhere
    pub fn known_displacements(&self) -> Vec<f64> {
        self.nodes
            .iter()
            .map(|c| if c.fixed { c.prescribed.unwrap_or(0.0) } else { 0.0 })
            .collect()
    }

    /// Whether any fixed node has a non-zero prescribed value
    pub fn has_prescribed_values(&self) -> bool {
        self.nodes
            .iter()
            .any(|c| c.fixed && c.prescribed.is_some_and(|v| v != 0.0))
    }
}
