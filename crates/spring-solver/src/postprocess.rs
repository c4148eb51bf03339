//! Element results from a solved nodal vector.
//!
//! For an element between nodes 1 and 2 with coefficient `k`, area `A` and
//! global multiplier `λ`:
//!
//! ```text
//! force  = k λ (d2 - d1)
//! stress = force / A
//! ```
//!
//! Read as a bar these are axial force and stress; read as a conduction path
//! they are heat flow and heat flux.
//!
//! A bad element never aborts the batch. Its entry is NaN and the remaining
//! elements are still evaluated.

use crate::assembly::SpringElement;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Internal force (or heat flow) of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementForce {
    pub label: String,
    pub force: f64,
}

/// Stress (or heat flux) of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStress {
    pub label: String,
    pub stress: f64,
}

/// `d[node2] - d[node1]`, or `None` if a node is not in the vector.
fn nodal_difference(element: &SpringElement, displacements: &DVector<f64>) -> Option<f64> {
    let (i, j) = element.node_indices(displacements.len())?;
    Some(displacements[j] - displacements[i])
}

/// Internal force of every element, in element order.
pub fn calculate_element_forces(
    elements: &[SpringElement],
    displacements: &DVector<f64>,
    multiplier: f64,
) -> Vec<ElementForce> {
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let force = match nodal_difference(element, displacements) {
                Some(delta) if element.stiffness.is_finite() => {
                    element.stiffness * multiplier * delta
                }
                _ => f64::NAN,
            };
            ElementForce {
                label: element.display_label(index),
                force,
            }
        })
        .collect()
}

/// Stress of every element, in element order.
///
/// Elements without a finite non-zero area get NaN.
pub fn calculate_element_stresses(
    elements: &[SpringElement],
    displacements: &DVector<f64>,
    multiplier: f64,
) -> Vec<ElementStress> {
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let area = element.area.unwrap_or(f64::NAN);
            let valid = element.stiffness.is_finite() && area.is_finite() && area != 0.0;
            let stress = match nodal_difference(element, displacements) {
                Some(delta) if valid => (element.stiffness * multiplier / area) * delta,
                _ => f64::NAN,
            };
            ElementStress {
                label: element.display_label(index),
                stress,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_elements() -> Vec<SpringElement> {
        vec![
            SpringElement::new(1, 2, 1000.0).with_area(1.0),
            SpringElement::new(2, 3, 1000.0).with_area(1.0),
        ]
    }

    #[test]
    fn forces_and_stresses_of_loaded_chain() {
        let d = DVector::from_vec(vec![0.0, 0.05, 0.0]);
        let forces = calculate_element_forces(&chain_elements(), &d, 1.0);
        assert!((forces[0].force - 50.0).abs() < 1e-9);
        assert!((forces[1].force + 50.0).abs() < 1e-9);
        assert_eq!(forces[0].label, "Element 1");
        assert_eq!(forces[1].label, "Element 2");

        let stresses = calculate_element_stresses(&chain_elements(), &d, 1.0);
        assert!((stresses[0].stress - 50.0).abs() < 1e-9);
        assert!((stresses[1].stress + 50.0).abs() < 1e-9);
    }

    #[test]
    fn conduction_reading_gives_heat_flow_and_flux() {
        let elements = vec![
            SpringElement::new(1, 2, 15.0).with_area(0.5).with_label("Wall A"),
            SpringElement::new(2, 3, 30.0).with_area(0.25).with_label("Wall B"),
        ];
        let temperatures = DVector::from_vec(vec![350.0, 300.0, 260.0]);

        let flow = calculate_element_forces(&elements, &temperatures, 1.0);
        assert!((flow[0].force + 750.0).abs() < 1e-9);
        assert!((flow[1].force + 1200.0).abs() < 1e-9);
        assert_eq!(flow[0].label, "Wall A");

        let flux = calculate_element_stresses(&elements, &temperatures, 1.0);
        assert!((flux[0].stress + 1500.0).abs() < 1e-9);
        assert!((flux[1].stress + 4800.0).abs() < 1e-9);
    }

    #[test]
    fn multiplier_scales_element_results() {
        let d = DVector::from_vec(vec![0.0, 0.05, 0.0]);
        let forces = calculate_element_forces(&chain_elements(), &d, 1e3);
        assert!((forces[0].force - 5.0e4).abs() < 1e-6);
    }

    #[test]
    fn bad_elements_yield_nan_without_aborting() {
        let elements = vec![
            SpringElement::new(1, 2, f64::NAN).with_area(1.0),
            SpringElement::new(2, 9, 10.0).with_area(1.0),
            SpringElement::new(1, 3, 10.0),
            SpringElement::new(1, 3, 10.0).with_area(0.0),
            SpringElement::new(1, 3, 10.0).with_area(2.0),
        ];
        let d = DVector::from_vec(vec![0.0, 1.0, 2.0]);

        let forces = calculate_element_forces(&elements, &d, 1.0);
        assert!(forces[0].force.is_nan());
        assert!(forces[1].force.is_nan());
        assert_eq!(forces[2].force, 20.0);

        let stresses = calculate_element_stresses(&elements, &d, 1.0);
        assert!(stresses[0].stress.is_nan());
        assert!(stresses[1].stress.is_nan());
        assert!(stresses[2].stress.is_nan(), "missing area");
        assert!(stresses[3].stress.is_nan(), "zero area");
        assert_eq!(stresses[4].stress, 10.0);
        assert_eq!(stresses.len(), elements.len());
    }
}
