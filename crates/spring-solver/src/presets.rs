//! Worked example models.
//!
//! Textbook-style spring and bar problems that exercise parallel elements,
//! large global multipliers and prescribed non-zero boundary values.

use crate::analysis::{AnalysisConfig, SpringModel};
use crate::assembly::SpringElement;
use crate::boundary_conditions::BoundaryConditions;

/// A named model together with the multiplier it is meant to be run with
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub model: SpringModel,
    pub global_multiplier: f64,
}

impl Preset {
    /// Analysis configuration for this preset
    pub fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            global_multiplier: self.global_multiplier,
            ..Default::default()
        }
    }
}

fn element(node1: usize, node2: usize, stiffness: f64, area: f64, label: &str) -> SpringElement {
    SpringElement::new(node1, node2, stiffness)
        .with_area(area)
        .with_label(label)
}

fn five_node_ends_fixed(elements: Vec<SpringElement>, loads: &[f64]) -> SpringModel {
    let bcs = BoundaryConditions::from_flags(&[true, false, false, false, true], loads);
    SpringModel::new(5, elements).with_boundary(bcs)
}

/// Stepped bar in four segments, ends fixed, point load at the middle node.
pub fn example_2_2() -> Preset {
    let elements = vec![
        element(1, 2, 0.3333, 1e-4, "Element 1"),
        element(2, 3, 1.0, 1e-4, "Element 2"),
        element(3, 4, 1.0, 1e-4, "Element 3"),
        element(4, 5, 0.3333, 1e-4, "Element 4"),
    ];
    Preset {
        name: "example-2-2",
        description: "Four-segment bar, ends fixed, 10 kN at node 3 (stiffness x 1e8)",
        model: five_node_ends_fixed(elements, &[0.0, 0.0, 10000.0, 0.0, 0.0]),
        global_multiplier: 1e8,
    }
}

/// Spring assemblage with a parallel pair between nodes 2 and 3.
pub fn example_2_3() -> Preset {
    let elements = vec![
        element(1, 2, 1.5, 1.0, "Element 1"),
        element(2, 3, 1.5, 1.0, "Element 2"),
        element(2, 3, 2.0, 1.0, "Element 3 (Parallel)"),
        element(2, 4, 5.0, 1.0, "Element 4"),
        element(4, 5, 5.0, 1.0, "Element 5"),
        element(3, 4, 2.5, 1.0, "Element 6"),
    ];
    Preset {
        name: "example-2-3",
        description: "Spring assemblage with parallel elements, loads at nodes 2 and 4",
        model: five_node_ends_fixed(elements, &[0.0, 100.0, 0.0, 100.0, 0.0]),
        global_multiplier: 1.0,
    }
}

/// Six springs on five nodes, downward load at node 3.
pub fn activity_2_3() -> Preset {
    let elements = vec![
        element(1, 2, 500.0, 1.0, "k1"),
        element(2, 4, 400.0, 1.0, "k2"),
        element(2, 3, 600.0, 1.0, "k3"),
        element(1, 3, 200.0, 1.0, "k4"),
        element(3, 4, 400.0, 1.0, "k5"),
        element(4, 5, 300.0, 1.0, "k6"),
    ];
    Preset {
        name: "activity-2-3",
        description: "Six springs, ends fixed, -1000 at node 3",
        model: five_node_ends_fixed(elements, &[0.0, 0.0, -1000.0, 0.0, 0.0]),
        global_multiplier: 1.0,
    }
}

/// Two-layer wall with fixed surface temperatures and a heat source at the interface.
pub fn thermal_wall() -> Preset {
    let elements = vec![
        element(1, 2, 15.0, 0.5, "Layer 1"),
        element(2, 3, 30.0, 0.25, "Layer 2"),
    ];
    let mut bcs = BoundaryConditions::from_flags(&[true, false, true], &[0.0, 450.0, 0.0]);
    bcs.nodes[0].prescribed = Some(350.0);
    bcs.nodes[2].prescribed = Some(260.0);
    Preset {
        name: "thermal-wall",
        description: "Two-layer conduction wall, surfaces at 350 and 260, 450 W at the interface",
        model: SpringModel::new(3, elements).with_boundary(bcs),
        global_multiplier: 1.0,
    }
}

/// Every built-in preset
pub fn all() -> Vec<Preset> {
    vec![example_2_2(), example_2_3(), activity_2_3(), thermal_wall()]
}

/// Look a preset up by name (case-insensitive)
pub fn find(name: &str) -> Option<Preset> {
    all()
        .into_iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}
