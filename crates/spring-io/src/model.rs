//! JSON model files.
//!
//! A model file stores the node count, the element rows, and per-node
//! supports, loads and prescribed values, together with the global multiplier
//! and report settings. [`ModelFile::resolve`] turns it into the solver's
//! [`SpringModel`] and [`AnalysisConfig`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};
use spring_solver::{
    AnalysisConfig, BoundaryConditions, MAX_NODES, MIN_NODES, NodeCondition, Preset,
    SpringElement, SpringModel, ValidationError, axial_stiffness,
};

use crate::error::{IoError, Result};

/// Model file format version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_decimal_places() -> usize {
    4
}

/// Whole node numbers are written as integers.
fn write_node<S: Serializer>(node: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if node.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(node) {
        serializer.serialize_u64(*node as u64)
    } else {
        serializer.serialize_f64(*node)
    }
}

/// Node number as an index candidate; range is checked by assembly.
fn node_number(value: f64) -> Option<usize> {
    (value.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&value)).then_some(value as usize)
}

/// One element row as stored on disk.
///
/// Either `stiffness` is given directly, or `calculate_k` is set and the
/// stiffness is derived as `A * E / l` from `area`, `length` and the
/// file-level Young's modulus.
///
/// Node numbers are read as plain numbers so that a fractional or negative
/// node is reported against its element rather than as a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(serialize_with = "write_node")]
    pub node1: f64,
    #[serde(serialize_with = "write_node")]
    pub node2: f64,
    #[serde(default)]
    pub stiffness: Option<f64>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default)]
    pub calculate_k: bool,
}

impl ElementRecord {
    fn resolve(&self, index: usize, youngs_modulus: Option<f64>) -> Result<SpringElement> {
        let err = |reason: &str| IoError::Element {
            index: index + 1,
            reason: reason.to_string(),
        };
        let (Some(node1), Some(node2)) = (node_number(self.node1), node_number(self.node2)) else {
            let reason = format!("invalid node assignments ({}, {})", self.node1, self.node2);
            return Err(err(reason.as_str()));
        };

        let stiffness = if self.calculate_k {
            let e = youngs_modulus.ok_or_else(|| err("calculate_k needs a Young's modulus"))?;
            let a = self.area.ok_or_else(|| err("calculate_k needs an area"))?;
            let l = self.length.ok_or_else(|| err("calculate_k needs a length"))?;
            axial_stiffness(e, a, l)
                .ok_or_else(|| err("cannot compute stiffness from E, A and l"))?
        } else {
            // A missing value is left for assembly to reject with its position.
            self.stiffness.unwrap_or(f64::NAN)
        };

        Ok(SpringElement {
            node1,
            node2,
            stiffness,
            area: self.area,
            label: self.label.clone(),
        })
    }
}

impl From<&SpringElement> for ElementRecord {
    fn from(element: &SpringElement) -> Self {
        Self {
            label: element.label.clone(),
            node1: element.node1 as f64,
            node2: element.node2 as f64,
            stiffness: Some(element.stiffness),
            area: element.area,
            length: None,
            calculate_k: false,
        }
    }
}

/// Versioned JSON model document.
///
/// Boundary arrays are indexed by node (0-based). Shorter arrays are padded
/// with free, unloaded nodes; a prescribed value makes its node fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub num_nodes: usize,
    #[serde(default = "default_multiplier")]
    pub global_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youngs_modulus: Option<f64>,
    #[serde(default = "default_decimal_places")]
    pub decimal_places: usize,
    pub elements: Vec<ElementRecord>,
    #[serde(default)]
    pub fixed_nodes: Vec<bool>,
    #[serde(default)]
    pub forces: Vec<f64>,
    #[serde(default)]
    pub prescribed: Vec<Option<f64>>,
}

impl ModelFile {
    /// Build a model file from an in-memory model.
    pub fn from_model(model: &SpringModel, config: &AnalysisConfig) -> Self {
        let nodes = &model.boundary.nodes;
        Self {
            schema_version: SCHEMA_VERSION,
            num_nodes: model.num_nodes,
            global_multiplier: config.global_multiplier,
            youngs_modulus: None,
            decimal_places: default_decimal_places(),
            elements: model.elements.iter().map(ElementRecord::from).collect(),
            fixed_nodes: nodes.iter().map(|c| c.fixed).collect(),
            forces: nodes.iter().map(|c| c.load).collect(),
            prescribed: nodes
                .iter()
                .map(|c| if c.fixed { c.prescribed } else { None })
                .collect(),
        }
    }

    pub fn from_preset(preset: &Preset) -> Self {
        Self::from_model(&preset.model, &preset.config())
    }

    /// Replace the model contents after an edit, keeping file-only settings.
    ///
    /// Young's modulus and decimal places survive. An element row keeps its
    /// length while its nodes and area are unchanged, and keeps `calculate_k`
    /// while the section data still yields the element's stiffness.
    pub fn update_from_model(&mut self, model: &SpringModel, config: &AnalysisConfig) {
        let mut updated = Self::from_model(model, config);
        updated.youngs_modulus = self.youngs_modulus;
        updated.decimal_places = self.decimal_places;

        for (record, old) in updated.elements.iter_mut().zip(&self.elements) {
            if record.node1 != old.node1 || record.node2 != old.node2 || record.area != old.area {
                continue;
            }
            record.length = old.length;
            let derived = match (self.youngs_modulus, record.area, old.length) {
                (Some(e), Some(a), Some(l)) => axial_stiffness(e, a, l),
                _ => None,
            };
            record.calculate_k = old.calculate_k && derived.is_some() && derived == record.stiffness;
        }

        *self = updated;
    }

    /// Resolve into a solver model and analysis configuration.
    ///
    /// Element-level validation (stiffness, node references) is left to the
    /// solver so that its messages stay the single source of truth.
    pub fn resolve(&self) -> Result<(SpringModel, AnalysisConfig)> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(IoError::SchemaVersion {
                found: self.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        let n = self.num_nodes;
        if !(MIN_NODES..=MAX_NODES).contains(&n) {
            return Err(ValidationError::NodeCount(n).into());
        }
        for (name, len) in [
            ("fixed_nodes", self.fixed_nodes.len()),
            ("forces", self.forces.len()),
            ("prescribed", self.prescribed.len()),
        ] {
            if len > n {
                return Err(IoError::InvalidModel(format!(
                    "{name} has {len} entries for a model with {n} nodes"
                )));
            }
        }

        let elements = self
            .elements
            .iter()
            .enumerate()
            .map(|(index, record)| record.resolve(index, self.youngs_modulus))
            .collect::<Result<Vec<_>>>()?;

        let nodes = (0..n)
            .map(|i| {
                let prescribed = self.prescribed.get(i).copied().flatten();
                NodeCondition {
                    fixed: self.fixed_nodes.get(i).copied().unwrap_or(false)
                        || prescribed.is_some(),
                    prescribed,
                    load: self.forces.get(i).copied().unwrap_or(0.0),
                }
            })
            .collect();

        let global_multiplier =
            if self.global_multiplier.is_finite() && self.global_multiplier != 0.0 {
                self.global_multiplier
            } else {
                tracing::warn!(
                    value = self.global_multiplier,
                    "unusable global multiplier, falling back to 1"
                );
                1.0
            };

        let model = SpringModel::new(n, elements).with_boundary(BoundaryConditions { nodes });
        let config = AnalysisConfig {
            global_multiplier,
            ..Default::default()
        };
        Ok((model, config))
    }
}

/// Model document for a built-in preset, looked up by name.
pub fn preset_file(name: &str) -> Result<ModelFile> {
    spring_solver::presets::find(name)
        .map(|preset| ModelFile::from_preset(&preset))
        .ok_or_else(|| IoError::UnknownPreset(name.to_string()))
}

/// Parse a model document from a JSON string.
pub fn parse_model(text: &str) -> Result<ModelFile> {
    Ok(serde_json::from_str(text)?)
}

/// Read a model document from disk.
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelFile> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write a model document, creating parent directories as needed.
pub fn save_model(path: impl AsRef<Path>, model: &ModelFile) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(model)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = r#"{
        "num_nodes": 3,
        "elements": [
            { "node1": 1, "node2": 2, "stiffness": 1000, "area": 1 },
            { "node1": 2, "node2": 3, "stiffness": 1000, "area": 1, "label": "right" }
        ],
        "fixed_nodes": [true, false, true],
        "forces": [0, 100]
    }"#;

    #[test]
    fn parses_minimal_document_with_defaults() {
        let file = parse_model(CHAIN).unwrap();
        assert_eq!(file.schema_version, SCHEMA_VERSION);
        assert_eq!(file.global_multiplier, 1.0);
        assert_eq!(file.decimal_places, 4);

        let (model, config) = file.resolve().unwrap();
        assert_eq!(config.global_multiplier, 1.0);
        assert_eq!(model.boundary.free_indices(), vec![1]);
        assert_eq!(model.boundary.loads(), vec![0.0, 100.0, 0.0]);
        assert_eq!(model.elements[1].label.as_deref(), Some("right"));
    }

    #[test]
    fn calculates_stiffness_from_section() {
        let text = r#"{
            "num_nodes": 2,
            "youngs_modulus": 210e9,
            "elements": [
                { "node1": 1, "node2": 2, "area": 1e-4, "length": 2.0, "calculate_k": true }
            ]
        }"#;
        let (model, _) = parse_model(text).unwrap().resolve().unwrap();
        assert!((model.elements[0].stiffness - 1.05e7).abs() < 1e-3);
    }

    #[test]
    fn calculate_k_requires_section_data() {
        let text = r#"{
            "num_nodes": 2,
            "elements": [
                { "node1": 1, "node2": 2, "area": 1e-4, "length": 2.0, "calculate_k": true }
            ]
        }"#;
        let err = parse_model(text).unwrap().resolve().unwrap_err();
        assert!(matches!(err, IoError::Element { index: 1, .. }));

        let text = r#"{
            "num_nodes": 2,
            "youngs_modulus": 1.0,
            "elements": [
                { "node1": 1, "node2": 2, "area": 1.0, "length": 0.0, "calculate_k": true }
            ]
        }"#;
        let err = parse_model(text).unwrap().resolve().unwrap_err();
        assert!(err.to_string().contains("cannot compute stiffness"));
    }

    #[test]
    fn prescribed_value_fixes_its_node() {
        let text = r#"{
            "num_nodes": 3,
            "elements": [
                { "node1": 1, "node2": 2, "stiffness": 100 },
                { "node1": 2, "node2": 3, "stiffness": 100 }
            ],
            "fixed_nodes": [true],
            "prescribed": [10.0, null, 20.0]
        }"#;
        let (model, _) = parse_model(text).unwrap().resolve().unwrap();
        assert_eq!(model.boundary.fixed_indices(), vec![0, 2]);
        assert_eq!(model.boundary.known_displacements(), vec![10.0, 0.0, 20.0]);
    }

    #[test]
    fn rejects_oversized_boundary_arrays() {
        let text = r#"{
            "num_nodes": 2,
            "elements": [{ "node1": 1, "node2": 2, "stiffness": 1 }],
            "forces": [0, 1, 2]
        }"#;
        let err = parse_model(text).unwrap().resolve().unwrap_err();
        assert!(matches!(err, IoError::InvalidModel(_)));
    }

    #[test]
    fn rejects_other_schema_versions() {
        let mut file = parse_model(CHAIN).unwrap();
        file.schema_version = 99;
        assert!(matches!(
            file.resolve().unwrap_err(),
            IoError::SchemaVersion { found: 99, supported: 1 }
        ));
    }

    #[test]
    fn unusable_multiplier_falls_back_to_one() {
        let mut file = parse_model(CHAIN).unwrap();
        file.global_multiplier = 0.0;
        let (_, config) = file.resolve().unwrap();
        assert_eq!(config.global_multiplier, 1.0);
    }

    #[test]
    fn missing_stiffness_is_reported_by_assembly() {
        let text = r#"{
            "num_nodes": 2,
            "elements": [{ "node1": 1, "node2": 2 }]
        }"#;
        let (model, _) = parse_model(text).unwrap().resolve().unwrap();
        let err = spring_solver::assemble_global_stiffness_matrix(2, &model.elements).unwrap_err();
        assert!(err.to_string().starts_with("Element 1 has an invalid stiffness"));
    }

    #[test]
    fn preset_converts_to_file_and_back() {
        let preset = spring_solver::presets::thermal_wall();
        let (model, config) = ModelFile::from_preset(&preset).resolve().unwrap();
        assert_eq!(model, preset.model);
        assert_eq!(config.global_multiplier, preset.global_multiplier);
    }

    #[test]
    fn preset_lookup_ignores_case() {
        let file = preset_file("Example-2-2").unwrap();
        assert_eq!(file.global_multiplier, 1e8);
        assert_eq!(file.elements.len(), 4);
        assert!(matches!(preset_file("nope"), Err(IoError::UnknownPreset(name)) if name == "nope"));
    }

    #[test]
    fn node_count_is_checked_before_allocating() {
        for count in ["0", "1", "11", "18446744073709551615"] {
            let text = format!(
                r#"{{"num_nodes": {count}, "elements": [{{"node1": 1, "node2": 2, "stiffness": 1}}]}}"#
            );
            let err = parse_model(&text).unwrap().resolve().unwrap_err();
            assert!(
                matches!(err, IoError::Validation(ValidationError::NodeCount(_))),
                "num_nodes {}: {}",
                count,
                err
            );
        }
    }

    #[test]
    fn non_integer_nodes_are_reported_per_element() {
        let text = r#"{
            "num_nodes": 3,
            "elements": [
                { "node1": 1, "node2": 2, "stiffness": 10 },
                { "node1": 2.5, "node2": 3, "stiffness": 10 }
            ]
        }"#;
        let err = parse_model(text).unwrap().resolve().unwrap_err();
        assert!(matches!(err, IoError::Element { index: 2, .. }));
        assert_eq!(err.to_string(), "Element 2: invalid node assignments (2.5, 3)");

        let text = r#"{
            "num_nodes": 2,
            "elements": [{ "node1": -1, "node2": 2, "stiffness": 10 }]
        }"#;
        let err = parse_model(text).unwrap().resolve().unwrap_err();
        assert!(matches!(err, IoError::Element { index: 1, .. }));
    }

    #[test]
    fn whole_node_numbers_are_written_as_integers() {
        let file = parse_model(CHAIN).unwrap();
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains(r#""node1":1,"node2":2"#), "{}", json);
    }

    #[test]
    fn update_keeps_file_only_settings() {
        let text = r#"{
            "num_nodes": 3,
            "youngs_modulus": 200e9,
            "decimal_places": 6,
            "elements": [
                { "node1": 1, "node2": 2, "area": 1e-4, "length": 2.0, "calculate_k": true },
                { "node1": 2, "node2": 3, "area": 1e-4, "length": 2.0, "calculate_k": true }
            ],
            "fixed_nodes": [true]
        }"#;
        let mut file = parse_model(text).unwrap();
        let (mut model, config) = file.resolve().unwrap();

        model.boundary.add_load(3, 500.0).unwrap();
        model.elements[1].stiffness *= 2.0;
        file.update_from_model(&model, &config);

        assert_eq!(file.youngs_modulus, Some(200e9));
        assert_eq!(file.decimal_places, 6);
        assert_eq!(file.forces, vec![0.0, 0.0, 500.0]);
        assert!(file.elements[0].calculate_k);
        assert_eq!(file.elements[0].length, Some(2.0));
        // An edited stiffness no longer follows from the section.
        assert!(!file.elements[1].calculate_k);
        let edited = file.elements[1].stiffness.unwrap();
        assert!((edited - 2e7).abs() < 1e-6, "edited stiffness {}", edited);

        let (reloaded, _) = file.resolve().unwrap();
        assert_eq!(reloaded, model);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_model("{invalid json"), Err(IoError::Json(_))));
    }
}
