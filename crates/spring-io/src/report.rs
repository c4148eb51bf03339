//! Result reports.
//!
//! Plain-text tables for people and a JSON document for tools. Numbers in the
//! text report use engineering notation: exponents are multiples of three and
//! mantissas fall in `[1, 1000)`, except for values between 1e-3 and 1e6,
//! which are printed as plain decimals.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use spring_solver::{
    AnalysisResults, AssemblyStep, DMatrix, ElementForce, ElementStress, SpringModel,
};

use crate::error::Result;

/// Strip trailing zeros (and a dangling point) from a fixed-point string.
fn trim_decimal(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Split a value into an engineering-notation mantissa string and exponent.
pub fn format_engineering(value: f64, precision: usize) -> (String, i32) {
    if value.is_nan() {
        return ("NaN".to_string(), 0);
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return (text.to_string(), 0);
    }
    if value.abs() < 1e-12 {
        return ("0".to_string(), 0);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    if (1e-3..1e6).contains(&abs) {
        let text = trim_decimal(format!("{:.*}", precision, abs));
        return (format!("{sign}{text}"), 0);
    }

    let mut exponent = ((abs.log10() / 3.0).floor() * 3.0) as i32;
    let mut mantissa = abs / 10f64.powi(exponent);
    if mantissa >= 1000.0 && exponent < 21 {
        mantissa /= 1000.0;
        exponent += 3;
    } else if mantissa < 1.0 && exponent > -21 {
        mantissa *= 1000.0;
        exponent -= 3;
    }

    let text = trim_decimal(format!("{:.*}", precision, mantissa));
    (format!("{sign}{text}"), exponent)
}

/// Engineering notation as a single string, e.g. `-2.5 x 10^-6`.
pub fn format_engineering_string(value: f64, precision: usize) -> String {
    match format_engineering(value, precision) {
        (mantissa, 0) => mantissa,
        (mantissa, exponent) => format!("{mantissa} x 10^{exponent}"),
    }
}

/// Heading prefix for a matrix shown without its multiplier, e.g. `1 x 10^8 x`.
///
/// With `inverse`, the prefix describes `1 / value` (used for the inverse of
/// the reduced matrix). A multiplier of exactly 1 gives an empty prefix.
pub fn format_multiplier(value: f64, inverse: bool) -> String {
    if value == 0.0 {
        return "0 x".to_string();
    }
    let value = if inverse { 1.0 / value } else { value };
    if value == 1.0 {
        return String::new();
    }

    let mut exponent = value.abs().log10().floor() as i32;
    let mut scaled = value / 10f64.powi(exponent);
    if scaled.abs() >= 10.0 {
        scaled /= 10.0;
        exponent += 1;
    } else if scaled.abs() < 1.0 {
        scaled *= 10.0;
        exponent -= 1;
    }
    let mantissa = trim_decimal(format!("{:.3}", scaled));
    if exponent == 0 {
        format!("{mantissa} x")
    } else {
        format!("{mantissa} x 10^{exponent} x")
    }
}

/// Write a square table with node headers. Entries listed in `marked`
/// (0-based `(row, col)`) get a trailing `*`.
fn write_matrix<W: Write>(
    out: &mut W,
    matrix: &DMatrix<f64>,
    headers: &[usize],
    marked: &[(usize, usize)],
    decimal_places: usize,
) -> io::Result<()> {
    let width = decimal_places + 10;
    write!(out, "{:>6}", "")?;
    for h in headers {
        write!(out, "{:>w$} ", h, w = width)?;
    }
    writeln!(out)?;
    for (r, h) in headers.iter().enumerate() {
        write!(out, "{:>6}", h)?;
        for c in 0..matrix.ncols() {
            let mark = if marked.contains(&(r, c)) { '*' } else { ' ' };
            write!(out, "{:>w$.p$}{mark}", matrix[(r, c)], w = width, p = decimal_places)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn heading<W: Write>(out: &mut W, title: &str, prefix: &str) -> io::Result<()> {
    writeln!(out)?;
    if prefix.is_empty() {
        writeln!(out, "{title}")
    } else {
        writeln!(out, "{title} = {prefix} [matrix below]")
    }
}

fn write_value_row<W: Write>(
    out: &mut W,
    label: &str,
    value: f64,
    decimal_places: usize,
) -> io::Result<()> {
    if value.is_nan() {
        writeln!(out, "  {:<24} {}", label, "Invalid Input")
    } else {
        writeln!(
            out,
            "  {:<24} {}",
            label,
            format_engineering_string(value, decimal_places)
        )
    }
}

/// Write the full plain-text report of a run.
pub fn write_report<W: Write>(
    out: &mut W,
    model: &SpringModel,
    results: &AnalysisResults,
    decimal_places: usize,
) -> io::Result<()> {
    let multiplier = results.global_multiplier;
    let all_nodes: Vec<usize> = (1..=model.num_nodes).collect();

    writeln!(
        out,
        "Nodes: {}   Elements: {}   Global multiplier: {}",
        model.num_nodes,
        model.elements.len(),
        format_engineering_string(multiplier, decimal_places)
    )?;

    heading(out, "Global Stiffness Matrix (K)", &format_multiplier(multiplier, false))?;
    write_matrix(out, &results.global_matrix, &all_nodes, &[], decimal_places)?;

    // The inverse is shown with λ factored out, like K above.
    let free_nodes: Vec<usize> = results.reduced.free_indices.iter().map(|i| i + 1).collect();
    heading(
        out,
        "Inverse of Reduced Matrix (Kr^-1)",
        &format_multiplier(multiplier, true),
    )?;
    write_matrix(
        out,
        &(&results.reduced.inverse * multiplier),
        &free_nodes,
        &[],
        decimal_places,
    )?;
    writeln!(
        out,
        "  det(Kr) = {}",
        format_engineering_string(results.reduced.determinant, decimal_places)
    )?;

    heading(out, "Displacements (d)", "")?;
    for (node, value) in results.free_displacements() {
        write_value_row(out, &format!("Node {node}"), value, decimal_places)?;
    }

    heading(out, "Reaction Forces (R)", "")?;
    let reactions = results.reactions();
    if reactions.is_empty() {
        writeln!(out, "  No fixed nodes to calculate reaction forces for.")?;
    }
    for (node, value) in reactions {
        write_value_row(out, &format!("Node {node}"), value, decimal_places)?;
    }

    heading(out, "Element Forces (f)", "")?;
    for ElementForce { label, force } in &results.element_forces {
        write_value_row(out, label, *force, decimal_places)?;
    }

    heading(out, "Element Stresses (sigma)", "")?;
    for ElementStress { label, stress } in &results.element_stresses {
        write_value_row(out, label, *stress, decimal_places)?;
    }

    Ok(())
}

/// Write the element-by-element construction of K.
///
/// Starts from the empty matrix, then for each step prints the element's
/// stencil and the updated K with the four touched entries marked `*`.
pub fn write_construction_steps<W: Write>(
    out: &mut W,
    model: &SpringModel,
    steps: &[AssemblyStep],
    decimal_places: usize,
) -> io::Result<()> {
    let all_nodes: Vec<usize> = (1..=model.num_nodes).collect();

    writeln!(out, "Initial Global Matrix (K)")?;
    write_matrix(
        out,
        &DMatrix::zeros(model.num_nodes, model.num_nodes),
        &all_nodes,
        &[],
        decimal_places,
    )?;

    for step in steps {
        let Some(element) = model.elements.get(step.element_index) else {
            continue;
        };
        heading(
            out,
            &format!(
                "Step {}: Adding {}",
                step.element_index + 1,
                element.display_label(step.element_index)
            ),
            "",
        )?;
        writeln!(
            out,
            "  Element connecting Node {} and Node {} with stiffness k = {}",
            element.node1,
            element.node2,
            format_engineering_string(element.stiffness, decimal_places)
        )?;

        writeln!(out, "Element Stiffness Matrix")?;
        let local = DMatrix::from_iterator(2, 2, step.local.iter().copied());
        write_matrix(out, &local, &[element.node1, element.node2], &[], decimal_places)?;

        writeln!(out, "Updated Global Matrix (K)")?;
        write_matrix(out, &step.global, &all_nodes, &step.touched, decimal_places)?;
    }
    Ok(())
}

/// A value attached to a 1-based node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeValue {
    pub node: usize,
    pub value: f64,
}

/// Serialisable summary of one analysis run.
///
/// NaN element results serialise as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub num_nodes: usize,
    pub global_multiplier: f64,
    pub global_matrix: Vec<Vec<f64>>,
    pub free_nodes: Vec<usize>,
    pub reduced_determinant: f64,
    pub inverse_reduced_matrix: Vec<Vec<f64>>,
    pub displacements: Vec<NodeValue>,
    pub reactions: Vec<NodeValue>,
    pub element_forces: Vec<ElementForce>,
    pub element_stresses: Vec<ElementStress>,
}

fn rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

impl From<&AnalysisResults> for ResultsDocument {
    fn from(results: &AnalysisResults) -> Self {
        let node_values = |pairs: Vec<(usize, f64)>| -> Vec<NodeValue> {
            pairs
                .into_iter()
                .map(|(node, value)| NodeValue { node, value })
                .collect()
        };
        let full = &results.solution.full_displacement_vector;
        Self {
            num_nodes: full.len(),
            global_multiplier: results.global_multiplier,
            global_matrix: rows(&results.global_matrix),
            free_nodes: results.reduced.free_indices.iter().map(|i| i + 1).collect(),
            reduced_determinant: results.reduced.determinant,
            inverse_reduced_matrix: rows(&results.reduced.inverse),
            displacements: node_values(full.iter().enumerate().map(|(i, &d)| (i + 1, d)).collect()),
            reactions: node_values(results.reactions()),
            element_forces: results.element_forces.clone(),
            element_stresses: results.element_stresses.clone(),
        }
    }
}

/// Write a results document as pretty JSON, creating parent directories.
pub fn save_results(path: impl AsRef<Path>, document: &ResultsDocument) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(document)?)?;
    Ok(())
}
