//! Text and JSON rendering of assembled systems and state-space models.

use ndarray::{Array1, ArrayView2, Axis};
use serde::Serialize;
use serde_json::Value as JsonValue;
use statespice_core::{Expr, LinearSystem, Scalar, StateSpaceModel};

/// Scalars the CLI knows how to put into a JSON document.
pub trait Entry: Scalar {
    fn to_json(&self) -> JsonValue;
}

impl Entry for f64 {
    fn to_json(&self) -> JsonValue {
        // non-finite values become null
        serde_json::Number::from_f64(*self).map_or(JsonValue::Null, JsonValue::Number)
    }
}

impl Entry for Expr {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub unknowns: Vec<String>,
    pub system: SystemReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_space: Option<ModelReport>,
}

#[derive(Debug, Serialize)]
pub struct SystemReport {
    pub g: Vec<Vec<JsonValue>>,
    pub cm: Vec<Vec<JsonValue>>,
    pub b: Vec<JsonValue>,
    pub inputs: Vec<String>,
    pub decoupled: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelReport {
    pub states: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub a: Vec<Vec<JsonValue>>,
    pub b: Vec<Vec<JsonValue>>,
    pub c: Vec<Vec<JsonValue>>,
    pub d: Vec<Vec<JsonValue>>,
    pub drift: Vec<JsonValue>,
    pub offset: Vec<JsonValue>,
}

fn rows_json<T: Entry>(m: ArrayView2<'_, T>) -> Vec<Vec<JsonValue>> {
    m.axis_iter(Axis(0))
        .map(|row| row.iter().map(Entry::to_json).collect())
        .collect()
}

fn vector_json<T: Entry>(v: &Array1<T>) -> Vec<JsonValue> {
    v.iter().map(Entry::to_json).collect()
}

impl SystemReport {
    pub fn new<T: Entry>(system: &LinearSystem<T>) -> Self {
        let labels = system.labels();
        Self {
            g: rows_json(system.g().view()),
            cm: rows_json(system.cm().view()),
            b: vector_json(system.b()),
            inputs: system.excitations().iter().map(|e| e.name.clone()).collect(),
            decoupled: system.decoupled().iter().map(|&i| labels[i].clone()).collect(),
        }
    }
}

impl ModelReport {
    pub fn new<T: Entry>(model: &StateSpaceModel<T>) -> Self {
        Self {
            states: model.state_labels.clone(),
            inputs: model.input_labels.clone(),
            outputs: model.output_labels.clone(),
            a: rows_json(model.a.view()),
            b: rows_json(model.b.view()),
            c: rows_json(model.c.view()),
            d: rows_json(model.d.view()),
            drift: vector_json(&model.drift),
            offset: vector_json(&model.offset),
        }
    }
}

/// A labelled table, columns left aligned and separated by two spaces.
pub fn render_matrix<T: Scalar>(
    name: &str,
    row_labels: &[String],
    col_labels: &[String],
    m: ArrayView2<'_, T>,
) -> String {
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(row_labels.len() + 1);
    cells.push(
        std::iter::once(name.to_string())
            .chain(col_labels.iter().cloned())
            .collect(),
    );
    for (label, row) in row_labels.iter().zip(m.axis_iter(Axis(0))) {
        cells.push(
            std::iter::once(label.clone())
                .chain(row.iter().map(ToString::to_string))
                .collect(),
        );
    }

    let columns = col_labels.len() + 1;
    let widths: Vec<usize> = (0..columns)
        .map(|j| {
            cells
                .iter()
                .map(|line| line[j].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in &cells {
        let text: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(text.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn column<T: Scalar>(v: &Array1<T>) -> ArrayView2<'_, T> {
    v.view().insert_axis(Axis(1))
}

pub fn render_system<T: Scalar>(system: &LinearSystem<T>) -> String {
    let labels = system.labels();
    let mut out = format!("unknowns: {}\n\n", labels.join(" "));
    out.push_str(&render_matrix("G", &labels, &labels, system.g().view()));
    out.push('\n');
    out.push_str(&render_matrix("Cm", &labels, &labels, system.cm().view()));
    out.push('\n');
    out.push_str(&render_matrix("B", &labels, &["rhs".to_string()], column(system.b())));

    if !system.decoupled().is_empty() {
        let decoupled: Vec<&str> = system
            .decoupled()
            .iter()
            .map(|&i| labels[i].as_str())
            .collect();
        out.push_str(&format!("\ndecoupled: {}\n", decoupled.join(" ")));
    }
    out
}

pub fn render_model<T: Scalar>(model: &StateSpaceModel<T>) -> String {
    let states = &model.state_labels;
    let inputs = &model.input_labels;
    let outputs = &model.output_labels;

    let mut out = String::new();
    out.push_str(&render_matrix("A", states, states, model.a.view()));
    out.push('\n');
    out.push_str(&render_matrix("B", states, inputs, model.b.view()));
    out.push('\n');
    out.push_str(&render_matrix("C", outputs, states, model.c.view()));
    out.push('\n');
    out.push_str(&render_matrix("D", outputs, inputs, model.d.view()));

    if model.drift.iter().any(|v| !v.is_zero()) {
        out.push('\n');
        out.push_str(&render_matrix(
            "drift",
            states,
            &["value".to_string()],
            column(&model.drift),
        ));
    }
    if model.offset.iter().any(|v| !v.is_zero()) {
        out.push('\n');
        out.push_str(&render_matrix(
            "offset",
            outputs,
            &["value".to_string()],
            column(&model.offset),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numeric_table() {
        let m = array![[-4.0, -2.0], [4.0, 0.0]];
        let states = labels(&["I(L1)", "V(3)"]);
        insta::assert_snapshot!(render_matrix("A", &states, &states, m.view()), @r"
        A      I(L1)  V(3)
        I(L1)  -4     -2
        V(3)   4      0
        ");
    }

    #[test]
    fn symbolic_table() {
        let r = Expr::symbol("R");
        let l = Expr::symbol("L");
        let m = array![[-(r / l.clone())], [l.recip()]];
        let rows = labels(&["I(L1)", "V(3)"]);
        insta::assert_snapshot!(render_matrix("B", &rows, &labels(&["V1"]), m.view()), @r"
        B      V1
        I(L1)  -R/L
        V(3)   1/L
        ");
    }

    #[test]
    fn non_finite_entries_serialize_as_null() {
        assert_eq!(f64::INFINITY.to_json(), JsonValue::Null);
        assert_eq!(Expr::symbol("C").to_json(), JsonValue::String("C".into()));
    }
}
