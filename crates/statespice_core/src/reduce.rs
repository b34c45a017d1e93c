use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, s};

use crate::error::ReductionError;
use crate::linalg::{Singular, hstack, matmul, select, solve};
use crate::scalar::Scalar;
use crate::system::{Excitation, LinearSystem};
use crate::topology::Unknown;

/// A quantity to expose as a row of `y = C·x + D·u`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSpec {
    /// Voltage of a node against ground, `V(n)`.
    NodeVoltage(String),
    /// `V(a,b)`, the voltage of `a` minus the voltage of `b`.
    VoltageAcross(String, String),
    /// Branch current of a voltage source, inductor or switch, `I(L1)`.
    BranchCurrent(String),
}

impl fmt::Display for OutputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSpec::NodeVoltage(node) => write!(f, "V({node})"),
            OutputSpec::VoltageAcross(a, b) => write!(f, "V({a},{b})"),
            OutputSpec::BranchCurrent(name) => write!(f, "I({name})"),
        }
    }
}

impl FromStr for OutputSpec {
    type Err = ReductionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReductionError::UnknownOutput {
            output: s.to_string(),
            reason: "expected V(node), V(a,b) or I(element)",
        };
        let text = s.trim();
        let (head, rest) = text.split_at_checked(1).ok_or_else(invalid)?;
        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let args: Vec<&str> = inner.split(',').map(str::trim).collect();
        if args.iter().any(|a| a.is_empty()) {
            return Err(invalid());
        }
        match (head, args.as_slice()) {
            ("V" | "v", [node]) => Ok(OutputSpec::NodeVoltage(node.to_string())),
            ("V" | "v", [a, b]) => Ok(OutputSpec::VoltageAcross(a.to_string(), b.to_string())),
            ("I" | "i", [name]) => Ok(OutputSpec::BranchCurrent(name.to_string())),
            _ => Err(invalid()),
        }
    }
}

/// Which independent sources become columns of `B` and `D`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputSelection {
    #[default]
    AllSources,
    /// The named sources, in this order. Others are folded into the constant
    /// `drift` and `offset` terms.
    Named(Vec<String>),
}

/// `dx/dt = A·x + B·u + drift`, `y = C·x + D·u + offset`.
#[derive(Debug, Clone)]
pub struct StateSpaceModel<T> {
    pub a: Array2<T>,
    pub b: Array2<T>,
    pub c: Array2<T>,
    pub d: Array2<T>,
    pub drift: Array1<T>,
    pub offset: Array1<T>,
    pub states: Vec<Unknown>,
    pub state_labels: Vec<String>,
    pub input_labels: Vec<String>,
    pub output_labels: Vec<String>,
}

impl<T: Scalar> StateSpaceModel<T> {
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn input_count(&self) -> usize {
        self.input_labels.len()
    }

    pub fn output_count(&self) -> usize {
        self.output_labels.len()
    }
}

/// Split of the unknowns into states (`D`) and algebraic unknowns (`Z`).
struct Partition {
    dynamic: Vec<usize>,
    algebraic: Vec<usize>,
}

impl Partition {
    fn new<T: Scalar>(system: &LinearSystem<T>) -> Result<Self, ReductionError> {
        let n = system.dim();
        let cm = system.cm();
        let has_dynamics = |i: usize| !system.is_decoupled(i) && !cm[[i, i]].is_zero();

        // inductor currents first, then capacitor voltages
        let dynamic: Vec<usize> = (system.node_count()..n)
            .chain(0..system.node_count())
            .filter(|&i| has_dynamics(i))
            .collect();
        let algebraic: Vec<usize> = (0..n)
            .filter(|&i| !system.is_decoupled(i) && !has_dynamics(i))
            .collect();

        let labels = system.unknowns();
        for row in 0..n {
            for col in 0..n {
                if cm[[row, col]].is_zero() {
                    continue;
                }
                if !(dynamic.contains(&row) && dynamic.contains(&col)) {
                    return Err(ReductionError::AlgebraicCapacitance {
                        row: labels[row].to_string(),
                        col: labels[col].to_string(),
                    });
                }
            }
        }

        Ok(Self { dynamic, algebraic })
    }
}

fn select_inputs<'a, T>(
    excitations: &'a [Excitation<T>],
    selection: &InputSelection,
) -> Result<Vec<&'a Excitation<T>>, ReductionError> {
    match selection {
        InputSelection::AllSources => Ok(excitations.iter().collect()),
        InputSelection::Named(names) => names
            .iter()
            .map(|name| {
                excitations
                    .iter()
                    .find(|e| e.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| ReductionError::UnknownInput { name: name.clone() })
            })
            .collect(),
    }
}

/// Weights `w` with `output = w · X` over every unknown.
fn output_weights<T: Scalar>(
    system: &LinearSystem<T>,
    output: &OutputSpec,
) -> Result<Array1<T>, ReductionError> {
    let mut w = Array1::zeros(system.dim());
    let node = |label: &str| -> Result<Option<usize>, ReductionError> {
        if system.ground().as_str() == label {
            return Ok(None);
        }
        system
            .unknowns()
            .iter()
            .position(|u| matches!(u, Unknown::NodeVoltage(n) if n.as_str() == label))
            .map(Some)
            .ok_or_else(|| ReductionError::UnknownOutput {
                output: output.to_string(),
                reason: "no node with that label",
            })
    };

    match output {
        OutputSpec::NodeVoltage(label) => {
            if let Some(i) = node(label)? {
                w[i] += T::one();
            }
        }
        OutputSpec::VoltageAcross(a, b) => {
            if let Some(i) = node(a)? {
                w[i] += T::one();
            }
            if let Some(j) = node(b)? {
                w[j] -= T::one();
            }
        }
        OutputSpec::BranchCurrent(name) => {
            let i = system
                .unknowns()
                .iter()
                .position(
                    |u| matches!(u, Unknown::BranchCurrent { name: n, .. } if n.eq_ignore_ascii_case(name)),
                )
                .ok_or_else(|| ReductionError::UnknownOutput {
                    output: output.to_string(),
                    reason: "no branch-current unknown with that name",
                })?;
            w[i] += T::one();
        }
    }
    Ok(w)
}

fn label_of(system_labels: &[Unknown], indices: &[usize], singular: Singular) -> String {
    indices
        .get(singular.column)
        .map(|&i| system_labels[i].to_string())
        .unwrap_or_default()
}

/// Eliminate the algebraic unknowns of `system`.
///
/// With `H`, `P`, `q` solving `G_ZZ · [H | P | q] = [G_ZD | E_Z | b0_Z]`:
///
/// ```text
/// Cm_DD · A = G_DZ·H − G_DD          C = w_D − w_Z·H
/// Cm_DD · B = E_D − G_DZ·P           D = w_Z·P
/// Cm_DD · drift = b0_D − G_DZ·q      offset = w_Z·q
/// ```
///
/// where `E` holds the patterns of the selected sources and `b0` the
/// contribution of every other source.
pub fn reduce<T: Scalar>(
    system: &LinearSystem<T>,
    inputs: &InputSelection,
    outputs: &[OutputSpec],
    pivot_tolerance: f64,
) -> Result<StateSpaceModel<T>, ReductionError> {
    let n = system.dim();
    let unknowns = system.unknowns();
    let Partition { dynamic, algebraic } = Partition::new(system)?;
    let inputs = select_inputs(system.excitations(), inputs)?;
    let (k, m) = (dynamic.len(), inputs.len());
    log::debug!(
        "reducing {n} unknowns: {k} states, {} algebraic, {} decoupled, {m} inputs",
        algebraic.len(),
        system.decoupled().len()
    );

    let mut e = Array2::<T>::zeros((n, m));
    for (col, excitation) in inputs.iter().enumerate() {
        for &(row, sign) in &excitation.pattern {
            e[[row, col]] += T::from_f64(sign);
        }
    }
    let mut b0 = Array2::<T>::zeros((n, 1));
    for excitation in system.excitations() {
        if inputs.iter().any(|i| i.element == excitation.element) {
            continue;
        }
        for &(row, sign) in &excitation.pattern {
            b0[[row, 0]] += T::from_f64(sign) * excitation.value.clone();
        }
    }

    let g = system.g().view();
    let g_zd_e_b0 = hstack(&[g, e.view(), b0.view()]);
    let rhs_cols: Vec<usize> = dynamic.iter().copied().chain(n..n + m + 1).collect();
    let rhs = select(g_zd_e_b0.view(), &algebraic, &rhs_cols);
    let g_zz = select(g, &algebraic, &algebraic);
    let hpq = solve(g_zz.view(), rhs.view(), pivot_tolerance).map_err(|singular| {
        ReductionError::SingularAlgebraicBlock {
            unknown: label_of(unknowns, &algebraic, singular),
        }
    })?;
    let h = hpq.slice(s![.., ..k]);
    let p = hpq.slice(s![.., k..k + m]);
    let q = hpq.slice(s![.., k + m..]);

    let all_inputs: Vec<usize> = (0..m).collect();
    let g_dz = select(g, &dynamic, &algebraic);
    let g_dd = select(g, &dynamic, &dynamic);
    let e_d = select(e.view(), &dynamic, &all_inputs);
    let b0_d = select(b0.view(), &dynamic, &[0]);

    let m_dyn = matmul(g_dz.view(), h) - &g_dd;
    let n_dyn = &e_d - &matmul(g_dz.view(), p);
    let r_dyn = &b0_d - &matmul(g_dz.view(), q);

    let cm_dd = select(system.cm().view(), &dynamic, &dynamic);
    let dyn_rhs = hstack(&[m_dyn.view(), n_dyn.view(), r_dyn.view()]);
    let abr = solve(cm_dd.view(), dyn_rhs.view(), pivot_tolerance).map_err(|singular| {
        ReductionError::SingularDynamicBlock {
            unknown: label_of(unknowns, &dynamic, singular),
        }
    })?;

    let states: Vec<Unknown> = dynamic.iter().map(|&i| unknowns[i].clone()).collect();
    let state_labels: Vec<String> = states.iter().map(|u| u.to_string()).collect();

    let weights: Vec<(String, Array1<T>)> = if outputs.is_empty() {
        dynamic
            .iter()
            .map(|&i| {
                let mut w = Array1::zeros(n);
                w[i] = T::one();
                (unknowns[i].to_string(), w)
            })
            .collect()
    } else {
        outputs
            .iter()
            .map(|o| Ok((o.to_string(), output_weights(system, o)?)))
            .collect::<Result<_, ReductionError>>()?
    };

    let p_out = weights.len();
    let mut c = Array2::<T>::zeros((p_out, k));
    let mut d = Array2::<T>::zeros((p_out, m));
    let mut offset = Array1::<T>::zeros(p_out);
    for (row, (_, w)) in weights.iter().enumerate() {
        let w_z = Array2::from_shape_fn((1, algebraic.len()), |(_, j)| w[algebraic[j]].clone());
        let w_zh = matmul(w_z.view(), h);
        let w_zp = matmul(w_z.view(), p);
        let w_zq = matmul(w_z.view(), q);
        for (col, &i) in dynamic.iter().enumerate() {
            c[[row, col]] = w[i].clone() - w_zh[[0, col]].clone();
        }
        for col in 0..m {
            d[[row, col]] = w_zp[[0, col]].clone();
        }
        offset[row] = w_zq[[0, 0]].clone();
    }

    Ok(StateSpaceModel {
        a: abr.slice(s![.., ..k]).to_owned(),
        b: abr.slice(s![.., k..k + m]).to_owned(),
        drift: abr.column(k + m).to_owned(),
        c,
        d,
        offset,
        states,
        state_labels,
        input_labels: inputs.iter().map(|e| e.name.clone()).collect(),
        output_labels: weights.into_iter().map(|(label, _)| label).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("V(3)", OutputSpec::NodeVoltage("3".into()))]
    #[case("v(out, 0)", OutputSpec::VoltageAcross("out".into(), "0".into()))]
    #[case("I(L1)", OutputSpec::BranchCurrent("L1".into()))]
    fn parses_output_specs(#[case] text: &str, #[case] expected: OutputSpec) {
        assert_eq!(text.parse::<OutputSpec>().unwrap(), expected);
    }

    #[rstest]
    #[case("V3")]
    #[case("P(1)")]
    #[case("V()")]
    #[case("V(1,2,3)")]
    #[case("")]
    fn rejects_malformed_output_specs(#[case] text: &str) {
        assert!(matches!(
            text.parse::<OutputSpec>(),
            Err(ReductionError::UnknownOutput { .. })
        ));
    }
}
