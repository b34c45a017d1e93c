use ndarray::{Array1, Array2};
use statespice_netlist::{ElementKind, ElementRef, NodeName};

use crate::scalar::Scalar;
use crate::topology::{Topology, Unknown};

/// Right-hand-side contribution of one independent source.
///
/// `pattern` holds the `(row, ±1)` entries the source drives; the
/// contribution to `B` is `pattern * value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Excitation<T> {
    pub element: ElementRef,
    pub name: String,
    pub kind: ElementKind,
    pub pattern: Vec<(usize, f64)>,
    pub value: T,
}

/// Accumulates stamps into `G`, `Cm` and `B`.
///
/// Only ever adds, so the result does not depend on the order devices are
/// stamped in.
#[derive(Debug)]
pub struct LinearSystemBuilder<T> {
    g: Array2<T>,
    cm: Array2<T>,
    b: Array1<T>,
    excitations: Vec<Excitation<T>>,
    decoupled: Vec<usize>,
    unknowns: Vec<Unknown>,
    node_count: usize,
    ground: NodeName,
}

impl<T: Scalar> LinearSystemBuilder<T> {
    pub fn new(topology: &Topology) -> Self {
        let n = topology.mna_matrix_dim();
        Self {
            g: Array2::zeros((n, n)),
            cm: Array2::zeros((n, n)),
            b: Array1::zeros(n),
            excitations: Vec::new(),
            decoupled: Vec::new(),
            unknowns: topology.unknowns(),
            node_count: topology.nodes_len(),
            ground: topology.ground().clone(),
        }
    }

    pub fn dim(&self) -> usize {
        self.unknowns.len()
    }

    pub fn add_g(&mut self, row: usize, col: usize, value: T) {
        self.g[[row, col]] += value;
    }

    pub fn add_cm(&mut self, row: usize, col: usize, value: T) {
        self.cm[[row, col]] += value;
    }

    pub fn add_rhs(&mut self, row: usize, value: T) {
        self.b[row] += value;
    }

    /// Stamp a source into `B` and remember its pattern so the reducer can
    /// treat it as an input.
    pub fn add_excitation(&mut self, excitation: Excitation<T>) {
        for &(row, sign) in &excitation.pattern {
            let contribution = T::from_f64(sign) * excitation.value.clone();
            self.add_rhs(row, contribution);
        }
        self.excitations.push(excitation);
    }

    /// Record a branch unknown that no equation references.
    pub fn mark_decoupled(&mut self, index: usize) {
        if !self.decoupled.contains(&index) {
            self.decoupled.push(index);
        }
    }

    pub fn finish(mut self) -> LinearSystem<T> {
        self.decoupled.sort_unstable();
        LinearSystem {
            g: self.g,
            cm: self.cm,
            b: self.b,
            excitations: self.excitations,
            decoupled: self.decoupled,
            unknowns: self.unknowns,
            node_count: self.node_count,
            ground: self.ground,
        }
    }
}

/// Assembled `G·X + Cm·dX/dt = B`.
#[derive(Debug, Clone)]
pub struct LinearSystem<T> {
    g: Array2<T>,
    cm: Array2<T>,
    b: Array1<T>,
    excitations: Vec<Excitation<T>>,
    decoupled: Vec<usize>,
    unknowns: Vec<Unknown>,
    node_count: usize,
    ground: NodeName,
}

impl<T: Scalar> LinearSystem<T> {
    pub fn g(&self) -> &Array2<T> {
        &self.g
    }

    pub fn cm(&self) -> &Array2<T> {
        &self.cm
    }

    pub fn b(&self) -> &Array1<T> {
        &self.b
    }

    pub fn dim(&self) -> usize {
        self.unknowns.len()
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn ground(&self) -> &NodeName {
        &self.ground
    }

    pub fn unknowns(&self) -> &[Unknown] {
        &self.unknowns
    }

    /// `V(node)` / `I(element)` labels in MNA order.
    pub fn labels(&self) -> Vec<String> {
        self.unknowns.iter().map(|u| u.to_string()).collect()
    }

    pub fn excitations(&self) -> &[Excitation<T>] {
        &self.excitations
    }

    /// Branch unknowns pinned to zero (open switches).
    pub fn decoupled(&self) -> &[usize] {
        &self.decoupled
    }

    pub fn is_decoupled(&self, index: usize) -> bool {
        self.decoupled.binary_search(&index).is_ok()
    }

    pub fn is_g_symmetric(&self) -> bool {
        is_symmetric(&self.g)
    }

    pub fn is_cm_symmetric(&self) -> bool {
        is_symmetric(&self.cm)
    }
}

fn is_symmetric<T: Scalar>(m: &Array2<T>) -> bool {
    let n = m.nrows();
    (0..n).all(|i| (i + 1..n).all(|j| m[[i, j]] == m[[j, i]]))
}
