use std::collections::HashMap;
use std::fmt;

use statespice_netlist::{Element, ElementRef, Netlist, NodeName};

use crate::error::TopologyError;

/// One column of the MNA system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unknown {
    NodeVoltage(NodeName),
    BranchCurrent { element: ElementRef, name: String },
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unknown::NodeVoltage(node) => write!(f, "V({node})"),
            Unknown::BranchCurrent { name, .. } => write!(f, "I({name})"),
        }
    }
}

/// Dense indices for the unknowns of a netlist.
///
/// Node voltages occupy `0..nodes_len()` in first-seen order, terminal A before
/// terminal B. Branch currents of voltage sources, inductors and switches
/// follow at `nodes_len()..mna_matrix_dim()` in declaration order.
#[derive(Debug, Clone)]
pub struct Topology {
    ground: NodeName,
    node_mapping: HashMap<NodeName, usize>,
    node_names: Vec<NodeName>,
    branch_mapping: HashMap<ElementRef, usize>,
    branch_names: Vec<(ElementRef, String)>,
}

impl Topology {
    pub fn resolve(netlist: &Netlist, ground: &str) -> Result<Self, TopologyError> {
        let mut topology = Self {
            ground: NodeName::new(ground),
            node_mapping: HashMap::new(),
            node_names: Vec::new(),
            branch_mapping: HashMap::new(),
            branch_names: Vec::new(),
        };

        let mut seen: HashMap<String, ElementRef> = HashMap::new();
        for (element_ref, element) in netlist.iter() {
            if seen
                .insert(element.name.to_ascii_uppercase(), element_ref)
                .is_some()
            {
                return Err(TopologyError::DuplicateElement {
                    name: element.name.clone(),
                });
            }
            for node in element.nodes() {
                topology.insert_node(element, node)?;
            }
            if element.kind.has_branch_current() {
                topology.insert_branch(element_ref, &element.name);
            }
        }

        log::debug!(
            "resolved {} nodes and {} branch currents (ground '{}')",
            topology.nodes_len(),
            topology.branches_len(),
            topology.ground
        );
        Ok(topology)
    }

    fn insert_node(&mut self, element: &Element, node: &NodeName) -> Result<(), TopologyError> {
        if node.as_str().trim().is_empty() {
            return Err(TopologyError::EmptyNodeLabel {
                element: element.name.clone(),
            });
        }
        if *node == self.ground || self.node_mapping.contains_key(node) {
            return Ok(());
        }
        self.node_mapping.insert(node.clone(), self.node_names.len());
        self.node_names.push(node.clone());
        Ok(())
    }

    fn insert_branch(&mut self, element: ElementRef, name: &str) {
        self.branch_mapping.insert(element, self.branch_names.len());
        self.branch_names.push((element, name.to_string()));
    }

    pub fn ground(&self) -> &NodeName {
        &self.ground
    }

    pub fn nodes_len(&self) -> usize {
        self.node_names.len()
    }

    pub fn branches_len(&self) -> usize {
        self.branch_names.len()
    }

    pub fn mna_matrix_dim(&self) -> usize {
        self.nodes_len() + self.branches_len()
    }

    /// MNA row of a node voltage. `Ok(None)` for the ground node.
    pub fn mna_node_index(
        &self,
        element: &Element,
        node: &NodeName,
    ) -> Result<Option<usize>, TopologyError> {
        if *node == self.ground {
            return Ok(None);
        }
        match self.node_mapping.get(node) {
            Some(index) => Ok(Some(*index)),
            None if node.as_str().trim().is_empty() => Err(TopologyError::EmptyNodeLabel {
                element: element.name.clone(),
            }),
            None => Err(TopologyError::UnknownNode {
                element: element.name.clone(),
                label: node.to_string(),
            }),
        }
    }

    /// MNA rows of both terminals of a two-terminal element.
    pub fn terminals(
        &self,
        element: &Element,
    ) -> Result<(Option<usize>, Option<usize>), TopologyError> {
        Ok((
            self.mna_node_index(element, &element.positive)?,
            self.mna_node_index(element, &element.negative)?,
        ))
    }

    /// MNA row of an element's branch current.
    pub fn mna_branch_index(
        &self,
        element_ref: ElementRef,
        element: &Element,
    ) -> Result<usize, TopologyError> {
        self.branch_mapping
            .get(&element_ref)
            .map(|i| self.nodes_len() + i)
            .ok_or_else(|| TopologyError::MissingBranch {
                element: element.name.clone(),
            })
    }

    /// Lookup by node label, `None` for ground and for labels not in the netlist.
    pub fn node(&self, label: &str) -> Option<usize> {
        self.node_mapping.get(&NodeName::new(label)).copied()
    }

    pub fn is_ground(&self, label: &str) -> bool {
        self.ground.as_str() == label
    }

    /// Lookup by element name (case-insensitive).
    pub fn branch(&self, name: &str) -> Option<usize> {
        self.branch_names
            .iter()
            .position(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|i| self.nodes_len() + i)
    }

    pub fn node_names_mna_order(&self) -> &[NodeName] {
        &self.node_names
    }

    /// Every unknown, in MNA order.
    pub fn unknowns(&self) -> Vec<Unknown> {
        self.node_names
            .iter()
            .cloned()
            .map(Unknown::NodeVoltage)
            .chain(
                self.branch_names
                    .iter()
                    .map(|(element, name)| Unknown::BranchCurrent {
                        element: *element,
                        name: name.clone(),
                    }),
            )
            .collect()
    }
}
