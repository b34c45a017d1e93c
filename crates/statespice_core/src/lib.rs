//! Modified nodal analysis of lumped linear networks and reduction of the
//! resulting descriptor system to an explicit state-space model.
//!
//! ```text
//! Netlist ──► Topology ──► stamps ──► LinearSystem (G·X + Cm·dX/dt = B)
//!                             ▲                     │
//!                    switch configuration           ▼
//!                                      StateSpaceModel (A, B, C, D)
//! ```
//!
//! Everything past the netlist is generic over [`Scalar`], so the same code
//! produces numeric matrices (`f64`) or closed-form ones ([`Expr`]).

pub(crate) mod devices;
pub mod error;
pub mod linalg;
pub mod reduce;
pub mod scalar;
pub mod switches;
pub mod symbolic;
pub mod system;
pub mod topology;

use statespice_netlist::{GROUND, Netlist};

use crate::devices::{Device, Stamp};

pub use error::{MnaError, ReductionError, StampError, SwitchError, TopologyError};
pub use reduce::{InputSelection, OutputSpec, StateSpaceModel, reduce};
pub use scalar::Scalar;
pub use switches::{ResolvedSwitch, SwitchConfig, SwitchState, resolve_switches};
pub use symbolic::Expr;
pub use system::{Excitation, LinearSystem, LinearSystemBuilder};
pub use topology::{Topology, Unknown};

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Label of the reference node.
    pub ground: String,
    /// Smallest usable pivot of an equilibrated numeric block. Exact scalars
    /// ignore it.
    pub pivot_tolerance: f64,
    pub inputs: InputSelection,
    /// Rows of `C`/`D`; every state when empty.
    pub outputs: Vec<OutputSpec>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ground: GROUND.to_string(),
            pivot_tolerance: 1e-12,
            inputs: InputSelection::AllSources,
            outputs: Vec::new(),
        }
    }
}

/// A netlist assembled into its MNA system for one switch configuration.
#[derive(Debug, Clone)]
pub struct Circuit<T> {
    topology: Topology,
    system: LinearSystem<T>,
}

pub type NumericCircuit = Circuit<f64>;
pub type SymbolicCircuit = Circuit<Expr>;

impl<T: Scalar> Circuit<T> {
    pub fn assemble(
        netlist: &Netlist,
        switches: &SwitchConfig,
        config: &AnalysisConfig,
    ) -> Result<Self, MnaError> {
        let topology = Topology::resolve(netlist, &config.ground)?;
        let resolved = resolve_switches(netlist, switches)?;

        let mut builder = LinearSystemBuilder::new(&topology);
        for (element_ref, element) in netlist.iter() {
            let device: Device<T> =
                Device::from_element(element_ref, element, &topology, resolved.get(&element_ref))?;
            log::trace!("stamping {}", device.name());
            device.stamp(&mut builder);
        }
        let system = builder.finish();
        log::debug!(
            "assembled {0}x{0} system from {1} elements",
            system.dim(),
            netlist.len()
        );

        Ok(Self { topology, system })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn system(&self) -> &LinearSystem<T> {
        &self.system
    }

    pub fn unknowns(&self) -> &[Unknown] {
        self.system.unknowns()
    }

    /// Reduce to `A, B, C, D`. The assembled system stays usable on error.
    pub fn state_space(&self, config: &AnalysisConfig) -> Result<StateSpaceModel<T>, MnaError> {
        Ok(reduce(
            &self.system,
            &config.inputs,
            &config.outputs,
            config.pivot_tolerance,
        )?)
    }
}
