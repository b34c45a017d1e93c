pub(crate) mod capacitor;
pub(crate) mod inductor;
pub(crate) mod resistor;
pub(crate) mod sources;
pub(crate) mod stamp;
pub(crate) mod switch;

use statespice_netlist::{Element, ElementKind, ElementRef, Value};

use crate::error::{MnaError, StampError, SwitchError};
use crate::scalar::Scalar;
use crate::switches::ResolvedSwitch;
use crate::system::LinearSystemBuilder;
use crate::topology::Topology;

pub(crate) use capacitor::Capacitor;
pub(crate) use inductor::Inductor;
pub(crate) use resistor::Resistor;
pub(crate) use sources::{CurrentSource, VoltageSource};
pub(crate) use switch::Switch;

/// A device that knows where its contribution goes in the MNA system.
pub(crate) trait Stamp<T: Scalar> {
    fn stamp(&self, builder: &mut LinearSystemBuilder<T>);
}

/// A netlist element with its terminals resolved and its value converted.
#[derive(Debug, Clone)]
pub(crate) enum Device<T> {
    Resistor(Resistor<T>),
    Capacitor(Capacitor<T>),
    Inductor(Inductor<T>),
    VoltageSource(VoltageSource<T>),
    CurrentSource(CurrentSource<T>),
    Switch(Switch<T>),
}

impl<T: Scalar> Device<T> {
    pub fn from_element(
        element_ref: ElementRef,
        element: &Element,
        topology: &Topology,
        switch: Option<&ResolvedSwitch>,
    ) -> Result<Self, MnaError> {
        let (pos, neg) = topology.terminals(element)?;
        let device = match element.kind {
            ElementKind::Resistor => Device::Resistor(Resistor::new(element, pos, neg)?),
            ElementKind::Capacitor => Device::Capacitor(Capacitor::new(element, pos, neg)?),
            ElementKind::Inductor => {
                let branch = topology.mna_branch_index(element_ref, element)?;
                Device::Inductor(Inductor::new(element, pos, neg, branch)?)
            }
            ElementKind::VoltageSource => {
                let branch = topology.mna_branch_index(element_ref, element)?;
                Device::VoltageSource(VoltageSource::new(element_ref, element, pos, neg, branch)?)
            }
            ElementKind::CurrentSource => {
                Device::CurrentSource(CurrentSource::new(element_ref, element, pos, neg)?)
            }
            ElementKind::Switch => {
                let branch = topology.mna_branch_index(element_ref, element)?;
                let state = switch.ok_or_else(|| SwitchError::Unconfigured {
                    name: element.name.clone(),
                })?;
                Device::Switch(Switch::new(element, pos, neg, branch, state)?)
            }
        };
        Ok(device)
    }

    pub fn name(&self) -> &str {
        match self {
            Device::Resistor(d) => &d.name,
            Device::Capacitor(d) => &d.name,
            Device::Inductor(d) => &d.name,
            Device::VoltageSource(d) => &d.name,
            Device::CurrentSource(d) => &d.name,
            Device::Switch(d) => &d.name,
        }
    }
}

impl<T: Scalar> Stamp<T> for Device<T> {
    fn stamp(&self, builder: &mut LinearSystemBuilder<T>) {
        match self {
            Device::Resistor(d) => d.stamp(builder),
            Device::Capacitor(d) => d.stamp(builder),
            Device::Inductor(d) => d.stamp(builder),
            Device::VoltageSource(d) => d.stamp(builder),
            Device::CurrentSource(d) => d.stamp(builder),
            Device::Switch(d) => d.stamp(builder),
        }
    }
}

/// Convert an element value into the scalar the system is built over.
pub(crate) fn scalar_value<T: Scalar>(element: &Element, value: &Value) -> Result<T, StampError> {
    match value {
        Value::Numeric(v) => Ok(T::from_f64(*v)),
        Value::Symbolic(symbol) => {
            T::from_symbol(symbol).ok_or_else(|| StampError::UnboundSymbol {
                element: element.name.clone(),
                symbol: symbol.clone(),
            })
        }
        Value::Unresolved => Err(StampError::MissingValue {
            element: element.name.clone(),
        }),
    }
}
