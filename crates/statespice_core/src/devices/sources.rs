use statespice_netlist::{Element, ElementKind, ElementRef};

use super::stamp::{NodeBranchPairStamp, NodePairStamp};
use super::{Stamp, scalar_value};
use crate::error::StampError;
use crate::scalar::Scalar;
use crate::system::{Excitation, LinearSystemBuilder};

/// Ideal voltage source. Its branch row enforces `v(pos) - v(neg) = V`.
#[derive(Debug, Clone)]
pub struct VoltageSource<T> {
    pub element: ElementRef,
    pub name: String,
    pub value: T,
    pub stamp: NodeBranchPairStamp,
}

impl<T: Scalar> VoltageSource<T> {
    pub fn new(
        element_ref: ElementRef,
        element: &Element,
        pos: Option<usize>,
        neg: Option<usize>,
        branch: usize,
    ) -> Result<Self, StampError> {
        Ok(Self {
            element: element_ref,
            name: element.name.clone(),
            value: scalar_value(element, &element.value)?,
            stamp: NodeBranchPairStamp::new(pos, neg, branch),
        })
    }
}

impl<T: Scalar> Stamp<T> for VoltageSource<T> {
    fn stamp(&self, builder: &mut LinearSystemBuilder<T>) {
        log::trace!("stamp {}: v = {} on branch {}", self.name, self.value, self.stamp.branch);
        for (row, col, sign) in self.stamp.incidence() {
            builder.add_g(row, col, T::from_f64(sign));
        }
        builder.add_excitation(Excitation {
            element: self.element,
            name: self.name.clone(),
            kind: ElementKind::VoltageSource,
            pattern: vec![(self.stamp.branch, 1.0)],
            value: self.value.clone(),
        });
    }
}

/// Ideal current source driving current from `pos` through the source to `neg`.
#[derive(Debug, Clone)]
pub struct CurrentSource<T> {
    pub element: ElementRef,
    pub name: String,
    pub value: T,
    pub stamp: NodePairStamp,
}

impl<T: Scalar> CurrentSource<T> {
    pub fn new(
        element_ref: ElementRef,
        element: &Element,
        pos: Option<usize>,
        neg: Option<usize>,
    ) -> Result<Self, StampError> {
        Ok(Self {
            element: element_ref,
            name: element.name.clone(),
            value: scalar_value(element, &element.value)?,
            stamp: NodePairStamp::new(pos, neg),
        })
    }
}

impl<T: Scalar> Stamp<T> for CurrentSource<T> {
    fn stamp(&self, builder: &mut LinearSystemBuilder<T>) {
        log::trace!("stamp {}: i = {}", self.name, self.value);
        builder.add_excitation(Excitation {
            element: self.element,
            name: self.name.clone(),
            kind: ElementKind::CurrentSource,
            pattern: self.stamp.injection(),
            value: self.value.clone(),
        });
    }
}
