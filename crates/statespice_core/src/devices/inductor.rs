use statespice_netlist::Element;

use super::stamp::NodeBranchPairStamp;
use super::{Stamp, scalar_value};
use crate::error::StampError;
use crate::scalar::Scalar;
use crate::system::LinearSystemBuilder;

#[derive(Debug, Clone)]
pub struct Inductor<T> {
    pub name: String,
    pub inductance: T,
    pub stamp: NodeBranchPairStamp,
}

impl<T: Scalar> Inductor<T> {
    pub fn new(
        element: &Element,
        pos: Option<usize>,
        neg: Option<usize>,
        branch: usize,
    ) -> Result<Self, StampError> {
        Ok(Self {
            name: element.name.clone(),
            inductance: scalar_value(element, &element.value)?,
            stamp: NodeBranchPairStamp::new(pos, neg, branch),
        })
    }
}

impl<T: Scalar> Stamp<T> for Inductor<T> {
    // Branch row reads v(pos) - v(neg) - L di/dt = 0.
    fn stamp(&self, builder: &mut LinearSystemBuilder<T>) {
        log::trace!("stamp {}: l = {} on branch {}", self.name, self.inductance, self.stamp.branch);
        for (row, col, sign) in self.stamp.incidence() {
            builder.add_g(row, col, T::from_f64(sign));
        }
        let branch = self.stamp.branch;
        builder.add_cm(branch, branch, -self.inductance.clone());
    }
}
