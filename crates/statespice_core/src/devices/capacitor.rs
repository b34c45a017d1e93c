use statespice_netlist::Element;

use super::stamp::NodePairStamp;
use super::{Stamp, scalar_value};
use crate::error::StampError;
use crate::scalar::Scalar;
use crate::system::LinearSystemBuilder;

#[derive(Debug, Clone)]
pub struct Capacitor<T> {
    pub name: String,
    pub capacitance: T,
    pub stamp: NodePairStamp,
}

impl<T: Scalar> Capacitor<T> {
    pub fn new(element: &Element, pos: Option<usize>, neg: Option<usize>) -> Result<Self, StampError> {
        Ok(Self {
            name: element.name.clone(),
            capacitance: scalar_value(element, &element.value)?,
            stamp: NodePairStamp::new(pos, neg),
        })
    }
}

impl<T: Scalar> Stamp<T> for Capacitor<T> {
    fn stamp(&self, builder: &mut LinearSystemBuilder<T>) {
        log::trace!("stamp {}: c = {}", self.name, self.capacitance);
        for (row, col, sign) in self.stamp.entries() {
            builder.add_cm(row, col, T::from_f64(sign) * self.capacitance.clone());
        }
    }
}
