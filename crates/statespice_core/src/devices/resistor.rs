use statespice_netlist::{Element, Value};

use super::stamp::NodePairStamp;
use super::{Stamp, scalar_value};
use crate::error::StampError;
use crate::scalar::Scalar;
use crate::system::LinearSystemBuilder;

#[derive(Debug, Clone)]
pub struct Resistor<T> {
    pub name: String,
    /// `1/R`; zero for an infinite resistance.
    pub conductance: T,
    pub stamp: NodePairStamp,
}

impl<T: Scalar> Resistor<T> {
    pub fn new(element: &Element, pos: Option<usize>, neg: Option<usize>) -> Result<Self, StampError> {
        let conductance = match element.value {
            Value::Numeric(r) if r.is_infinite() => {
                log::warn!("{} has infinite resistance and stamps nothing", element.name);
                T::zero()
            }
            ref value => {
                let resistance: T = scalar_value(element, value)?;
                if resistance.is_zero() {
                    return Err(StampError::SingularStamp {
                        element: element.name.clone(),
                    });
                }
                resistance.recip()
            }
        };

        Ok(Self {
            name: element.name.clone(),
            conductance,
            stamp: NodePairStamp::new(pos, neg),
        })
    }
}

impl<T: Scalar> Stamp<T> for Resistor<T> {
    fn stamp(&self, builder: &mut LinearSystemBuilder<T>) {
        log::trace!("stamp {}: g = {}", self.name, self.conductance);
        for (row, col, sign) in self.stamp.entries() {
            builder.add_g(row, col, T::from_f64(sign) * self.conductance.clone());
        }
    }
}
