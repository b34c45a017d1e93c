use statespice_netlist::Element;

use super::stamp::NodeBranchPairStamp;
use super::{Stamp, scalar_value};
use crate::error::StampError;
use crate::scalar::Scalar;
use crate::switches::ResolvedSwitch;
use crate::system::LinearSystemBuilder;

#[derive(Debug, Clone)]
pub enum SwitchStamp<T> {
    /// Branch current pinned to zero; nothing is stamped.
    Open,
    /// 0 V source on the branch, with `v(pos) - v(neg) - Ron·i = 0` when an
    /// on-resistance is given.
    Closed { on_resistance: Option<T> },
}

#[derive(Debug, Clone)]
pub struct Switch<T> {
    pub name: String,
    pub state: SwitchStamp<T>,
    pub stamp: NodeBranchPairStamp,
}

impl<T: Scalar> Switch<T> {
    pub fn new(
        element: &Element,
        pos: Option<usize>,
        neg: Option<usize>,
        branch: usize,
        resolved: &ResolvedSwitch,
    ) -> Result<Self, StampError> {
        let state = match resolved {
            ResolvedSwitch::Open => SwitchStamp::Open,
            ResolvedSwitch::Closed {
                on_resistance: None,
            } => SwitchStamp::Closed {
                on_resistance: None,
            },
            ResolvedSwitch::Closed {
                on_resistance: Some(value),
            } => SwitchStamp::Closed {
                on_resistance: Some(scalar_value(element, value)?),
            },
        };
        Ok(Self {
            name: element.name.clone(),
            state,
            stamp: NodeBranchPairStamp::new(pos, neg, branch),
        })
    }
}

impl<T: Scalar> Stamp<T> for Switch<T> {
    fn stamp(&self, builder: &mut LinearSystemBuilder<T>) {
        match &self.state {
            SwitchStamp::Open => {
                log::warn!(
                    "{} is open; its branch current is decoupled and pinned to zero",
                    self.name
                );
                builder.mark_decoupled(self.stamp.branch);
            }
            SwitchStamp::Closed { on_resistance } => {
                log::trace!("stamp {}: closed on branch {}", self.name, self.stamp.branch);
                for (row, col, sign) in self.stamp.incidence() {
                    builder.add_g(row, col, T::from_f64(sign));
                }
                if let Some(ron) = on_resistance {
                    let branch = self.stamp.branch;
                    builder.add_g(branch, branch, -ron.clone());
                }
            }
        }
    }
}
