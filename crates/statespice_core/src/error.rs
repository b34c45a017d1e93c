use thiserror::Error;

#[derive(Debug, Error)]
pub enum MnaError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Stamp(#[from] StampError),

    #[error(transparent)]
    Switch(#[from] SwitchError),

    #[error(transparent)]
    Reduction(#[from] ReductionError),
}

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("element '{element}' has an empty node label")]
    EmptyNodeLabel { element: String },

    #[error("element '{element}' references unknown node '{label}'")]
    UnknownNode { element: String, label: String },

    #[error("element '{element}' needs a branch-current unknown but none was assigned")]
    MissingBranch { element: String },

    #[error("element '{name}' is declared more than once")]
    DuplicateElement { name: String },
}

#[derive(Debug, Error)]
pub enum StampError {
    #[error("element '{element}' has zero resistance; model a short as a closed switch")]
    SingularStamp { element: String },

    #[error("element '{element}' has no value")]
    MissingValue { element: String },

    #[error("element '{element}' uses symbol '{symbol}' which has no numeric binding")]
    UnboundSymbol { element: String, symbol: String },
}

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("switch '{name}' has no state in the switch configuration")]
    Unconfigured { name: String },

    #[error("switch configuration names '{name}' which is not in the netlist")]
    UnknownElement { name: String },

    #[error("switch configuration names '{name}' which is not a switch")]
    NotASwitch { name: String },

    #[error("invalid switch state '{state}' (expected open or closed)")]
    InvalidState { state: String },
}

#[derive(Debug, Error)]
pub enum ReductionError {
    #[error("algebraic block is singular at unknown {unknown}")]
    SingularAlgebraicBlock { unknown: String },

    #[error("capacitance block is singular at state {unknown}")]
    SingularDynamicBlock { unknown: String },

    #[error("capacitance entry ({row}, {col}) couples an algebraic unknown")]
    AlgebraicCapacitance { row: String, col: String },

    #[error("unknown output '{output}': {reason}")]
    UnknownOutput { output: String, reason: &'static str },

    #[error("unknown input '{name}': no independent source with that name")]
    UnknownInput { name: String },
}
