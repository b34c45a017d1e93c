//! Element records for lumped linear networks and the comma separated
//! netlist format they are usually loaded from.

pub mod error;
mod lexer;
pub mod netlist_types;
mod parser;
pub mod value;

pub use error::NetlistError;
pub use lexer::{Span, TokenKind};
pub use netlist_types::{Element, ElementKind, ElementRef, GROUND, Netlist, NodeName};
pub use parser::{NetlistParser, parse};
pub use value::{Bindings, Literal, Value};
