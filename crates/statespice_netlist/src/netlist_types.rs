use std::fmt;

use serde::Serialize;

use crate::error::NetlistError;
use crate::lexer::Span;
use crate::value::{Bindings, Value};

/// Label every netlist reserves for the reference node.
pub const GROUND: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementKind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    /// Ideal switch. Ideal diodes (`D`) are modelled as switches too.
    Switch,
}

impl ElementKind {
    pub fn from_designator(c: char) -> Option<ElementKind> {
        match c.to_ascii_uppercase() {
            'R' => Some(ElementKind::Resistor),
            'C' => Some(ElementKind::Capacitor),
            'L' => Some(ElementKind::Inductor),
            'V' => Some(ElementKind::VoltageSource),
            'I' => Some(ElementKind::CurrentSource),
            'S' | 'D' => Some(ElementKind::Switch),
            _ => None,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            ElementKind::Resistor => 'R',
            ElementKind::Capacitor => 'C',
            ElementKind::Inductor => 'L',
            ElementKind::VoltageSource => 'V',
            ElementKind::CurrentSource => 'I',
            ElementKind::Switch => 'S',
        }
    }

    /// Whether the element owns a branch-current unknown in the MNA system.
    pub fn has_branch_current(&self) -> bool {
        matches!(
            self,
            ElementKind::Inductor | ElementKind::VoltageSource | ElementKind::Switch
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeName(pub String);

impl NodeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of an element in its netlist (declaration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementRef(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
    pub positive: NodeName,
    pub negative: NodeName,
    pub value: Value,
    pub span: Option<Span>,
}

impl Element {
    /// Build an element, deriving its kind from the first character of `name`.
    pub fn new(
        name: impl Into<String>,
        positive: impl Into<String>,
        negative: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, NetlistError> {
        let name = name.into();
        let designator = name
            .chars()
            .next()
            .ok_or(NetlistError::EmptyElementName { span: None })?;
        let kind = ElementKind::from_designator(designator).ok_or_else(|| {
            NetlistError::UnsupportedElement {
                name: name.clone(),
                designator,
                span: None,
            }
        })?;
        Ok(Self {
            name,
            kind,
            positive: NodeName::new(positive),
            negative: NodeName::new(negative),
            value: value.into(),
            span: None,
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn nodes(&self) -> [&NodeName; 2] {
        [&self.positive, &self.negative]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Netlist {
    pub elements: Vec<Element>,
}

impl Netlist {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, element: ElementRef) -> Option<&Element> {
        self.elements.get(element.0)
    }

    pub fn find(&self, name: &str) -> Option<ElementRef> {
        self.elements
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
            .map(ElementRef)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementRef, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementRef(i), e))
    }

    /// Copy of the netlist with every bound symbol replaced by its number.
    pub fn bind(&self, bindings: &Bindings) -> Netlist {
        let elements = self
            .elements
            .iter()
            .map(|e| Element {
                value: bindings.substitute(&e.value),
                ..e.clone()
            })
            .collect();
        Netlist { elements }
    }

    /// Symbols referenced by element values, in first-use order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = Vec::new();
        for element in &self.elements {
            if let Value::Symbolic(name) = &element.value {
                if !symbols.contains(&name.as_str()) {
                    symbols.push(name);
                }
            }
        }
        symbols
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValueSuffix {
    Tera,
    Giga,
    Mega,
    Kilo,
    Milli,
    Micro,
    Nano,
    Pico,
    Femto,
    Atto,
}

impl ValueSuffix {
    /// SPICE scale suffixes are case-insensitive; `M` is milli, `Meg` is mega.
    pub fn from_str(s: &str) -> Option<ValueSuffix> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            s if s.starts_with("meg") => Some(ValueSuffix::Mega),
            s if s.starts_with('t') => Some(ValueSuffix::Tera),
            s if s.starts_with('g') => Some(ValueSuffix::Giga),
            s if s.starts_with('k') => Some(ValueSuffix::Kilo),
            s if s.starts_with('m') => Some(ValueSuffix::Milli),
            s if s.starts_with('u') => Some(ValueSuffix::Micro),
            s if s.starts_with('n') => Some(ValueSuffix::Nano),
            s if s.starts_with('p') => Some(ValueSuffix::Pico),
            s if s.starts_with('f') => Some(ValueSuffix::Femto),
            s if s.starts_with('a') => Some(ValueSuffix::Atto),
            // unit names such as `V` or `Ohm` carry no scale
            _ => None,
        }
    }

    pub fn scale(&self) -> f64 {
        match self {
            ValueSuffix::Tera => 1e12,
            ValueSuffix::Giga => 1e9,
            ValueSuffix::Mega => 1e6,
            ValueSuffix::Kilo => 1e3,
            ValueSuffix::Milli => 1e-3,
            ValueSuffix::Micro => 1e-6,
            ValueSuffix::Nano => 1e-9,
            ValueSuffix::Pico => 1e-12,
            ValueSuffix::Femto => 1e-15,
            ValueSuffix::Atto => 1e-18,
        }
    }
}
