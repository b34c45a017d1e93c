use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::netlist_types::ValueSuffix;

/// A numeric literal as written in the netlist, before scaling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub value: f64,
    pub exponent: Option<f64>,
    pub suffix: Option<ValueSuffix>,
}

impl Literal {
    pub fn new(value: f64, exponent: Option<f64>, suffix: Option<ValueSuffix>) -> Self {
        Self {
            value,
            exponent,
            suffix,
        }
    }

    pub fn get_value(&self) -> f64 {
        let mut value = self.value;
        if let Some(exponent) = self.exponent {
            value *= 10.0f64.powf(exponent);
        }
        if let Some(suffix) = &self.suffix {
            value *= suffix.scale();
        }
        value
    }
}

/// Element value: a number, a named parameter, or absent.
///
/// `Unresolved` is only meaningful for switches and ideal diodes, whose
/// conductance is decided by the switch configuration rather than the netlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Numeric(f64),
    Symbolic(String),
    Unresolved,
}

impl Value {
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbolic(name.into())
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Value::Unresolved)
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numeric(v)
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        Value::Numeric(literal.get_value())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(v) => write!(f, "{v}"),
            Value::Symbolic(name) => write!(f, "{name}"),
            Value::Unresolved => write!(f, "<unresolved>"),
        }
    }
}

/// Numeric values for named parameters, used to turn a parametric netlist
/// into a numeric one.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, f64>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace a bound symbol by its number. Unbound symbols are kept as-is.
    pub fn substitute(&self, value: &Value) -> Value {
        match value {
            Value::Symbolic(name) => match self.get(name) {
                Some(v) => Value::Numeric(v),
                None => value.clone(),
            },
            other => other.clone(),
        }
    }
}

impl FromIterator<(String, f64)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_applies_exponent_then_suffix() {
        let literal = Literal::new(1.5, Some(2.0), Some(ValueSuffix::Milli));
        assert!((literal.get_value() - 0.15).abs() < 1e-15);
    }

    #[test]
    fn substitute_leaves_unbound_symbols() {
        let bindings: Bindings = [("R".to_string(), 10.0)].into_iter().collect();
        assert_eq!(bindings.substitute(&Value::symbol("R")), Value::Numeric(10.0));
        assert_eq!(bindings.substitute(&Value::symbol("L")), Value::symbol("L"));
        assert_eq!(bindings.substitute(&Value::Unresolved), Value::Unresolved);
    }

    #[test]
    fn later_binding_replaces_earlier() {
        let mut bindings = Bindings::new();
        bindings.set("C", 1e-6);
        bindings.set("C".to_string(), 2e-6);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("C"), Some(2e-6));
        assert_eq!(bindings.get("c"), None);
    }
}
