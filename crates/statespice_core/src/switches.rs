use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use statespice_netlist::{ElementKind, ElementRef, Netlist, Value};

use crate::error::SwitchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchState {
    Open,
    Closed,
}

impl FromStr for SwitchState {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "off" | "0" => Ok(SwitchState::Open),
            "closed" | "close" | "on" | "1" => Ok(SwitchState::Closed),
            _ => Err(SwitchError::InvalidState {
                state: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchState::Open => f.write_str("open"),
            SwitchState::Closed => f.write_str("closed"),
        }
    }
}

/// State of every switch and ideal diode for one build. Names are matched
/// case-insensitively; the last entry for a name wins.
#[derive(Debug, Clone, Default)]
pub struct SwitchConfig {
    states: Vec<(String, SwitchState)>,
}

impl SwitchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, state: SwitchState) {
        let name = name.into();
        self.states.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.states.push((name, state));
    }

    pub fn with(mut self, name: impl Into<String>, state: SwitchState) -> Self {
        self.set(name, state);
        self
    }

    pub fn get(&self, name: &str) -> Option<SwitchState> {
        self.states
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SwitchState)> {
        self.states.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, SwitchState)> for SwitchConfig {
    fn from_iter<I: IntoIterator<Item = (S, SwitchState)>>(iter: I) -> Self {
        let mut config = SwitchConfig::new();
        for (name, state) in iter {
            config.set(name, state);
        }
        config
    }
}

/// The branch of the piecewise switch stamp selected for one build.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSwitch {
    Open,
    Closed { on_resistance: Option<Value> },
}

/// Match a switch configuration against the switches of a netlist.
///
/// Every switch must be configured, and every configured name must be a
/// switch in the netlist.
pub fn resolve_switches(
    netlist: &Netlist,
    config: &SwitchConfig,
) -> Result<HashMap<ElementRef, ResolvedSwitch>, SwitchError> {
    for (name, _) in config.iter() {
        let element_ref = netlist
            .find(name)
            .ok_or_else(|| SwitchError::UnknownElement {
                name: name.to_string(),
            })?;
        let is_switch = netlist
            .get(element_ref)
            .is_some_and(|e| e.kind == ElementKind::Switch);
        if !is_switch {
            return Err(SwitchError::NotASwitch {
                name: name.to_string(),
            });
        }
    }

    let mut resolved = HashMap::new();
    for (element_ref, element) in netlist.iter() {
        if element.kind != ElementKind::Switch {
            continue;
        }
        let state = config
            .get(&element.name)
            .ok_or_else(|| SwitchError::Unconfigured {
                name: element.name.clone(),
            })?;
        let switch = match state {
            SwitchState::Open => ResolvedSwitch::Open,
            SwitchState::Closed => ResolvedSwitch::Closed {
                on_resistance: (!element.value.is_unresolved()).then(|| element.value.clone()),
            },
        };
        log::debug!("{} resolved {}", element.name, state);
        resolved.insert(element_ref, switch);
    }
    Ok(resolved)
}
