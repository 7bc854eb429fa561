//! Output structures of a distillation run.
//!
//! These are built fresh per `distill` call and read-only thereafter.
//! Consumers (netlist exporters, rule checkers, BOM generators) depend only
//! on this shape, never on the engine's internal net-group identities.

use serde::{Deserialize, Serialize};

/// One pin of a distilled component with its final canonical net name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistilledPin {
    pub number: String,
    pub name: String,
    pub net: String,
}

/// Output entity for one placed symbol instance.  Pins appear in the
/// library-declared order of the instance's selected unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistilledComponent {
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<String>,
    pub pins: Vec<DistilledPin>,
}

impl DistilledComponent {
    /// Net attached to a pin number, if the pin exists.
    pub fn net_of(&self, pin_number: &str) -> Option<&str> {
        self.pins
            .iter()
            .find(|pin| pin.number == pin_number)
            .map(|pin| pin.net.as_str())
    }
}

/// A `reference`/`pin number` pair identifying one attachment of a net.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinRef {
    pub reference: String,
    pub pin: String,
}

/// One final net with its sorted pin membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistilledNet {
    pub name: String,
    pub pins: Vec<PinRef>,
}

/// The distilled schematic: every component with its pin→net mapping, plus
/// the net membership table.  Ordering is fully deterministic – components
/// in natural reference order, nets by name, pins within a net sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistilledSchematic {
    pub components: Vec<DistilledComponent>,
    pub nets: Vec<DistilledNet>,
}

impl DistilledSchematic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(&self, reference: &str) -> Option<&DistilledComponent> {
        self.components
            .iter()
            .find(|component| component.reference == reference)
    }

    pub fn net(&self, name: &str) -> Option<&DistilledNet> {
        self.nets.iter().find(|net| net.name == name)
    }

    /// Sort into canonical order: components by natural reference order
    /// (`R2` before `R10`), nets by name, net membership by reference/pin.
    pub fn sort(&mut self) {
        self.components
            .sort_by(|a, b| natord::compare(&a.reference, &b.reference));
        for net in &mut self.nets {
            net.pins.sort();
        }
        self.nets.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Serialise to canonical (deterministic) JSON.
    /// Uses RFC 8785 canonical JSON format with sorted keys.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, canon_json::CanonicalFormatter::new());
        serde::Serialize::serialize(self, &mut ser)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(number: &str, net: &str) -> DistilledPin {
        DistilledPin {
            number: number.to_owned(),
            name: String::new(),
            net: net.to_owned(),
        }
    }

    #[test]
    fn sort_uses_natural_reference_order() {
        let mut schematic = DistilledSchematic::new();
        for reference in ["R10", "R2", "C1"] {
            schematic.components.push(DistilledComponent {
                reference: reference.to_owned(),
                value: None,
                footprint: None,
                pins: vec![],
            });
        }
        schematic.sort();
        let order: Vec<_> = schematic
            .components
            .iter()
            .map(|c| c.reference.as_str())
            .collect();
        assert_eq!(order, vec!["C1", "R2", "R10"]);
    }

    #[test]
    fn net_lookup_by_pin_number() {
        let component = DistilledComponent {
            reference: "U1".to_owned(),
            value: None,
            footprint: None,
            pins: vec![pin("1", "VCC"), pin("2", "GND")],
        };
        assert_eq!(component.net_of("2"), Some("GND"));
        assert_eq!(component.net_of("3"), None);
    }

    #[test]
    fn to_json_is_stable_across_calls() {
        let mut schematic = DistilledSchematic::new();
        schematic.components.push(DistilledComponent {
            reference: "U1".to_owned(),
            value: Some("MCU".to_owned()),
            footprint: None,
            pins: vec![pin("1", "VCC")],
        });
        schematic.nets.push(DistilledNet {
            name: "VCC".to_owned(),
            pins: vec![PinRef {
                reference: "U1".to_owned(),
                pin: "1".to_owned(),
            }],
        });
        schematic.sort();

        let first = schematic.to_json().unwrap();
        let second = schematic.to_json().unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"VCC\""));
    }
}
