//! Symbol instance resolution: combining a placed instance with its library
//! pin geometry to produce absolute, identity-tagged pin endpoints.

use sch_model::{Label, PinType, Point, SymbolInstance, SymbolLibrary};

use crate::error::DistillError;
use crate::transform::place_pin;

/// A pin of a placed instance at its absolute sheet coordinate.
///
/// Derived data – computed from the library definition and the instance
/// transform, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEndpoint {
    pub reference: String,
    pub number: String,
    pub name: String,
    pub at: Point,
    pub electrical_type: PinType,
}

/// A fully-resolved instance: its endpoints in library pin order plus the
/// implicit power labels the placement contributes.
#[derive(Debug, Clone)]
pub struct ResolvedInstance {
    pub reference: String,
    pub value: Option<String>,
    pub footprint: Option<String>,
    pub endpoints: Vec<PinEndpoint>,
    pub implicit_labels: Vec<Label>,
}

/// Resolve one instance against the symbol library.
///
/// Pure function over its inputs.  Library pin order is preserved.  A
/// library miss is an [`DistillError::UnresolvedSymbol`] (reported per
/// instance, the caller keeps going); bad rotation is a fatal
/// [`DistillError::InvalidTransform`].
///
/// Implicit power labels come from two places:
/// - every pin of a power symbol names its net (instance value wins over
///   the pin name, which is how a placed power symbol is renamed);
/// - a hidden power-input pin on an ordinary symbol connects to an implicit
///   global named after the pin.
pub fn resolve_instance(
    instance: &SymbolInstance,
    library: &dyn SymbolLibrary,
) -> Result<ResolvedInstance, DistillError> {
    let unresolved = || DistillError::UnresolvedSymbol {
        reference: instance.reference.clone(),
        symbol: instance.symbol.clone(),
        unit: instance.unit,
    };
    let definition = library.symbol(&instance.symbol).ok_or_else(unresolved)?;
    let pins = definition.unit_pins(instance.unit).ok_or_else(unresolved)?;

    let mut endpoints = Vec::with_capacity(pins.len());
    let mut implicit_labels = Vec::new();

    for pin in pins {
        let (at, _orientation) = place_pin(
            pin.at,
            pin.orientation,
            &instance.placement,
            &instance.reference,
        )?;

        if definition.power {
            let net = instance
                .value
                .clone()
                .unwrap_or_else(|| pin.name.clone());
            implicit_labels.push(Label::power(at, net));
        } else if pin.hidden && pin.electrical_type == PinType::PowerIn {
            log::debug!(
                "{}: hidden power pin {} joins implicit net '{}'",
                instance.reference,
                pin.number,
                pin.name
            );
            implicit_labels.push(Label::power(at, pin.name.clone()));
        }

        endpoints.push(PinEndpoint {
            reference: instance.reference.clone(),
            number: pin.number.clone(),
            name: pin.name.clone(),
            at,
            electrical_type: pin.electrical_type,
        });
    }

    Ok(ResolvedInstance {
        reference: instance.reference.clone(),
        value: instance.value.clone(),
        footprint: instance.footprint.clone(),
        endpoints,
        implicit_labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sch_model::{
        LabelKind, MirrorAxis, Placement, SymbolDefinition, SymbolPin, SymbolTable,
    };

    fn library() -> SymbolTable {
        SymbolTable::new()
            .with_symbol(SymbolDefinition::single_unit(
                "MCU",
                vec![
                    SymbolPin::new("1", "PA0", Point::new(-2, 0)),
                    SymbolPin::new("2", "PA1", Point::new(-2, 1)),
                    SymbolPin::new("3", "VDD", Point::new(0, -3))
                        .with_type(PinType::PowerIn)
                        .hidden(),
                ],
            ))
            .with_symbol(
                SymbolDefinition::single_unit(
                    "GND",
                    vec![SymbolPin::new("1", "GND", Point::new(0, 0)).with_type(PinType::PowerIn)],
                )
                .power_symbol(),
            )
    }

    #[test]
    fn endpoints_keep_library_order_and_identity() {
        let library = library();
        let instance = SymbolInstance::new("U1", "MCU", Placement::new(10, 10));
        let resolved = resolve_instance(&instance, &library).unwrap();

        let numbers: Vec<_> = resolved.endpoints.iter().map(|e| e.number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
        assert_eq!(resolved.endpoints[0].at, Point::new(8, 10));
        assert_eq!(resolved.endpoints[1].name, "PA1");
    }

    #[test]
    fn mirroring_moves_geometry_not_identity() {
        let library = library();
        let plain = SymbolInstance::new("U1", "MCU", Placement::new(10, 10));
        let mirrored = SymbolInstance::new(
            "U1",
            "MCU",
            Placement::new(10, 10).with_mirror(MirrorAxis::Y),
        );

        let plain = resolve_instance(&plain, &library).unwrap();
        let mirrored = resolve_instance(&mirrored, &library).unwrap();

        for (a, b) in plain.endpoints.iter().zip(&mirrored.endpoints) {
            assert_eq!(a.number, b.number);
            assert_eq!(a.name, b.name);
            assert_eq!(a.electrical_type, b.electrical_type);
        }
        assert_eq!(mirrored.endpoints[0].at, Point::new(12, 10));
        assert_eq!(mirrored.endpoints[1].at, Point::new(12, 11));
    }

    #[test]
    fn missing_symbol_is_reported() {
        let library = library();
        let instance = SymbolInstance::new("U9", "FPGA", Placement::new(0, 0));
        assert_eq!(
            resolve_instance(&instance, &library).unwrap_err(),
            DistillError::UnresolvedSymbol {
                reference: "U9".into(),
                symbol: "FPGA".into(),
                unit: 1,
            }
        );

        let bad_unit = SymbolInstance::new("U1", "MCU", Placement::new(0, 0)).with_unit(4);
        assert!(matches!(
            resolve_instance(&bad_unit, &library).unwrap_err(),
            DistillError::UnresolvedSymbol { unit: 4, .. }
        ));
    }

    #[test]
    fn power_symbol_emits_power_label() {
        let library = library();
        let gnd = SymbolInstance::new("#PWR01", "GND", Placement::new(5, 5));
        let resolved = resolve_instance(&gnd, &library).unwrap();

        assert_eq!(resolved.implicit_labels.len(), 1);
        let label = &resolved.implicit_labels[0];
        assert_eq!(label.kind, LabelKind::Power);
        assert_eq!(label.text, "GND");
        assert_eq!(label.at, Point::new(5, 5));
    }

    #[test]
    fn power_symbol_value_renames_the_net() {
        let library = library();
        let gnd = SymbolInstance::new("#PWR02", "GND", Placement::new(5, 5)).with_value("AGND");
        let resolved = resolve_instance(&gnd, &library).unwrap();
        assert_eq!(resolved.implicit_labels[0].text, "AGND");
    }

    #[test]
    fn hidden_power_input_joins_implicit_net() {
        let library = library();
        let instance = SymbolInstance::new("U1", "MCU", Placement::new(0, 0));
        let resolved = resolve_instance(&instance, &library).unwrap();

        assert_eq!(resolved.implicit_labels.len(), 1);
        assert_eq!(resolved.implicit_labels[0].text, "VDD");
        assert_eq!(resolved.implicit_labels[0].at, Point::new(0, -3));
    }
}
