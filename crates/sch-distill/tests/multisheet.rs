//! End-to-end distillation of a two-sheet design: hierarchical ports,
//! design-wide global and power nets, implicit power pins, determinism.

use sch_distill::{DistillError, distill};
use sch_model::{
    Label, PinType, Placement, Point, SchematicDoc, Sheet, SheetInstance, SheetPath,
    SymbolDefinition, SymbolInstance, SymbolPin, SymbolTable,
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
                SymbolPin::new("4", "GND", Point::new(0, 3)).with_type(PinType::PowerIn),
            ],
        ))
        .with_symbol(SymbolDefinition::single_unit(
            "CONN_3",
            vec![
                SymbolPin::new("1", "A", Point::new(0, 0)),
                SymbolPin::new("2", "B", Point::new(0, 1)),
                SymbolPin::new("3", "C", Point::new(0, 2)),
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

fn design() -> SchematicDoc {
    let io_path = SheetPath::root().join("io");

    let mut root = Sheet::new(SheetPath::root());
    root.add_symbol(SymbolInstance::new("U1", "MCU", Placement::new(50, 50)))
        .add_symbol(SymbolInstance::new("#PWR01", "GND", Placement::new(50, 53)))
        // PA0 runs to the io sheet's SDA port.
        .add_wire(Point::new(48, 50), Point::new(40, 50))
        .add_sheet_instance(
            SheetInstance::new("io", io_path.clone()).with_pin("SDA", Point::new(40, 50)),
        )
        // PA1 is design-wide EN.
        .add_wire(Point::new(48, 51), Point::new(40, 51))
        .add_label(Label::global(Point::new(40, 51), "EN"));

    let mut io = Sheet::new(io_path);
    io.add_symbol(SymbolInstance::new("J1", "CONN_3", Placement::new(100, 100)))
        .add_symbol(SymbolInstance::new("#PWR02", "GND", Placement::new(100, 101)))
        .add_wire(Point::new(90, 100), Point::new(100, 100))
        .add_label(Label::hierarchical(Point::new(90, 100), "SDA"))
        .add_label(Label::global(Point::new(100, 102), "EN"));

    let mut doc = SchematicDoc::new();
    doc.add_sheet(root);
    doc.add_sheet(io);
    doc
}

#[test]
fn ports_globals_and_power_merge_across_sheets() {
    let _ = env_logger::builder().is_test(true).try_init();

    let result = distill(&design(), &library());
    assert!(result.is_success(), "diagnostics: {:?}", result.diagnostics);
    let output = result.output.unwrap();

    let u1 = output.component("U1").unwrap();
    let j1 = output.component("J1").unwrap();

    // Hierarchical port: PA0 and J1.1 share the SDA net.
    assert_eq!(u1.net_of("1"), Some("SDA"));
    assert_eq!(j1.net_of("1"), Some("SDA"));

    // Global label EN spans both sheets.
    assert_eq!(u1.net_of("2"), Some("EN"));
    assert_eq!(j1.net_of("3"), Some("EN"));

    // Power symbols on both sheets pull GND together.
    assert_eq!(u1.net_of("4"), Some("GND"));
    assert_eq!(j1.net_of("2"), Some("GND"));

    // The hidden power input joined its implicit rail.
    assert_eq!(u1.net_of("3"), Some("VDD"));
}

#[test]
fn every_pin_belongs_to_exactly_one_net() {
    let output = distill(&design(), &library()).output.unwrap();

    let mut seen = std::collections::HashSet::new();
    for component in &output.components {
        for pin in &component.pins {
            assert!(!pin.net.is_empty(), "{}.{} has a net", component.reference, pin.number);
            assert!(
                seen.insert((component.reference.clone(), pin.number.clone())),
                "duplicate pin"
            );
        }
    }

    // The nets table partitions the same pin set: no pin appears twice, and
    // every component pin is covered.
    let mut from_nets = std::collections::HashSet::new();
    for net in &output.nets {
        for pin_ref in &net.pins {
            assert!(
                from_nets.insert((pin_ref.reference.clone(), pin_ref.pin.clone())),
                "pin {}.{} in more than one net",
                pin_ref.reference,
                pin_ref.pin
            );
        }
    }
    assert_eq!(seen, from_nets);
}

#[test]
fn distillation_is_byte_identical_across_runs() {
    let library = library();
    let first = distill(&design(), &library).output.unwrap().to_json().unwrap();
    let second = distill(&design(), &library).output.unwrap().to_json().unwrap();
    assert_eq!(first, second);

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert!(value["components"].is_array());
    assert!(value["nets"].is_array());
}

#[test]
fn components_come_out_in_natural_reference_order() {
    let output = distill(&design(), &library()).output.unwrap();
    let order: Vec<_> = output
        .components
        .iter()
        .map(|c| c.reference.as_str())
        .collect();
    assert_eq!(order, vec!["#PWR01", "#PWR02", "J1", "U1"]);
}

#[test]
fn conflicting_labels_are_reported_not_silently_merged() {
    let mut doc = design();
    // A stray wire carrying two disagreeing local labels.
    doc.sheet_mut(&SheetPath::root())
        .unwrap()
        .add_wire(Point::new(0, 0), Point::new(10, 0))
        .add_label(Label::local(Point::new(0, 0), "ALT_A"))
        .add_label(Label::local(Point::new(10, 0), "ALT_B"));

    let result = distill(&doc, &library());
    // Best-effort output still exists; the conflict is in the diagnostics.
    assert!(result.output.is_some());
    assert!(result.diagnostics.iter().any(|error| matches!(
        error,
        DistillError::ConflictingNetName { tier, .. } if *tier == "local"
    )));
}
