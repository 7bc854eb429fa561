//! The distillation pipeline: document in, distilled schematic out.

use rayon::prelude::*;

use sch_model::{
    DistilledComponent, DistilledNet, DistilledPin, DistilledSchematic, Label, PinRef,
    SchematicDoc, Sheet, SheetPath, SymbolLibrary,
};

use crate::diagnostics::{Diagnostics, WithDiagnostics};
use crate::error::DistillError;
use crate::hierarchy::propagate;
use crate::resolve::{PinEndpoint, ResolvedInstance, resolve_instance};
use crate::trace::trace_sheet;

struct SheetWork<'a> {
    sheet: &'a Sheet,
    endpoints: Vec<PinEndpoint>,
    implicit_labels: Vec<Label>,
    resolved: Vec<ResolvedInstance>,
}

/// Distill a document against its symbol library.
///
/// Deterministic pure function of its inputs: the same document and library
/// produce byte-identical output (including anonymous net names).  Symbol
/// lookup misses and net-name conflicts accumulate as diagnostics next to
/// best-effort output; geometry errors and internal-invariant breaches
/// abort with `output: None`.
pub fn distill(
    doc: &SchematicDoc,
    library: &dyn SymbolLibrary,
) -> WithDiagnostics<DistilledSchematic> {
    let mut diagnostics = Diagnostics::default();

    // Resolve every instance up front; tracing only needs the endpoints.
    let mut work: Vec<SheetWork<'_>> = Vec::with_capacity(doc.sheets.len());
    for sheet in doc.sheets.values() {
        let mut item = SheetWork {
            sheet,
            endpoints: Vec::new(),
            implicit_labels: Vec::new(),
            resolved: Vec::new(),
        };
        for instance in &sheet.symbols {
            match resolve_instance(instance, library) {
                Ok(resolved) => {
                    item.endpoints.extend(resolved.endpoints.iter().cloned());
                    item.implicit_labels
                        .extend(resolved.implicit_labels.iter().cloned());
                    item.resolved.push(resolved);
                }
                Err(error) if error.is_fatal() => {
                    // Geometry cannot be trusted; nothing downstream is safe.
                    diagnostics.push(error);
                    return WithDiagnostics {
                        diagnostics,
                        output: None,
                    };
                }
                Err(error) => {
                    log::warn!("skipping {}: {error}", instance.reference);
                    diagnostics.push(error);
                }
            }
        }
        work.push(item);
    }

    // Per-sheet tracing is embarrassingly parallel: pure inputs, merged
    // only by the propagator below.
    let sheet_nets = work
        .par_iter()
        .map(|item| trace_sheet(item.sheet, &item.endpoints, &item.implicit_labels))
        .collect::<Vec<_>>();

    let (nets, conflicts) = propagate(doc, sheet_nets);
    diagnostics.extend(conflicts);

    let mut output = DistilledSchematic::new();
    for item in &work {
        for resolved in &item.resolved {
            match distilled_component(resolved, &item.sheet.path, &nets) {
                Ok(component) => output.components.push(component),
                Err(error) => {
                    diagnostics.push(error);
                    return WithDiagnostics {
                        diagnostics,
                        output: None,
                    };
                }
            }
        }
    }

    for net in &nets.nets {
        output.nets.push(DistilledNet {
            name: net.name.clone(),
            pins: net
                .pins
                .iter()
                .map(|pin| PinRef {
                    reference: pin.reference.clone(),
                    pin: pin.number.clone(),
                })
                .collect(),
        });
    }

    output.sort();
    WithDiagnostics {
        diagnostics,
        output: Some(output),
    }
}

fn distilled_component(
    resolved: &ResolvedInstance,
    sheet: &SheetPath,
    nets: &crate::hierarchy::DesignNets,
) -> Result<DistilledComponent, DistillError> {
    let mut pins = Vec::with_capacity(resolved.endpoints.len());
    for endpoint in &resolved.endpoints {
        // Unreachable given the tracer interns every endpoint; treated as
        // an internal-invariant breach, not a user error.
        let net = nets
            .net_at(sheet, endpoint.at)
            .ok_or_else(|| DistillError::IncompleteResolution {
                reference: endpoint.reference.clone(),
                pin: endpoint.number.clone(),
            })?;
        pins.push(DistilledPin {
            number: endpoint.number.clone(),
            name: endpoint.name.clone(),
            net: net.name.clone(),
        });
    }
    Ok(DistilledComponent {
        reference: resolved.reference.clone(),
        value: resolved.value.clone(),
        footprint: resolved.footprint.clone(),
        pins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sch_model::{
        Label, Placement, Point, SymbolDefinition, SymbolInstance, SymbolPin, SymbolTable,
    };

    fn library() -> SymbolTable {
        SymbolTable::new().with_symbol(SymbolDefinition::single_unit(
            "R",
            vec![
                SymbolPin::new("1", "~", Point::new(0, -2)),
                SymbolPin::new("2", "~", Point::new(0, 2)),
            ],
        ))
    }

    fn simple_doc() -> SchematicDoc {
        let mut sheet = Sheet::new(SheetPath::root());
        sheet
            .add_symbol(SymbolInstance::new("R1", "R", Placement::new(10, 10)).with_value("10k"))
            .add_symbol(SymbolInstance::new("R2", "R", Placement::new(20, 10)))
            .add_wire(Point::new(10, 12), Point::new(20, 12))
            .add_wire(Point::new(10, 8), Point::new(0, 8))
            .add_label(Label::local(Point::new(0, 8), "IN"));
        let mut doc = SchematicDoc::new();
        doc.add_sheet(sheet);
        doc
    }

    #[test]
    fn distills_a_simple_divider() {
        let result = distill(&simple_doc(), &library());
        assert!(result.is_success());
        let output = result.output.unwrap();

        assert_eq!(output.components.len(), 2);
        let r1 = output.component("R1").unwrap();
        assert_eq!(r1.value.as_deref(), Some("10k"));
        assert_eq!(r1.net_of("1"), Some("IN"));
        // R1 pin 2 and R2 pin 2 share the joining wire.
        let r2 = output.component("R2").unwrap();
        assert_eq!(r1.net_of("2"), r2.net_of("2"));

        let in_net = output.net("IN").unwrap();
        assert_eq!(
            in_net.pins,
            vec![PinRef {
                reference: "R1".into(),
                pin: "1".into(),
            }]
        );
    }

    #[test]
    fn unresolved_symbols_accumulate_without_aborting() {
        let mut doc = simple_doc();
        doc.sheet_mut(&SheetPath::root())
            .unwrap()
            .add_symbol(SymbolInstance::new("U1", "MCU", Placement::new(50, 50)));

        let result = distill(&doc, &library());
        // Still produced output for the resolvable instances.
        let (output, diagnostics) = result.unpack();
        let output = output.unwrap();
        assert_eq!(output.components.len(), 2);
        assert!(output.component("U1").is_none());
        assert_eq!(
            diagnostics.errors,
            vec![DistillError::UnresolvedSymbol {
                reference: "U1".into(),
                symbol: "MCU".into(),
                unit: 1,
            }]
        );
    }

    #[test]
    fn invalid_rotation_aborts_the_run() {
        let mut doc = simple_doc();
        doc.sheet_mut(&SheetPath::root())
            .unwrap()
            .add_symbol(SymbolInstance::new(
                "R3",
                "R",
                Placement::new(0, 0).with_rotation(33),
            ));

        let result = distill(&doc, &library());
        assert!(!result.is_success());
        assert!(result.output.is_none());
        assert!(result.diagnostics.has_fatal());
    }

    #[test]
    fn output_is_deterministic() {
        let doc = simple_doc();
        let library = library();
        let first = distill(&doc, &library).output.unwrap().to_json().unwrap();
        let second = distill(&doc, &library).output.unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }
}
