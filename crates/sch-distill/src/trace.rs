//! Per-sheet net tracing.
//!
//! Builds an undirected connectivity graph over wire segments, junctions,
//! bus entries and pin endpoints, then collapses it into candidate nets
//! with a union-find over interned coordinates.  Pure over its inputs, so
//! sheets can be traced on independent worker threads.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use sch_model::{
    BusRange, Label, LabelKind, Point, Sheet, SheetPath, WireSegment, strictly_on_segment,
};

use crate::resolve::PinEndpoint;

/// Simple union-find with path halving for grouping connected coordinates.
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new() -> Self {
        Self { parent: Vec::new() }
    }

    pub(crate) fn with_len(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    pub(crate) fn ensure(&mut self, id: usize) {
        while self.parent.len() <= id {
            let n = self.parent.len();
            self.parent.push(n);
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// A label attached to a traced group, reduced to what naming needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetLabel {
    pub kind: LabelKind,
    pub text: String,
}

impl NetLabel {
    pub fn new(kind: LabelKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// One connectivity group of a sheet: its member coordinates, the pin
/// endpoints that landed on them and every label attached to the group.
/// Naming happens after hierarchy propagation, not here.
#[derive(Debug, Clone)]
pub struct TracedNet {
    pub sheet: SheetPath,
    pub points: Vec<Point>,
    pub pins: Vec<PinEndpoint>,
    /// The sheet's own labels plus implicit power labels.
    pub labels: Vec<NetLabel>,
    /// Sheet-pin port names of child instances attached to this group.
    /// Kept apart from `labels`: ports bind downward to the named child and
    /// must not text-match against this sheet's own hierarchical labels.
    pub ports: Vec<String>,
}

/// Trace one sheet into its candidate nets.
///
/// `endpoints` are the resolved pin endpoints of the sheet's instances and
/// `implicit_labels` the power labels their resolution contributed; both
/// come from the resolver.  Connectivity rules:
/// - the two ends of every wire segment connect;
/// - coincident coordinates connect (exact integer equality);
/// - a referenced point in the interior of a segment connects to it
///   (T-connections need no junction; plain crossings stay separate);
/// - same-text local and hierarchical labels connect within the sheet;
/// - signal groups reaching a labelled bus through bus entries connect
///   when they carry the same bus-member name.
pub fn trace_sheet(
    sheet: &Sheet,
    endpoints: &[PinEndpoint],
    implicit_labels: &[Label],
) -> Vec<TracedNet> {
    let mut uf = UnionFind::new();
    let mut ids: HashMap<Point, usize> = HashMap::new();
    let mut points: Vec<Point> = Vec::new();

    let mut intern = |at: Point, uf: &mut UnionFind| -> usize {
        match ids.entry(at) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = points.len();
                points.push(at);
                entry.insert(id);
                uf.ensure(id);
                id
            }
        }
    };

    // Interning order is fixed so group discovery order (and with it the
    // anonymous-name ordinals downstream) is reproducible.
    for wire in &sheet.wires {
        let a = intern(wire.start, &mut uf);
        let b = intern(wire.end, &mut uf);
        uf.union(a, b);
    }
    for endpoint in endpoints {
        intern(endpoint.at, &mut uf);
    }
    for junction in &sheet.junctions {
        intern(junction.at, &mut uf);
    }

    // Split explicit labels into bus group labels and signal labels.
    let mut signal_labels: Vec<&Label> = Vec::new();
    let mut bus_labels: Vec<(&Label, BusRange)> = Vec::new();
    for label in &sheet.labels {
        match label.bus_range() {
            Some(range) => bus_labels.push((label, range)),
            None => signal_labels.push(label),
        }
    }
    for label in &signal_labels {
        intern(label.at, &mut uf);
    }
    for label in implicit_labels {
        intern(label.at, &mut uf);
    }

    // Sheet-pin ports of child instances participate as hierarchical
    // attachment points; the propagator merges them with the child side.
    let mut port_labels: Vec<Label> = Vec::new();
    for child in &sheet.sheet_instances {
        for pin in &child.pins {
            intern(pin.at, &mut uf);
            port_labels.push(Label::hierarchical(pin.at, pin.name.clone()));
        }
    }

    let mut entry_wire_ids: Vec<usize> = Vec::new();
    for entry in &sheet.bus_entries {
        entry_wire_ids.push(intern(entry.wire_at, &mut uf));
    }

    // T-connections: any referenced point in the interior of a wire segment
    // joins that segment's group.
    join_interior_points(&points, &sheet.wires, &ids, &mut uf);

    // Same-text labels connect within the sheet.  Only the sheet's own
    // local and hierarchical labels do this – ports of child instances bind
    // downward, not to each other.
    let mut text_anchor: HashMap<(LabelKind, &str), usize> = HashMap::new();
    for label in signal_labels
        .iter()
        .filter(|l| matches!(l.kind, LabelKind::Local | LabelKind::Hierarchical))
    {
        let id = ids[&label.at];
        match text_anchor.entry((label.kind, label.text.as_str())) {
            Entry::Occupied(anchor) => uf.union(*anchor.get(), id),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
    }

    merge_bus_members(
        sheet,
        &bus_labels,
        &signal_labels,
        &entry_wire_ids,
        &ids,
        &mut uf,
    );

    // Collapse into groups, in first-seen id order.
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    let mut nets: Vec<TracedNet> = Vec::new();
    for id in 0..points.len() {
        let root = uf.find(id);
        let group = *group_of_root.entry(root).or_insert_with(|| {
            nets.push(TracedNet {
                sheet: sheet.path.clone(),
                points: Vec::new(),
                pins: Vec::new(),
                labels: Vec::new(),
                ports: Vec::new(),
            });
            nets.len() - 1
        });
        nets[group].points.push(points[id]);
    }

    for endpoint in endpoints {
        let group = group_of_root[&uf.find(ids[&endpoint.at])];
        nets[group].pins.push(endpoint.clone());
    }
    for label in signal_labels.into_iter().chain(implicit_labels) {
        let group = group_of_root[&uf.find(ids[&label.at])];
        nets[group]
            .labels
            .push(NetLabel::new(label.kind, label.text.clone()));
    }
    for port in &port_labels {
        let group = group_of_root[&uf.find(ids[&port.at])];
        nets[group].ports.push(port.text.clone());
    }

    for net in &mut nets {
        net.points.sort();
    }

    log::debug!(
        "traced sheet {}: {} points, {} groups",
        sheet.path,
        points.len(),
        nets.len()
    );
    nets
}

fn join_interior_points(
    points: &[Point],
    wires: &[WireSegment],
    ids: &HashMap<Point, usize>,
    uf: &mut UnionFind,
) {
    for &p in points {
        for wire in wires {
            if strictly_on_segment(p, wire.start, wire.end) {
                uf.union(ids[&p], ids[&wire.start]);
            }
        }
    }
}

/// Bus connectivity: bus wires form their own groups; a group labelled
/// `BASE[lo..hi]` joins the signal groups that reach it through bus entries
/// and carry the same member name.
fn merge_bus_members(
    sheet: &Sheet,
    bus_labels: &[(&Label, BusRange)],
    signal_labels: &[&Label],
    entry_wire_ids: &[usize],
    signal_ids: &HashMap<Point, usize>,
    uf: &mut UnionFind,
) {
    if bus_labels.is_empty() || sheet.bus_entries.is_empty() {
        return;
    }

    let mut bus_uf = UnionFind::new();
    let mut bus_ids: HashMap<Point, usize> = HashMap::new();
    let mut bus_points: Vec<Point> = Vec::new();
    let mut bus_intern = |at: Point, bus_uf: &mut UnionFind| -> usize {
        match bus_ids.entry(at) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = bus_points.len();
                bus_points.push(at);
                entry.insert(id);
                bus_uf.ensure(id);
                id
            }
        }
    };

    for wire in &sheet.bus_wires {
        let a = bus_intern(wire.start, &mut bus_uf);
        let b = bus_intern(wire.end, &mut bus_uf);
        bus_uf.union(a, b);
    }
    for (label, _) in bus_labels {
        bus_intern(label.at, &mut bus_uf);
    }
    let entry_bus_ids: Vec<usize> = sheet
        .bus_entries
        .iter()
        .map(|entry| bus_intern(entry.bus_at, &mut bus_uf))
        .collect();
    join_interior_points(&bus_points, &sheet.bus_wires, &bus_ids, &mut bus_uf);

    // Member texts carried by signal labels, with their attachment ids.
    let member_candidates: Vec<(&str, usize)> = signal_labels
        .iter()
        .filter(|l| matches!(l.kind, LabelKind::Local | LabelKind::Hierarchical))
        .map(|l| (l.text.as_str(), signal_ids[&l.at]))
        .collect();

    let mut member_anchor: HashMap<(usize, &str), usize> = HashMap::new();
    for (label, range) in bus_labels {
        let bus_root = bus_uf.find(bus_ids[&label.at]);
        for (entry_idx, &wire_id) in entry_wire_ids.iter().enumerate() {
            if bus_uf.find(entry_bus_ids[entry_idx]) != bus_root {
                continue;
            }
            for &(text, label_id) in &member_candidates {
                if !range.contains(text) {
                    continue;
                }
                if uf.find(label_id) != uf.find(wire_id) {
                    continue;
                }
                match member_anchor.entry((bus_root, text)) {
                    Entry::Occupied(anchor) => uf.union(*anchor.get(), wire_id),
                    Entry::Vacant(slot) => {
                        slot.insert(wire_id);
                    }
                }
            }
        }
    }
}
