//! Cross-sheet net propagation and final naming.
//!
//! Per-sheet tracing leaves one arena of net groups per sheet; this module
//! merges them with a second union-find over integer net handles – no
//! geometry is duplicated, however deep the hierarchy.  Global and power
//! labels merge design-wide by text; sheet-pin ports merge a parent group
//! with the child groups carrying the matching hierarchical label.  Local
//! labels never cross sheet boundaries.
//!
//! The merge mutates one shared union-find, so this stage runs
//! single-threaded (the tracers it consumes are the parallel part).

use std::collections::{HashMap, HashSet};

use sch_model::{LabelKind, Point, SchematicDoc, SheetPath};

use crate::error::DistillError;
use crate::naming::{ChosenName, choose_name};
use crate::resolve::PinEndpoint;
use crate::trace::{NetLabel, TracedNet, UnionFind};

/// One fully-merged design net with its final canonical name.
#[derive(Debug, Clone)]
pub struct FinalNet {
    pub name: String,
    pub pins: Vec<PinEndpoint>,
}

/// The merged nets of the whole design, queryable by sheet coordinate.
#[derive(Debug, Clone, Default)]
pub struct DesignNets {
    pub nets: Vec<FinalNet>,
    point_to_net: HashMap<(SheetPath, Point), usize>,
}

impl DesignNets {
    /// The net covering a coordinate of a sheet, if any element was traced
    /// there.
    pub fn net_at(&self, sheet: &SheetPath, at: Point) -> Option<&FinalNet> {
        self.point_to_net
            .get(&(sheet.clone(), at))
            .map(|&idx| &self.nets[idx])
    }
}

/// Merge per-sheet nets across the hierarchy and assign canonical names.
///
/// `sheet_nets` must be parallel to `doc.sheets` iteration order (one entry
/// per sheet).  Returns the merged nets plus the accumulated naming
/// conflicts; a conflicting net falls back to its anonymous name so the
/// caller can still complete the run.
pub fn propagate(
    doc: &SchematicDoc,
    sheet_nets: Vec<Vec<TracedNet>>,
) -> (DesignNets, Vec<DistillError>) {
    let arena: Vec<TracedNet> = sheet_nets.into_iter().flatten().collect();

    let mut point_to_id: HashMap<(SheetPath, Point), usize> = HashMap::new();
    let mut ids_by_sheet: HashMap<SheetPath, Vec<usize>> = HashMap::new();
    for (idx, net) in arena.iter().enumerate() {
        ids_by_sheet.entry(net.sheet.clone()).or_default().push(idx);
        for &point in &net.points {
            point_to_id.insert((net.sheet.clone(), point), idx);
        }
    }

    let mut uf = UnionFind::with_len(arena.len());

    // Global and power labels union across the entire design by text.
    let mut text_anchor: HashMap<&str, usize> = HashMap::new();
    for (idx, net) in arena.iter().enumerate() {
        for label in &net.labels {
            if matches!(label.kind, LabelKind::Global | LabelKind::Power) {
                match text_anchor.entry(label.text.as_str()) {
                    std::collections::hash_map::Entry::Occupied(anchor) => {
                        uf.union(*anchor.get(), idx);
                    }
                    std::collections::hash_map::Entry::Vacant(slot) => {
                        slot.insert(idx);
                    }
                }
            }
        }
    }

    // Parent→child port binding: the parent net touching the sheet-pin
    // coordinate merges with the child nets carrying the matching
    // hierarchical label.
    for sheet in doc.sheets.values() {
        for child in &sheet.sheet_instances {
            let Some(child_ids) = ids_by_sheet.get(&child.path) else {
                log::warn!(
                    "sheet instance '{}' on {} refers to missing sheet {}",
                    child.name,
                    sheet.path,
                    child.path
                );
                continue;
            };
            for pin in &child.pins {
                let Some(&parent_id) = point_to_id.get(&(sheet.path.clone(), pin.at)) else {
                    continue;
                };
                let mut matched = false;
                for &child_id in child_ids {
                    let has_label = arena[child_id].labels.iter().any(|label| {
                        label.kind == LabelKind::Hierarchical && label.text == pin.name
                    });
                    if has_label {
                        uf.union(parent_id, child_id);
                        matched = true;
                    }
                }
                if !matched {
                    log::warn!(
                        "sheet pin '{}' of '{}' on {} has no matching hierarchical label in {}",
                        pin.name,
                        child.name,
                        sheet.path,
                        child.path
                    );
                }
            }
        }
    }

    // Collapse the arena into merged groups, then name them.
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for idx in 0..arena.len() {
        let root = uf.find(idx);
        let group = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(idx);
    }

    struct MergedGroup {
        members: Vec<usize>,
        chosen: ChosenName,
        /// Lowest-coordinate pin (or point, for pinless groups) – the
        /// deterministic anchor for anonymous-name ordinals.
        anchor: (SheetPath, Point),
    }

    let mut merged: Vec<MergedGroup> = groups
        .into_iter()
        .map(|members| {
            let mut labels: Vec<NetLabel> = Vec::new();
            let mut pin_anchor: Option<(SheetPath, Point)> = None;
            let mut point_anchor: Option<(SheetPath, Point)> = None;
            for &idx in &members {
                let net = &arena[idx];
                labels.extend(net.labels.iter().cloned());
                labels.extend(
                    net.ports
                        .iter()
                        .map(|port| NetLabel::new(LabelKind::Hierarchical, port.clone())),
                );
                if let Some(at) = net.pins.iter().map(|pin| pin.at).min() {
                    let candidate = (net.sheet.clone(), at);
                    if pin_anchor.as_ref().is_none_or(|a| candidate < *a) {
                        pin_anchor = Some(candidate);
                    }
                }
                if let Some(&at) = net.points.first() {
                    let candidate = (net.sheet.clone(), at);
                    if point_anchor.as_ref().is_none_or(|a| candidate < *a) {
                        point_anchor = Some(candidate);
                    }
                }
            }
            MergedGroup {
                chosen: choose_name(&labels),
                // Points are sorted per group, so `first` is the minimum.
                anchor: pin_anchor.or(point_anchor).expect("group has points"),
                members,
            }
        })
        .collect();

    merged.sort_by(|a, b| a.anchor.cmp(&b.anchor));

    let mut diagnostics: Vec<DistillError> = Vec::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut ordinals: HashMap<SheetPath, u32> = HashMap::new();

    let mut nets = DesignNets::default();
    for group in merged {
        let sheet = group.anchor.0.clone();
        let name = match group.chosen {
            ChosenName::Named(name) => dedup_name(name, &sheet, &mut used),
            ChosenName::Anonymous => anonymous_name(&sheet, &mut ordinals, &mut used),
            ChosenName::Conflict { tier, candidates } => {
                let fallback = anonymous_name(&sheet, &mut ordinals, &mut used);
                diagnostics.push(DistillError::ConflictingNetName {
                    tier,
                    candidates,
                    fallback: fallback.clone(),
                });
                fallback
            }
        };

        let net_idx = nets.nets.len();
        let mut pins: Vec<PinEndpoint> = Vec::new();
        for &idx in &group.members {
            let traced = &arena[idx];
            pins.extend(traced.pins.iter().cloned());
            for &point in &traced.points {
                nets.point_to_net
                    .insert((traced.sheet.clone(), point), net_idx);
            }
        }
        nets.nets.push(FinalNet { name, pins });
    }

    (nets, diagnostics)
}

/// Keep explicit names unique across the design: a second distinct net with
/// an already-used name is qualified by its anchor sheet path, then by an
/// ordinal suffix (mirrors keying nets by their deduplicated name).
fn dedup_name(name: String, sheet: &SheetPath, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let qualified = format!("{sheet}{name}");
    if used.insert(qualified.clone()) {
        log::debug!("net name '{name}' already taken; using '{qualified}'");
        return qualified;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{qualified}_{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn anonymous_name(
    sheet: &SheetPath,
    ordinals: &mut HashMap<SheetPath, u32>,
    used: &mut HashSet<String>,
) -> String {
    let ordinal = ordinals.entry(sheet.clone()).or_insert(0);
    loop {
        *ordinal += 1;
        let candidate = format!("{sheet}N${ordinal}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
    }
}
