use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Placement, Point};

/// Error parsing a [`SheetPath`] from its string form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid sheet path {path:?}: must start with '/'")]
pub struct SheetPathParseError {
    pub path: String,
}

/// Hierarchical path of a sheet, as the sequence of sheet names from the
/// root.  Serialises as a `/`-delimited string (`"/"` for the root sheet,
/// `"/power/reg/"` for nested sheets).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SheetPath(Vec<String>);

impl SheetPath {
    /// The root sheet (`/`).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Path of a child sheet named `name` under `self`.
    pub fn join(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Depth below the root (the root itself has depth 0).
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for SheetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/")?;
        for segment in &self.0 {
            write!(f, "{segment}/")?;
        }
        Ok(())
    }
}

impl From<SheetPath> for String {
    fn from(path: SheetPath) -> Self {
        path.to_string()
    }
}

impl std::str::FromStr for SheetPath {
    type Err = SheetPathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with('/') {
            return Err(SheetPathParseError {
                path: s.to_owned(),
            });
        }
        let segments: Vec<String> = s
            .trim_matches('/')
            .split('/')
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(Self(segments))
    }
}

impl TryFrom<String> for SheetPath {
    type Error = SheetPathParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Discriminates how a label's name binds to the design.
///
/// The naming-priority logic is exhaustive over exactly these four kinds, so
/// this is a closed enum rather than anything extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    /// Names and connects points within one sheet only.
    Local,
    /// Names and connects points across the entire design.
    Global,
    /// A port name binding a sheet to its parent via a sheet pin.
    Hierarchical,
    /// Implicit global contributed by a power symbol or hidden power pin.
    Power,
}

/// A name attached to whatever connectivity group contains its coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub at: Point,
    pub text: String,
    pub kind: LabelKind,
}

impl Label {
    pub fn new(at: Point, text: impl Into<String>, kind: LabelKind) -> Self {
        Self {
            at,
            text: text.into(),
            kind,
        }
    }

    pub fn local(at: Point, text: impl Into<String>) -> Self {
        Self::new(at, text, LabelKind::Local)
    }

    pub fn global(at: Point, text: impl Into<String>) -> Self {
        Self::new(at, text, LabelKind::Global)
    }

    pub fn hierarchical(at: Point, text: impl Into<String>) -> Self {
        Self::new(at, text, LabelKind::Hierarchical)
    }

    pub fn power(at: Point, text: impl Into<String>) -> Self {
        Self::new(at, text, LabelKind::Power)
    }

    /// Parse the label text as a bus group name (`BASE[lo..hi]`).
    pub fn bus_range(&self) -> Option<BusRange> {
        BusRange::parse(&self.text)
    }
}

/// An indexed bus group parsed from label text such as `D[0..7]`.
///
/// The member order is normalised so `D[7..0]` and `D[0..7]` denote the same
/// group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusRange {
    pub base: String,
    pub lo: u32,
    pub hi: u32,
}

impl BusRange {
    pub fn parse(text: &str) -> Option<Self> {
        let open = text.find('[')?;
        let inner = text[open + 1..].strip_suffix(']')?;
        let base = &text[..open];
        if base.is_empty() {
            return None;
        }
        let (a, b) = inner.split_once("..")?;
        let a: u32 = a.trim().parse().ok()?;
        let b: u32 = b.trim().parse().ok()?;
        Some(Self {
            base: base.to_owned(),
            lo: a.min(b),
            hi: a.max(b),
        })
    }

    /// Expanded member names, lowest index first.
    pub fn members(&self) -> impl Iterator<Item = String> + '_ {
        (self.lo..=self.hi).map(move |i| format!("{}{}", self.base, i))
    }

    pub fn contains(&self, name: &str) -> bool {
        name.strip_prefix(self.base.as_str())
            .and_then(|rest| rest.parse::<u32>().ok())
            .is_some_and(|i| (self.lo..=self.hi).contains(&i))
    }
}

/// A connectivity edge between two grid coordinates on one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSegment {
    pub start: Point,
    pub end: Point,
}

impl WireSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// An explicit connection marker.  Junctions disambiguate rendering; the
/// tracer connects coincident and mid-segment points with or without them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Junction {
    pub at: Point,
}

impl Junction {
    pub fn new(at: Point) -> Self {
        Self { at }
    }
}

/// Connects a signal wire end to a bus wire.  Which bus member the wire
/// carries is determined by the label on the wire side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusEntry {
    /// End touching the bus wire.
    pub bus_at: Point,
    /// End touching the signal wire.
    pub wire_at: Point,
}

impl BusEntry {
    pub fn new(bus_at: Point, wire_at: Point) -> Self {
        Self { bus_at, wire_at }
    }
}

/// A named port on a placed sheet symbol, at parent-sheet coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetPin {
    pub name: String,
    pub at: Point,
}

impl SheetPin {
    pub fn new(name: impl Into<String>, at: Point) -> Self {
        Self {
            name: name.into(),
            at,
        }
    }
}

/// A child sheet placed on its parent: the child's path plus the ports the
/// child exposes, positioned where the parent's wiring reaches them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInstance {
    pub name: String,
    pub path: SheetPath,
    pub pins: Vec<SheetPin>,
}

impl SheetInstance {
    pub fn new(name: impl Into<String>, path: SheetPath) -> Self {
        Self {
            name: name.into(),
            path,
            pins: Vec::new(),
        }
    }

    pub fn with_pin(mut self, name: impl Into<String>, at: Point) -> Self {
        self.pins.push(SheetPin::new(name, at));
        self
    }
}

/// One placed occurrence of a library symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInstance {
    /// Reference designator, unique within the flattened design.
    pub reference: String,
    /// Library symbol name resolved through the [`crate::SymbolLibrary`].
    pub symbol: String,
    pub placement: Placement,
    /// Selected unit for multi-unit symbols.
    #[serde(default = "default_unit")]
    pub unit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<String>,
}

fn default_unit() -> u32 {
    1
}

impl SymbolInstance {
    pub fn new(
        reference: impl Into<String>,
        symbol: impl Into<String>,
        placement: Placement,
    ) -> Self {
        Self {
            reference: reference.into(),
            symbol: symbol.into(),
            placement,
            unit: 1,
            value: None,
            footprint: None,
        }
    }

    pub fn with_unit(mut self, unit: u32) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_footprint(mut self, footprint: impl Into<String>) -> Self {
        self.footprint = Some(footprint.into());
        self
    }
}

/// One sheet of the document: the symbols, wiring and labels it owns, plus
/// the child sheets instantiated on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub path: SheetPath,
    #[serde(default)]
    pub symbols: Vec<SymbolInstance>,
    #[serde(default)]
    pub wires: Vec<WireSegment>,
    #[serde(default)]
    pub bus_wires: Vec<WireSegment>,
    #[serde(default)]
    pub junctions: Vec<Junction>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub bus_entries: Vec<BusEntry>,
    #[serde(default)]
    pub sheet_instances: Vec<SheetInstance>,
}

impl Sheet {
    pub fn new(path: SheetPath) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn add_symbol(&mut self, symbol: SymbolInstance) -> &mut Self {
        self.symbols.push(symbol);
        self
    }

    pub fn add_wire(&mut self, start: Point, end: Point) -> &mut Self {
        self.wires.push(WireSegment::new(start, end));
        self
    }

    pub fn add_bus_wire(&mut self, start: Point, end: Point) -> &mut Self {
        self.bus_wires.push(WireSegment::new(start, end));
        self
    }

    pub fn add_junction(&mut self, at: Point) -> &mut Self {
        self.junctions.push(Junction::new(at));
        self
    }

    pub fn add_label(&mut self, label: Label) -> &mut Self {
        self.labels.push(label);
        self
    }

    pub fn add_bus_entry(&mut self, bus_at: Point, wire_at: Point) -> &mut Self {
        self.bus_entries.push(BusEntry::new(bus_at, wire_at));
        self
    }

    pub fn add_sheet_instance(&mut self, instance: SheetInstance) -> &mut Self {
        self.sheet_instances.push(instance);
        self
    }
}

/// The parsed document: a tree of sheets keyed by path from the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchematicDoc {
    pub sheets: BTreeMap<SheetPath, Sheet>,
}

impl SchematicDoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a sheet, keyed by its own path.
    pub fn add_sheet(&mut self, sheet: Sheet) -> &mut Self {
        self.sheets.insert(sheet.path.clone(), sheet);
        self
    }

    pub fn sheet(&self, path: &SheetPath) -> Option<&Sheet> {
        self.sheets.get(path)
    }

    pub fn sheet_mut(&mut self, path: &SheetPath) -> Option<&mut Sheet> {
        self.sheets.get_mut(path)
    }

    /// All placed symbol instances across every sheet, in sheet order.
    pub fn instances(&self) -> impl Iterator<Item = (&SheetPath, &SymbolInstance)> {
        self.sheets
            .values()
            .flat_map(|sheet| sheet.symbols.iter().map(move |s| (&sheet.path, s)))
    }
}
