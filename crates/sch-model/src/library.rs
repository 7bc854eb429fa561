use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Electrical class of a symbol pin, as declared by the library.
///
/// The variants mirror the classes used by the on-disk symbol format; the
/// distiller itself only distinguishes power inputs (for implicit power
/// nets), but the full set is carried through to the output untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinType {
    Input,
    Output,
    Bidirectional,
    TriState,
    #[default]
    Passive,
    Free,
    PowerIn,
    PowerOut,
    OpenCollector,
    OpenEmitter,
    NoConnect,
    Unspecified,
}

impl PinType {
    pub fn as_str(self) -> &'static str {
        match self {
            PinType::Input => "input",
            PinType::Output => "output",
            PinType::Bidirectional => "bidirectional",
            PinType::TriState => "tri_state",
            PinType::Passive => "passive",
            PinType::Free => "free",
            PinType::PowerIn => "power_in",
            PinType::PowerOut => "power_out",
            PinType::OpenCollector => "open_collector",
            PinType::OpenEmitter => "open_emitter",
            PinType::NoConnect => "no_connect",
            PinType::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for PinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(PinType::Input),
            "output" => Ok(PinType::Output),
            "bidirectional" => Ok(PinType::Bidirectional),
            "tri_state" => Ok(PinType::TriState),
            "passive" => Ok(PinType::Passive),
            "free" => Ok(PinType::Free),
            "power_in" => Ok(PinType::PowerIn),
            "power_out" => Ok(PinType::PowerOut),
            "open_collector" => Ok(PinType::OpenCollector),
            "open_emitter" => Ok(PinType::OpenEmitter),
            "no_connect" => Ok(PinType::NoConnect),
            "unspecified" => Ok(PinType::Unspecified),
            _ => Err(format!("unknown pin electrical type: '{s}'")),
        }
    }
}

/// One pin of a symbol unit, in symbol-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPin {
    pub number: String,
    pub name: String,
    /// Position relative to the symbol origin, on the same grid as the sheet.
    pub at: Point,
    /// Facing direction in degrees (0, 90, 180 or 270).
    #[serde(default)]
    pub orientation: i32,
    #[serde(default)]
    pub electrical_type: PinType,
    /// Hidden pins do not render; hidden power inputs connect implicitly.
    #[serde(default)]
    pub hidden: bool,
}

impl SymbolPin {
    pub fn new(number: impl Into<String>, name: impl Into<String>, at: Point) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            at,
            orientation: 0,
            electrical_type: PinType::Passive,
            hidden: false,
        }
    }

    pub fn with_orientation(mut self, orientation: i32) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_type(mut self, electrical_type: PinType) -> Self {
        self.electrical_type = electrical_type;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Library-provided symbol definition: the canonical pin geometry for each
/// unit of the symbol.  Immutable; instances reference it by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolDefinition {
    pub name: String,
    /// Power symbols act as implicit global label sources.
    #[serde(default)]
    pub power: bool,
    /// Pins per unit, in the library's declared (stable) order.
    pub units: BTreeMap<u32, Vec<SymbolPin>>,
}

impl SymbolDefinition {
    /// A single-unit symbol (the common case).
    pub fn single_unit(name: impl Into<String>, pins: Vec<SymbolPin>) -> Self {
        let mut units = BTreeMap::new();
        units.insert(1, pins);
        Self {
            name: name.into(),
            power: false,
            units,
        }
    }

    pub fn with_unit(mut self, unit: u32, pins: Vec<SymbolPin>) -> Self {
        self.units.insert(unit, pins);
        self
    }

    pub fn power_symbol(mut self) -> Self {
        self.power = true;
        self
    }

    /// Pins of the selected unit in library order, if the unit exists.
    pub fn unit_pins(&self, unit: u32) -> Option<&[SymbolPin]> {
        self.units.get(&unit).map(Vec::as_slice)
    }
}

/// Lookup contract implemented by the symbol-library collaborator.
///
/// Implementations must return pins in a stable, deterministic order; a
/// `None` from either method is reported by the resolver as an unresolved
/// symbol, never silently skipped.
pub trait SymbolLibrary {
    fn symbol(&self, name: &str) -> Option<&SymbolDefinition>;

    fn pins(&self, name: &str, unit: u32) -> Option<&[SymbolPin]> {
        self.symbol(name).and_then(|def| def.unit_pins(unit))
    }
}

/// In-memory symbol library keyed by symbol name.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolDefinition>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_symbol(&mut self, definition: SymbolDefinition) -> &mut Self {
        self.symbols.insert(definition.name.clone(), definition);
        self
    }

    pub fn with_symbol(mut self, definition: SymbolDefinition) -> Self {
        self.add_symbol(definition);
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolLibrary for SymbolTable {
    fn symbol(&self, name: &str) -> Option<&SymbolDefinition> {
        self.symbols.get(name)
    }
}
