//! Mapping tables translating logical names into physical indices.
//!
//! Every button entry is stored as a list of indices, even when the
//! configuration file names a single index. Axis entries are a pair of
//! physical axes with a sign per component.

use crate::mapping::MappingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;
use tracing::{debug, info};

/// Device classes a mapping table can be declared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Controller buttons
    Gamepad,

    /// Keyboard key codes
    Keyboard,

    /// Controller analog sticks
    Axes,
}

impl Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Gamepad => write!(f, "gamepad"),
            DeviceClass::Keyboard => write!(f, "keyboard"),
            DeviceClass::Axes => write!(f, "axes"),
        }
    }
}

impl FromStr for DeviceClass {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gamepad" => Ok(DeviceClass::Gamepad),
            "keyboard" => Ok(DeviceClass::Keyboard),
            "axes" => Ok(DeviceClass::Axes),
            _ => Err(MappingError::UnsupportedDevice(s.to_string())),
        }
    }
}

/// Config-file shape of a button entry: `5` or `[5, 6]`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(usize),
    Many(Vec<usize>),
}

impl From<OneOrMany> for Vec<usize> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(index) => vec![index],
            OneOrMany::Many(indices) => indices,
        }
    }
}

/// Logical button name to physical indices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, OneOrMany>",
    into = "BTreeMap<String, Vec<usize>>"
)]
pub struct ButtonTable {
    entries: BTreeMap<String, Vec<usize>>,
}

impl From<BTreeMap<String, OneOrMany>> for ButtonTable {
    fn from(raw: BTreeMap<String, OneOrMany>) -> Self {
        Self {
            entries: raw
                .into_iter()
                .map(|(name, indices)| (name, indices.into()))
                .collect(),
        }
    }
}

impl From<ButtonTable> for BTreeMap<String, Vec<usize>> {
    fn from(table: ButtonTable) -> Self {
        table.entries
    }
}

impl ButtonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing entry of the same name
    pub fn with(mut self, name: &str, indices: impl Into<Vec<usize>>) -> Self {
        self.insert(name, indices);
        self
    }

    pub fn insert(&mut self, name: &str, indices: impl Into<Vec<usize>>) {
        self.entries.insert(name.to_string(), indices.into());
    }

    /// Physical indices bound to `name`; empty when the name is unbound
    pub fn resolve(&self, name: &str) -> &[usize] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every logical name bound to a physical index, in name order
    pub fn names_for(&self, index: usize) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, indices)| indices.contains(&index))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.entries
            .iter()
            .map(|(name, indices)| (name.as_str(), indices.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Config-file shape of an axis entry: `[x, y]` or `{ x, y, invert_x, invert_y }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AxisSpec {
    Pair([usize; 2]),
    Full {
        x: usize,
        y: usize,
        #[serde(default)]
        invert_x: bool,
        #[serde(default)]
        invert_y: bool,
    },
}

/// Two physical axes forming one logical stick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "AxisSpec")]
pub struct AxisBinding {
    pub x: usize,
    pub y: usize,
    pub invert_x: bool,
    pub invert_y: bool,
}

impl From<AxisSpec> for AxisBinding {
    fn from(entry: AxisSpec) -> Self {
        match entry {
            AxisSpec::Pair([x, y]) => AxisBinding::new(x, y),
            AxisSpec::Full {
                x,
                y,
                invert_x,
                invert_y,
            } => AxisBinding {
                x,
                y,
                invert_x,
                invert_y,
            },
        }
    }
}

impl AxisBinding {
    pub const fn new(x: usize, y: usize) -> Self {
        Self {
            x,
            y,
            invert_x: false,
            invert_y: false,
        }
    }

    /// Reads both components from a raw axis list, applying the sign convention.
    /// A component whose index is out of range reads as 0.
    pub fn read(&self, axes: &[f32]) -> [f32; 2] {
        let component = |index: usize, invert: bool| {
            let value = axes.get(index).copied().unwrap_or(0.0);
            if invert {
                -value
            } else {
                value
            }
        };
        [component(self.x, self.invert_x), component(self.y, self.invert_y)]
    }
}

/// Logical axis name to physical axis pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisTable {
    entries: BTreeMap<String, AxisBinding>,
}

impl AxisTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, binding: AxisBinding) -> Self {
        self.entries.insert(name.to_string(), binding);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&AxisBinding> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AxisBinding)> {
        self.entries.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replacement table handed to [`MappingSet::set_custom_mapping`]
#[derive(Debug, Clone)]
pub enum MappingTable {
    Buttons(ButtonTable),
    Axes(AxisTable),
}

impl MappingTable {
    fn kind(&self) -> &'static str {
        match self {
            MappingTable::Buttons(_) => "button",
            MappingTable::Axes(_) => "axes",
        }
    }
}

/// The mapping tables of all declared device classes
#[derive(Debug, Clone)]
pub struct MappingSet {
    tables: BTreeMap<DeviceClass, MappingTable>,
}

impl Default for MappingSet {
    fn default() -> Self {
        Self::empty()
            .declare(
                DeviceClass::Gamepad,
                MappingTable::Buttons(super::defaults::gamepad()),
            )
            .declare(
                DeviceClass::Keyboard,
                MappingTable::Buttons(super::defaults::keyboard()),
            )
            .declare(DeviceClass::Axes, MappingTable::Axes(super::defaults::axes()))
    }
}

impl MappingSet {
    /// A set with no declared classes
    pub fn empty() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Declares a class with its initial table
    pub fn declare(mut self, class: DeviceClass, table: MappingTable) -> Self {
        self.tables.insert(class, table);
        self
    }

    pub fn is_declared(&self, class: DeviceClass) -> bool {
        self.tables.contains_key(&class)
    }

    /// Replaces the table of an already declared class wholesale.
    ///
    /// Fails without touching the set when the class name is unknown, the class
    /// was never declared, or the table kind does not fit the class.
    pub fn set_custom_mapping(
        &mut self,
        device_class: &str,
        table: MappingTable,
    ) -> Result<(), MappingError> {
        let class: DeviceClass = device_class.parse()?;
        if !self.is_declared(class) {
            return Err(MappingError::UnsupportedDevice(device_class.to_string()));
        }

        let expected = match class {
            DeviceClass::Gamepad | DeviceClass::Keyboard => "button",
            DeviceClass::Axes => "axes",
        };
        if table.kind() != expected {
            return Err(MappingError::TableKind { class, expected });
        }

        info!("Replacing {} mapping table", class);
        self.tables.insert(class, table);
        Ok(())
    }

    /// Button table of a button class
    pub fn buttons(&self, class: DeviceClass) -> Result<&ButtonTable, MappingError> {
        match self.tables.get(&class) {
            Some(MappingTable::Buttons(table)) => Ok(table),
            Some(MappingTable::Axes(_)) => Err(MappingError::TableKind {
                class,
                expected: "button",
            }),
            None => Err(MappingError::UnsupportedDevice(class.to_string())),
        }
    }

    /// The axes table
    pub fn axes(&self) -> Result<&AxisTable, MappingError> {
        match self.tables.get(&DeviceClass::Axes) {
            Some(MappingTable::Axes(table)) => Ok(table),
            Some(MappingTable::Buttons(_)) => Err(MappingError::TableKind {
                class: DeviceClass::Axes,
                expected: "axes",
            }),
            None => Err(MappingError::UnsupportedDevice(DeviceClass::Axes.to_string())),
        }
    }

    /// Physical indices for a logical name. Unknown names resolve to nothing;
    /// axes resolve to their `[x, y]` pair.
    pub fn resolve(&self, class: DeviceClass, name: &str) -> Result<Vec<usize>, MappingError> {
        let indices = match class {
            DeviceClass::Axes => self
                .axes()?
                .resolve(name)
                .map(|binding| vec![binding.x, binding.y])
                .unwrap_or_default(),
            _ => self.buttons(class)?.resolve(name).to_vec(),
        };
        debug!("Resolved {}:{} to {:?}", class, name, indices);
        Ok(indices)
    }

    /// All logical names bound to a physical index
    pub fn reverse(&self, class: DeviceClass, index: usize) -> Result<Vec<&str>, MappingError> {
        match class {
            DeviceClass::Axes => Ok(self
                .axes()?
                .iter()
                .filter(|(_, binding)| binding.x == index || binding.y == index)
                .map(|(name, _)| name)
                .collect()),
            _ => Ok(self.buttons(class)?.names_for(index)),
        }
    }
}
