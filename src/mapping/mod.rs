//! Mapping layer translating logical button and axis names into physical indices.
//!
//! Three device classes are declared by default (`gamepad`, `keyboard`, `axes`).
//! Tables can be replaced wholesale at runtime, and per-device [`MappingProfile`]s
//! can override the controller tables for specific hardware.

pub mod defaults;
pub mod error;
pub mod profile;
pub mod table;

pub use error::MappingError;
pub use profile::MappingProfile;
pub use table::{
    AxisBinding, AxisSpec, AxisTable, ButtonTable, DeviceClass, MappingSet, MappingTable,
    OneOrMany,
};
