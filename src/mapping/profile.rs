//! Per-device mapping profiles.
//!
//! A profile overrides the global gamepad and/or axes tables for controllers
//! whose reported name contains one of its `match_ids` (case-insensitive).
//! Selection happens once, when the controller connects.

use crate::mapping::{AxisTable, ButtonTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingProfile {
    /// Human-readable profile name used in logs
    pub name: String,

    /// Substrings of the device name this profile applies to
    #[serde(default)]
    pub match_ids: Vec<String>,

    #[serde(default)]
    pub gamepad: Option<ButtonTable>,

    #[serde(default)]
    pub axes: Option<AxisTable>,
}

impl MappingProfile {
    pub fn matches(&self, device_name: &str) -> bool {
        let device_name = device_name.to_lowercase();
        self.match_ids
            .iter()
            .any(|pattern| !pattern.is_empty() && device_name.contains(&pattern.to_lowercase()))
    }
}

/// Index of the first profile matching `device_name`
pub fn select(profiles: &[MappingProfile], device_name: &str) -> Option<usize> {
    let found = profiles.iter().position(|p| p.matches(device_name));
    match found {
        Some(index) => debug!(
            "Device '{}' uses mapping profile '{}'",
            device_name, profiles[index].name
        ),
        None => debug!("Device '{}' uses the global mapping", device_name),
    }
    found
}
