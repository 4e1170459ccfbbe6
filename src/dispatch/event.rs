use crate::tracker::SourceId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use super::RegistrationError;

/// Kinds of events delivered to callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Press,
    Hold,
    Release,
    Axis,
    Connect,
    Disconnect,
}

impl EventType {
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, EventType::Connect | EventType::Disconnect)
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::Press => "press",
            EventType::Hold => "hold",
            EventType::Release => "release",
            EventType::Axis => "axis",
            EventType::Connect => "connect",
            EventType::Disconnect => "disconnect",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for EventType {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "press" => Ok(EventType::Press),
            "hold" => Ok(EventType::Hold),
            "release" => Ok(EventType::Release),
            "axis" => Ok(EventType::Axis),
            "connect" => Ok(EventType::Connect),
            "disconnect" => Ok(EventType::Disconnect),
            other => Err(RegistrationError::UnknownEventType(other.to_string())),
        }
    }
}

/// Device lifecycle notifications; each has at most one handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceEvent {
    Connect,
    Disconnect,
}

impl From<DeviceEvent> for EventType {
    fn from(event: DeviceEvent) -> Self {
        match event {
            DeviceEvent::Connect => EventType::Connect,
            DeviceEvent::Disconnect => EventType::Disconnect,
        }
    }
}

/// Payload handed to every callback
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub kind: EventType,
    /// Logical name; the device name for lifecycle events
    pub id: String,
    /// Button magnitude, or the dominant stick component for axis events
    pub value: f32,
    /// Both stick components, axis events only
    pub axes: Option<[f32; 2]>,
    pub source: SourceId,
    pub timestamp: DateTime<Local>,
}

impl InputEvent {
    pub fn new(kind: EventType, id: &str, value: f32, source: SourceId) -> Self {
        Self {
            kind,
            id: id.to_string(),
            value,
            axes: None,
            source,
            timestamp: Local::now(),
        }
    }

    pub fn axis(id: &str, components: [f32; 2], source: SourceId) -> Self {
        let [x, y] = components;
        let value = if x.abs() >= y.abs() { x } else { y };
        Self {
            axes: Some(components),
            ..Self::new(EventType::Axis, id, value, source)
        }
    }
}

/// Per-listener firing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListenerOptions {
    /// Active ticks to swallow after each fresh activation
    #[serde(default)]
    pub delay: u32,
    /// Fire at most once per activation
    #[serde(default)]
    pub once: bool,
}

impl ListenerOptions {
    pub fn with_delay(mut self, ticks: u32) -> Self {
        self.delay = ticks;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}
