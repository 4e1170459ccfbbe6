//! Host-facing input types.
//!
//! The engine never talks to hardware directly. Each tick it asks an
//! [`InputHost`] for a snapshot of every physical controller slot and for the
//! keyboard events delivered since the previous tick.

use serde::{Deserialize, Serialize};

/// One physical button reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ButtonReading {
    pub pressed: bool,
    /// Analog magnitude in `[0, 1]`; digital buttons report 0 or 1
    pub value: f32,
}

impl ButtonReading {
    pub fn pressed(value: f32) -> Self {
        Self {
            pressed: true,
            value,
        }
    }

    pub fn released() -> Self {
        Self::default()
    }
}

/// Raw state of one controller slot for a single tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFrame {
    /// Device name as reported by the driver
    pub name: String,
    pub connected: bool,
    pub buttons: Vec<ButtonReading>,
    pub axes: Vec<f32>,
}

impl RawFrame {
    /// A connected controller with every input at rest
    pub fn new(name: &str, button_count: usize, axis_count: usize) -> Self {
        Self {
            name: name.to_string(),
            connected: true,
            buttons: vec![ButtonReading::released(); button_count],
            axes: vec![0.0; axis_count],
        }
    }

    /// Standard layout: 17 buttons, 4 stick axes
    pub fn standard(name: &str) -> Self {
        Self::new(name, 17, 4)
    }

    pub fn with_button(mut self, index: usize, reading: ButtonReading) -> Self {
        self.set_button(index, reading);
        self
    }

    pub fn with_axis(mut self, index: usize, value: f32) -> Self {
        self.set_axis(index, value);
        self
    }

    /// Out-of-range indices are ignored
    pub fn set_button(&mut self, index: usize, reading: ButtonReading) {
        if let Some(slot) = self.buttons.get_mut(index) {
            *slot = reading;
        }
    }

    pub fn set_axis(&mut self, index: usize, value: f32) {
        if let Some(slot) = self.axes.get_mut(index) {
            *slot = value;
        }
    }
}

/// Key transition delivered by the host keyboard listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    Down(usize),
    Up(usize),
}

/// Host errors
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Failed to initialize input host: {0}")]
    InitializationError(String),
}

/// Raw device access provided by the embedding environment
pub trait InputHost {
    /// One entry per physical slot; `None` or a disconnected frame marks an empty slot
    fn snapshot(&mut self) -> Vec<Option<RawFrame>>;

    /// Starts delivering keyboard events
    fn attach_keyboard(&mut self);

    /// Stops delivering keyboard events
    fn detach_keyboard(&mut self);

    /// Key transitions since the last call, oldest first
    fn drain_key_events(&mut self) -> Vec<KeyEvent>;
}
