use gilrs::{Axis, Button, Event, EventType, Gilrs};
use statum::{machine, state};
use tracing::{debug, info, warn};

use crate::controller::host::{ButtonReading, HostError, InputHost, KeyEvent, RawFrame};

// Standard layout order; the position in this table is the physical button index
const BUTTON_LAYOUT: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

// Stick axes in standard order; `true` flips gilrs' up-positive Y to down-positive
const AXIS_LAYOUT: [(Axis, bool); 4] = [
    (Axis::LeftStickX, false),
    (Axis::LeftStickY, true),
    (Axis::RightStickX, false),
    (Axis::RightStickY, true),
];

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub joystick_deadzone: f32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

/// gilrs-backed [`InputHost`]. gilrs exposes no keyboard, so key events are
/// always empty.
#[machine]
pub struct EventCollector<S: CollectionState> {
    gilrs: Gilrs,
    settings: CollectorSettings,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }
}

impl EventCollector<Initializing> {
    pub fn create(settings: Option<CollectorSettings>) -> Result<Self, HostError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                return Err(HostError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, settings))
    }

    /// Logs the controllers present at startup and starts collecting
    pub fn initialize(self) -> EventCollector<Collecting> {
        let gamepads: Vec<_> = self.gilrs.gamepads().collect();
        if gamepads.is_empty() {
            warn!("No gamepad connected, continuing in idle mode");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (id, gamepad) in &gamepads {
                info!(
                    "  [{}] Name: {}, UUID: {:?}",
                    usize::from(*id),
                    gamepad.name(),
                    gamepad.uuid()
                );
            }
        }
        self.transition()
    }
}

impl EventCollector<Collecting> {
    // Pump gilrs so its cached gamepad state is current
    fn drain_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => info!("Controller {} connected", usize::from(id)),
                EventType::Disconnected => warn!("Controller {} disconnected", usize::from(id)),
                other => debug!("gilrs event on {}: {:?}", usize::from(id), other),
            }
        }
    }
}

impl InputHost for EventCollector<Collecting> {
    fn snapshot(&mut self) -> Vec<Option<RawFrame>> {
        self.drain_events();

        let deadzone = self.settings.joystick_deadzone;
        let mut slots: Vec<Option<RawFrame>> = Vec::new();

        for (id, gamepad) in self.gilrs.gamepads() {
            let slot = usize::from(id);
            let buttons = BUTTON_LAYOUT
                .iter()
                .map(|&button| match gamepad.button_data(button) {
                    Some(data) => ButtonReading {
                        pressed: data.is_pressed(),
                        value: data.value(),
                    },
                    None => ButtonReading::released(),
                })
                .collect();
            let axes = AXIS_LAYOUT
                .iter()
                .map(|&(axis, flip)| {
                    let value = apply_deadzone(gamepad.value(axis), deadzone);
                    if flip {
                        -value
                    } else {
                        value
                    }
                })
                .collect();

            if slots.len() <= slot {
                slots.resize(slot + 1, None);
            }
            slots[slot] = Some(RawFrame {
                name: gamepad.name().to_string(),
                connected: gamepad.is_connected(),
                buttons,
                axes,
            });
        }

        slots
    }

    fn attach_keyboard(&mut self) {
        debug!("gilrs has no keyboard, key events stay empty");
    }

    fn detach_keyboard(&mut self) {}

    fn drain_key_events(&mut self) -> Vec<KeyEvent> {
        Vec::new()
    }
}

// Helper function to apply deadzone to analog stick values
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadzone_clamps_and_rescales() {
        assert_eq!(apply_deadzone(0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(1.0, 0.05), 1.0);
        assert_eq!(apply_deadzone(-1.0, 0.05), -1.0);
        let mid = apply_deadzone(0.525, 0.05);
        assert!((mid - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_layout_puts_dpad_at_twelve() {
        assert_eq!(BUTTON_LAYOUT[12], Button::DPadUp);
        assert_eq!(BUTTON_LAYOUT[15], Button::DPadRight);
        assert_eq!(BUTTON_LAYOUT.len(), 17);
    }
}
