//! Built-in mapping tables.
//!
//! Gamepad indices follow the standard controller layout (face buttons first,
//! d-pad at 12..15, vendor/guide button last). Keyboard entries are key codes;
//! the d-pad is reachable from both the arrow keys and WASD.

use crate::mapping::{AxisBinding, AxisTable, ButtonTable};

pub const D_PAD_UP: &str = "d_pad_up";
pub const D_PAD_DOWN: &str = "d_pad_down";
pub const D_PAD_LEFT: &str = "d_pad_left";
pub const D_PAD_RIGHT: &str = "d_pad_right";

pub const STICK_AXIS_LEFT: &str = "stick_axis_left";
pub const STICK_AXIS_RIGHT: &str = "stick_axis_right";

/// Buttons a controller must report for its d-pad to be four real buttons
pub const STANDARD_BUTTON_COUNT: usize = 16;

/// Default analog activation threshold
pub const DEFAULT_THRESHOLD: f32 = 0.3;

pub fn gamepad() -> ButtonTable {
    ButtonTable::new()
        .with("button_1", vec![0])
        .with("button_2", vec![1])
        .with("button_3", vec![2])
        .with("button_4", vec![3])
        .with("shoulder_top_left", vec![4])
        .with("shoulder_top_right", vec![5])
        .with("shoulder_bottom_left", vec![6])
        .with("shoulder_bottom_right", vec![7])
        .with("select", vec![8])
        .with("start", vec![9])
        .with("stick_button_left", vec![10])
        .with("stick_button_right", vec![11])
        .with(D_PAD_UP, vec![12])
        .with(D_PAD_DOWN, vec![13])
        .with(D_PAD_LEFT, vec![14])
        .with(D_PAD_RIGHT, vec![15])
        .with("vendor", vec![16])
}

pub fn keyboard() -> ButtonTable {
    ButtonTable::new()
        .with("button_1", vec![32]) // space
        .with("start", vec![27]) // escape
        .with(D_PAD_UP, vec![38, 87])
        .with(D_PAD_DOWN, vec![40, 83])
        .with(D_PAD_LEFT, vec![37, 65])
        .with(D_PAD_RIGHT, vec![39, 68])
}

pub fn axes() -> AxisTable {
    AxisTable::new()
        .with(STICK_AXIS_LEFT, AxisBinding::new(0, 1))
        .with(STICK_AXIS_RIGHT, AxisBinding::new(2, 3))
}
