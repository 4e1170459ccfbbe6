//! Device quirk normalizer.
//!
//! Some controllers do not report their directional pad as four buttons:
//!
//! - **Split axis**: the d-pad is two extra analog axes (the last two), one
//!   horizontal and one vertical. The vertical axis reports up as positive and
//!   is sign-flipped before thresholding.
//! - **Combined axis**: the d-pad is a single analog axis (the last one) that
//!   takes one of nine fixed readings, one per compass direction plus an idle
//!   reading well outside `[-1, 1]`.
//!
//! A source is classified once when it connects. From then on its quirky axes
//! are decoded into a [`DPadState`] every tick, which the tracker treats
//! exactly like four physical d-pad buttons.

use crate::controller::RawFrame;
use crate::mapping::defaults::{
    D_PAD_DOWN, D_PAD_LEFT, D_PAD_RIGHT, D_PAD_UP, STANDARD_BUTTON_COUNT,
};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Range;
use tracing::debug;

/// How a controller reports its directional pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuirkMode {
    /// Four independent buttons
    #[default]
    Standard,
    /// Two analog axes
    SplitAxisDPad,
    /// One analog axis with enumerated readings
    CombinedAxisDPad,
}

impl Display for QuirkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuirkMode::Standard => write!(f, "Standard"),
            QuirkMode::SplitAxisDPad => write!(f, "SplitAxisDPad"),
            QuirkMode::CombinedAxisDPad => write!(f, "CombinedAxisDPad"),
        }
    }
}

impl QuirkMode {
    /// Indices of the axes that carry the d-pad and are not stick axes
    pub fn consumed_axes(&self, axis_count: usize) -> Range<usize> {
        let consumed = match self {
            QuirkMode::Standard => 0,
            QuirkMode::SplitAxisDPad => 2,
            QuirkMode::CombinedAxisDPad => 1,
        };
        axis_count.saturating_sub(consumed)..axis_count
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QuirkError {
    #[error("Unrecognized combined d-pad reading: {value}")]
    UnrecognizedReading { value: f32 },
}

/// Classifies a freshly connected controller from its first frame
pub fn classify(frame: &RawFrame) -> QuirkMode {
    if let Some(&last) = frame.axes.last() {
        if !(-1.0..=1.0).contains(&last) {
            return QuirkMode::CombinedAxisDPad;
        }
    }
    if frame.buttons.len() < STANDARD_BUTTON_COUNT && frame.axes.len() >= 2 {
        return QuirkMode::SplitAxisDPad;
    }
    QuirkMode::Standard
}

/// Which d-pad directions are held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DPadState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DPadState {
    pub const CENTERED: DPadState = DPadState::new(false, false, false, false);

    pub const fn new(up: bool, down: bool, left: bool, right: bool) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }

    /// Logical names of the held directions
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.up, D_PAD_UP),
            (self.down, D_PAD_DOWN),
            (self.left, D_PAD_LEFT),
            (self.right, D_PAD_RIGHT),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .map(|(_, name)| name)
        .collect()
    }

    pub fn is_centered(&self) -> bool {
        *self == Self::CENTERED
    }
}

/// Logical names the quirk decoders drive
pub const D_PAD_NAMES: [&str; 4] = [D_PAD_UP, D_PAD_DOWN, D_PAD_LEFT, D_PAD_RIGHT];

/// Split-axis decode. Both components are compared strictly against `threshold`.
pub fn decode_split(axes: &[f32], threshold: f32) -> DPadState {
    let count = axes.len();
    if count < 2 {
        return DPadState::CENTERED;
    }
    let x = axes[count - 2];
    let y = -axes[count - 1];
    DPadState::new(y < -threshold, y > threshold, x < -threshold, x > threshold)
}

/// Idle reading of a combined-axis d-pad
pub const COMBINED_IDLE: f32 = 3.285_714_1;

// Readings observed from combined-axis firmware, one per direction
const COMBINED_TABLE: [(f32, DPadState); 9] = [
    (-1.0, DPadState::new(true, false, false, false)),
    (-0.714_285_7, DPadState::new(true, false, false, true)),
    (-0.428_571_4, DPadState::new(false, false, false, true)),
    (-0.142_857_13, DPadState::new(false, true, false, true)),
    (0.142_857_19, DPadState::new(false, true, false, false)),
    (0.428_571_46, DPadState::new(false, true, true, false)),
    (0.714_285_7, DPadState::new(false, false, true, false)),
    (1.0, DPadState::new(true, false, true, false)),
    (COMBINED_IDLE, DPadState::CENTERED),
];

// Readings are float32 renderings of k/7 steps; anything this close is the same reading
const DECODE_TOLERANCE: f32 = 1e-4;

/// Combined-axis decode against the fixed reading table
pub fn decode_combined(value: f32) -> Result<DPadState, QuirkError> {
    COMBINED_TABLE
        .iter()
        .find(|(reading, _)| (reading - value).abs() <= DECODE_TOLERANCE)
        .map(|(_, state)| *state)
        .ok_or(QuirkError::UnrecognizedReading { value })
}

/// Directions released and pressed when moving between two d-pad states
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DPadTransition {
    pub released: Vec<&'static str>,
    pub pressed: Vec<&'static str>,
}

pub fn transition(previous: DPadState, current: DPadState) -> DPadTransition {
    let before = previous.names();
    let after = current.names();
    DPadTransition {
        released: before
            .iter()
            .filter(|name| !after.contains(name))
            .copied()
            .collect(),
        pressed: after
            .iter()
            .filter(|name| !before.contains(name))
            .copied()
            .collect(),
    }
}

/// Per-source decoder state
#[derive(Debug, Clone, Default)]
pub struct QuirkDecoder {
    mode: QuirkMode,
    last_reading: Option<f32>,
    last_state: DPadState,
}

impl QuirkDecoder {
    pub fn new(mode: QuirkMode) -> Self {
        debug!("Quirk decoder in {} mode", mode);
        Self {
            mode,
            last_reading: None,
            last_state: DPadState::CENTERED,
        }
    }

    pub fn mode(&self) -> QuirkMode {
        self.mode
    }

    /// Last successfully decoded combined-axis reading
    pub fn last_reading(&self) -> Option<f32> {
        self.last_reading
    }

    pub fn last_state(&self) -> DPadState {
        self.last_state
    }

    /// Decodes this tick's d-pad. `Ok(None)` for standard controllers, whose
    /// d-pad buttons go through the regular mapping. On an unrecognized reading
    /// the previous state is kept.
    pub fn decode(
        &mut self,
        frame: &RawFrame,
        threshold: f32,
    ) -> Result<Option<DPadState>, QuirkError> {
        let state = match self.mode {
            QuirkMode::Standard => return Ok(None),
            QuirkMode::SplitAxisDPad => decode_split(&frame.axes, threshold),
            QuirkMode::CombinedAxisDPad => {
                let value = frame.axes.last().copied().unwrap_or(COMBINED_IDLE);
                let state = decode_combined(value)?;
                // press/release edges come from the tracker's diff, not from here
                self.last_reading = Some(value);
                state
            }
        };
        self.last_state = state;
        Ok(Some(state))
    }
}
