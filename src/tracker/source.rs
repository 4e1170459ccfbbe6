use serde::Serialize;
use std::fmt::{self, Display};
use tracing::{debug, info};

use super::state::ButtonStates;
use crate::quirk::{QuirkDecoder, QuirkMode};

/// Identity of an input source: a gamepad slot index, or the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SourceId {
    Gamepad(usize),
    Keyboard,
}

impl Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Gamepad(slot) => write!(f, "gamepad:{}", slot),
            SourceId::Keyboard => write!(f, "keyboard"),
        }
    }
}

/// Everything the engine remembers about one live source
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub id: SourceId,
    pub name: String,
    pub decoder: QuirkDecoder,
    /// Index into the engine's mapping profiles
    pub profile: Option<usize>,
    pub states: ButtonStates,
}

impl SourceRecord {
    pub fn new(id: SourceId, name: &str, mode: QuirkMode, profile: Option<usize>) -> Self {
        Self {
            id,
            name: name.to_string(),
            decoder: QuirkDecoder::new(mode),
            profile,
            states: ButtonStates::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    record: Option<SourceRecord>,
}

/// Slot-indexed store of gamepad records plus the keyboard singleton.
///
/// A slot's generation advances on every connect, so a reconnect in the same
/// slot is a new source with empty state.
#[derive(Debug)]
pub struct SourceArena {
    slots: Vec<Slot>,
    keyboard: SourceRecord,
}

impl Default for SourceArena {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            keyboard: SourceRecord::new(SourceId::Keyboard, "keyboard", QuirkMode::Standard, None),
        }
    }
}

impl SourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_connected(&self, slot: usize) -> bool {
        self.slots
            .get(slot)
            .is_some_and(|s| s.record.is_some())
    }

    pub fn generation(&self, slot: usize) -> u64 {
        self.slots.get(slot).map_or(0, |s| s.generation)
    }

    pub fn connect(
        &mut self,
        slot: usize,
        name: &str,
        mode: QuirkMode,
        profile: Option<usize>,
    ) -> &mut SourceRecord {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, Slot::default);
        }
        let entry = &mut self.slots[slot];
        entry.generation += 1;
        info!(
            "Source gamepad:{} connected: '{}' ({}, generation {})",
            slot, name, mode, entry.generation
        );
        entry
            .record
            .insert(SourceRecord::new(SourceId::Gamepad(slot), name, mode, profile))
    }

    /// Drops the slot's record and all its button state
    pub fn disconnect(&mut self, slot: usize) -> Option<SourceRecord> {
        let record = self.slots.get_mut(slot)?.record.take()?;
        info!("Source {} disconnected: '{}'", record.id, record.name);
        Some(record)
    }

    pub fn get(&self, source: SourceId) -> Option<&SourceRecord> {
        match source {
            SourceId::Keyboard => Some(&self.keyboard),
            SourceId::Gamepad(slot) => self.slots.get(slot)?.record.as_ref(),
        }
    }

    pub fn get_mut(&mut self, source: SourceId) -> Option<&mut SourceRecord> {
        match source {
            SourceId::Keyboard => Some(&mut self.keyboard),
            SourceId::Gamepad(slot) => self.slots.get_mut(slot)?.record.as_mut(),
        }
    }

    pub fn keyboard_mut(&mut self) -> &mut SourceRecord {
        &mut self.keyboard
    }

    /// Connected gamepads in slot order
    pub fn live(&self) -> Vec<SourceId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.record.is_some())
            .map(|(slot, _)| SourceId::Gamepad(slot))
            .collect()
    }

    /// Forgets every gamepad and the keyboard's button state. Gamepads still
    /// present are seen as new connections on the next tick.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.record = None;
        }
        self.keyboard.states.clear();
        debug!("Source state reset");
    }
}
