//! In-memory input host.
//!
//! Frames and key events are fed by hand, which makes the host useful for
//! tests and for replaying scripted input. Clones share the same state, so one
//! clone can be handed to the engine while another keeps feeding it.

use crate::controller::host::{ButtonReading, InputHost, KeyEvent, RawFrame};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    slots: Vec<Option<RawFrame>>,
    key_events: VecDeque<KeyEvent>,
    keyboard_attached: bool,
    snapshots: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plugs a controller into `slot`, replacing whatever was there
    pub fn connect(&self, slot: usize, frame: RawFrame) {
        let mut state = self.state.borrow_mut();
        if state.slots.len() <= slot {
            state.slots.resize(slot + 1, None);
        }
        debug!("Memory host: controller '{}' in slot {}", frame.name, slot);
        state.slots[slot] = Some(frame);
    }

    pub fn disconnect(&self, slot: usize) {
        if let Some(entry) = self.state.borrow_mut().slots.get_mut(slot) {
            *entry = None;
        }
    }

    pub fn set_button(&self, slot: usize, index: usize, reading: ButtonReading) {
        self.update(slot, |frame| frame.set_button(index, reading));
    }

    pub fn press(&self, slot: usize, index: usize) {
        self.set_button(slot, index, ButtonReading::pressed(1.0));
    }

    pub fn release(&self, slot: usize, index: usize) {
        self.set_button(slot, index, ButtonReading::released());
    }

    pub fn set_axis(&self, slot: usize, index: usize, value: f32) {
        self.update(slot, |frame| frame.set_axis(index, value));
    }

    /// Key events are dropped while no keyboard listener is attached
    pub fn key_down(&self, code: usize) {
        self.push_key(KeyEvent::Down(code));
    }

    pub fn key_up(&self, code: usize) {
        self.push_key(KeyEvent::Up(code));
    }

    pub fn keyboard_attached(&self) -> bool {
        self.state.borrow().keyboard_attached
    }

    /// Number of snapshots taken so far
    pub fn snapshots(&self) -> usize {
        self.state.borrow().snapshots
    }

    fn push_key(&self, event: KeyEvent) {
        let mut state = self.state.borrow_mut();
        if state.keyboard_attached {
            state.key_events.push_back(event);
        }
    }

    fn update(&self, slot: usize, apply: impl FnOnce(&mut RawFrame)) {
        if let Some(Some(frame)) = self.state.borrow_mut().slots.get_mut(slot) {
            apply(frame);
        }
    }
}

impl InputHost for MemoryHost {
    fn snapshot(&mut self) -> Vec<Option<RawFrame>> {
        let mut state = self.state.borrow_mut();
        state.snapshots += 1;
        state.slots.clone()
    }

    fn attach_keyboard(&mut self) {
        self.state.borrow_mut().keyboard_attached = true;
    }

    fn detach_keyboard(&mut self) {
        let mut state = self.state.borrow_mut();
        state.keyboard_attached = false;
        state.key_events.clear();
    }

    fn drain_key_events(&mut self) -> Vec<KeyEvent> {
        self.state.borrow_mut().key_events.drain(..).collect()
    }
}
