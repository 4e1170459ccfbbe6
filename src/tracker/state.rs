use std::collections::BTreeMap;
use tracing::trace;

use crate::dispatch::{EventType, ListenerId, ListenerOptions};

/// Delay/once bookkeeping for one listener on one (source, id) activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireGate {
    pub delay_remaining: u32,
    pub has_triggered: bool,
}

impl FireGate {
    pub fn new(options: &ListenerOptions) -> Self {
        Self {
            delay_remaining: options.delay,
            has_triggered: false,
        }
    }

    /// Consumes one candidate tick; returns whether the listener fires on it.
    /// Each fire reloads the delay, so `delay: n` fires every n+1 candidates.
    pub fn admit(&mut self, options: &ListenerOptions) -> bool {
        if self.delay_remaining > 0 {
            self.delay_remaining -= 1;
            return false;
        }
        if options.once && self.has_triggered {
            return false;
        }
        self.has_triggered = true;
        self.delay_remaining = options.delay;
        true
    }
}

/// Live state of one logical id on one source, from first press until the
/// release has been dispatched
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonEventState {
    pub pressed: bool,
    pub hold: bool,
    pub released: bool,
    pub value: f32,
    pub gates: BTreeMap<ListenerId, FireGate>,
}

impl ButtonEventState {
    fn pressed(value: f32) -> Self {
        Self {
            pressed: true,
            hold: false,
            released: false,
            value,
            gates: BTreeMap::new(),
        }
    }
}

/// One edge produced by [`ButtonStates::advance`]
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub kind: EventType,
    pub id: String,
    pub value: f32,
}

/// Per-source map of logical id to its current activation
#[derive(Debug, Clone, Default)]
pub struct ButtonStates {
    records: BTreeMap<String, ButtonEventState>,
}

impl ButtonStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds this tick's activation set into the records.
    ///
    /// `active` maps each active logical id to its magnitude. Ids in `frozen`
    /// keep their state untouched this tick. Returns one transition per id
    /// that is pressed, held or released, in id order.
    pub fn advance(&mut self, active: &BTreeMap<String, f32>, frozen: &[&str]) -> Vec<Transition> {
        let mut transitions = Vec::new();

        for (id, record) in self.records.iter_mut() {
            if frozen.contains(&id.as_str()) || active.contains_key(id) {
                continue;
            }
            record.pressed = false;
            record.hold = false;
            record.released = true;
            record.value = 0.0;
            transitions.push(Transition {
                kind: EventType::Release,
                id: id.clone(),
                value: 0.0,
            });
        }

        for (id, &value) in active {
            if frozen.contains(&id.as_str()) {
                continue;
            }
            let kind = match self.records.get_mut(id) {
                Some(record) => {
                    record.pressed = false;
                    record.hold = true;
                    record.value = value;
                    EventType::Hold
                }
                None => {
                    self.records
                        .insert(id.clone(), ButtonEventState::pressed(value));
                    EventType::Press
                }
            };
            transitions.push(Transition {
                kind,
                id: id.clone(),
                value,
            });
        }

        transitions.sort_by(|a, b| a.id.cmp(&b.id));
        trace!("Advanced button states: {:?}", transitions);
        transitions
    }

    pub fn gates_mut(&mut self, id: &str) -> Option<&mut BTreeMap<ListenerId, FireGate>> {
        self.records.get_mut(id).map(|record| &mut record.gates)
    }

    /// Ends the tick: pressed records become held, released records go away
    pub fn settle(&mut self) {
        self.records.retain(|_, record| !record.released);
        for record in self.records.values_mut() {
            if record.pressed {
                record.pressed = false;
                record.hold = true;
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ButtonEventState> {
        self.records.get(id)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
