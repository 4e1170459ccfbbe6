use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, error, info};

use super::event::{DeviceEvent, EventType, InputEvent, ListenerOptions};
use super::{expand, RegistrationError};
use crate::tracker::{FireGate, SourceId, Transition};

/// Callbacks report failure through `Err`; the dispatcher logs it and moves on
pub type ListenerResult = color_eyre::Result<()>;

/// One callback may back several listeners after expansion
pub type Callback = Rc<RefCell<dyn FnMut(&InputEvent) -> ListenerResult>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub struct Listener {
    pub id: ListenerId,
    pub kind: EventType,
    pub logical_id: String,
    pub options: ListenerOptions,
    callback: Callback,
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("logical_id", &self.logical_id)
            .field("options", &self.options)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub fired: usize,
    pub faults: usize,
}

impl DispatchOutcome {
    pub fn merge(&mut self, other: DispatchOutcome) {
        self.fired += other.fired;
        self.faults += other.faults;
    }
}

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Listener>,
    lifecycle: BTreeMap<DeviceEvent, Callback>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one listener per expanded (type, id) pair, all sharing `callback`
    pub fn add<S: AsRef<str>>(
        &mut self,
        types: &[S],
        ids: &[S],
        options: ListenerOptions,
        callback: Callback,
    ) -> Result<Vec<ListenerId>, RegistrationError> {
        let pairs = expand(types, ids)?;
        let mut added = Vec::with_capacity(pairs.len());

        for (kind, logical_id) in pairs {
            self.next_id += 1;
            let id = ListenerId(self.next_id);
            debug!(
                "Registered {} listener {:?} on '{}' with {:?}",
                kind, id, logical_id, options
            );
            self.listeners.push(Listener {
                id,
                kind,
                logical_id,
                options,
                callback: callback.clone(),
            });
            added.push(id);
        }

        Ok(added)
    }

    /// Removes every listener matching an expanded (type, id) pair
    pub fn remove<S: AsRef<str>>(
        &mut self,
        types: &[S],
        ids: &[S],
    ) -> Result<usize, RegistrationError> {
        let pairs = expand(types, ids)?;
        let before = self.listeners.len();
        self.listeners.retain(|listener| {
            !pairs
                .iter()
                .any(|(kind, id)| listener.kind == *kind && listener.logical_id == *id)
        });
        let removed = before - self.listeners.len();
        debug!("Removed {} listeners", removed);
        Ok(removed)
    }

    /// Installs the single handler for a lifecycle event, replacing any previous one
    pub fn set_lifecycle(&mut self, event: DeviceEvent, callback: Callback) {
        if self.lifecycle.insert(event, callback).is_some() {
            info!("Replaced {:?} handler", event);
        }
    }

    pub fn clear_lifecycle(&mut self, event: DeviceEvent) -> bool {
        self.lifecycle.remove(&event).is_some()
    }

    pub fn has_lifecycle(&self, event: DeviceEvent) -> bool {
        self.lifecycle.contains_key(&event)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
        self.lifecycle.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn listeners(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.iter()
    }

    /// Fires every listener on (kind, id) without any gating
    pub fn trigger(&self, kind: EventType, id: &str, value: f32, source: SourceId) -> DispatchOutcome {
        self.emit(&InputEvent::new(kind, id, value, source))
    }

    /// Fires every listener matching the event's kind and id
    pub fn emit(&self, event: &InputEvent) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for listener in self
            .listeners
            .iter()
            .filter(|l| l.kind == event.kind && l.logical_id == event.id)
        {
            invoke(listener, event, &mut outcome);
        }
        outcome
    }

    /// Notifies the lifecycle handler, if any. `name` is the device name.
    pub fn notify(&self, event: DeviceEvent, source: SourceId, name: &str) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let Some(callback) = self.lifecycle.get(&event) else {
            debug!("No {:?} handler for {}", event, source);
            return outcome;
        };

        let payload = InputEvent::new(event.into(), name, 0.0, source);
        match (&mut *callback.borrow_mut())(&payload) {
            Ok(()) => outcome.fired += 1,
            Err(e) => {
                error!("{:?} handler failed for {}: {}", event, source, e);
                outcome.faults += 1;
            }
        }
        outcome
    }

    /// Dispatches one button transition, applying each listener's delay and
    /// once policy through the gates stored with the (source, id) state.
    ///
    /// Press listeners stay candidates on later active ticks until they have
    /// fired, which is how a delayed press is eventually delivered. Hold
    /// listeners are candidates on every tick after the first. Release is
    /// never gated.
    pub fn dispatch_transition(
        &self,
        transition: &Transition,
        source: SourceId,
        gates: &mut BTreeMap<ListenerId, FireGate>,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for listener in self
            .listeners
            .iter()
            .filter(|l| l.logical_id == transition.id)
        {
            let fire = match (listener.kind, transition.kind) {
                (EventType::Release, EventType::Release) => true,
                (EventType::Press, EventType::Press | EventType::Hold) => {
                    let gate = gates
                        .entry(listener.id)
                        .or_insert_with(|| FireGate::new(&listener.options));
                    !gate.has_triggered && gate.admit(&listener.options)
                }
                (EventType::Hold, EventType::Hold) => gates
                    .entry(listener.id)
                    .or_insert_with(|| FireGate::new(&listener.options))
                    .admit(&listener.options),
                _ => false,
            };

            if fire {
                let event = InputEvent::new(listener.kind, &transition.id, transition.value, source);
                invoke(listener, &event, &mut outcome);
            }
        }

        outcome
    }
}

fn invoke(listener: &Listener, event: &InputEvent, outcome: &mut DispatchOutcome) {
    match (&mut *listener.callback.borrow_mut())(event) {
        Ok(()) => outcome.fired += 1,
        Err(e) => {
            error!(
                "Listener {:?} ({} '{}') failed: {}",
                listener.id, listener.kind, listener.logical_id, e
            );
            outcome.faults += 1;
        }
    }
}
