//! One refresh of one source: resolve, decode, diff, dispatch.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::TickReport;
use crate::controller::RawFrame;
use crate::dispatch::{DispatchOutcome, InputEvent, ListenerRegistry};
use crate::mapping::{AxisTable, ButtonTable};
use crate::quirk::D_PAD_NAMES;
use crate::tracker::{ButtonStates, SourceId, SourceRecord};

/// Logical ids active this tick with their magnitude. Aliases keep the
/// largest magnitude of their pressed inputs.
pub(super) fn active_buttons<I>(table: &ButtonTable, pressed: I) -> BTreeMap<String, f32>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    let mut active: BTreeMap<String, f32> = BTreeMap::new();
    for (index, value) in pressed {
        for name in table.names_for(index) {
            active
                .entry(name.to_string())
                .and_modify(|current| *current = current.max(value))
                .or_insert(value);
        }
    }
    active
}

/// Diffs `active` into `states` and fires the resulting transitions
pub(super) fn apply_activation(
    states: &mut ButtonStates,
    active: &BTreeMap<String, f32>,
    frozen: &[&str],
    source: SourceId,
    listeners: &ListenerRegistry,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    let transitions = states.advance(active, frozen);

    for transition in &transitions {
        if let Some(gates) = states.gates_mut(&transition.id) {
            outcome.merge(listeners.dispatch_transition(transition, source, gates));
        }
    }

    states.settle();
    outcome
}

pub(super) fn process_gamepad(
    record: &mut SourceRecord,
    frame: &RawFrame,
    buttons: &ButtonTable,
    axes: &AxisTable,
    listeners: &ListenerRegistry,
    threshold: f32,
    report: &mut TickReport,
) {
    let source = record.id;
    let pressed = frame
        .buttons
        .iter()
        .enumerate()
        .filter(|(_, reading)| reading.pressed)
        .map(|(index, reading)| (index, reading.value));
    let mut active = active_buttons(buttons, pressed);
    let mut frozen: Vec<&str> = Vec::new();

    match record.decoder.decode(frame, threshold) {
        Ok(None) => {}
        Ok(Some(dpad)) => {
            for name in D_PAD_NAMES {
                active.remove(name);
            }
            for name in dpad.names() {
                active.insert(name.to_string(), 1.0);
            }
        }
        Err(e) => {
            warn!(
                "{} ('{}'): {}, d-pad skipped this tick",
                source, record.name, e
            );
            report.decode_warnings += 1;
            for name in D_PAD_NAMES {
                active.remove(name);
            }
            frozen.extend(D_PAD_NAMES);
        }
    }

    let outcome = apply_activation(&mut record.states, &active, &frozen, source, listeners);
    report.absorb(outcome);

    let consumed = record.decoder.mode().consumed_axes(frame.axes.len());
    for (name, binding) in axes.iter() {
        if consumed.contains(&binding.x) || consumed.contains(&binding.y) {
            continue;
        }
        let components = binding.read(&frame.axes);
        if components.iter().any(|c| c.abs() > threshold) {
            debug!("{} axis '{}' at {:?}", source, name, components);
            report.absorb(listeners.emit(&InputEvent::axis(name, components, source)));
        }
    }
}
