mod common;

use color_eyre::eyre::eyre;
use common::{count, engine, kinds, record, RecordingScheduler};
use padflow::mapping::{ButtonTable, MappingError, MappingProfile};
use padflow::{
    DeviceEvent, EngineError, EventType, InputEngine, InputEvent, ListenerOptions, MappingTable,
    MemoryHost, RawFrame, Registration, SourceId,
};

const PAD: SourceId = SourceId::Gamepad(0);

#[test]
fn test_press_hold_release_cycle() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let log = record(&mut engine, "press hold release", "button_1", ListenerOptions::default());
    let mut engine = engine.resume();

    host.press(0, 0);
    engine.tick();
    assert!(engine.button_state(PAD, "button_1").unwrap().hold);
    for _ in 0..3 {
        engine.tick();
    }
    host.release(0, 0);
    engine.tick();

    assert_eq!(
        kinds(&log),
        vec![
            EventType::Press,
            EventType::Hold,
            EventType::Hold,
            EventType::Hold,
            EventType::Release
        ]
    );
    assert!(engine.button_state(PAD, "button_1").is_none());
    assert_eq!(log.borrow()[0].source, PAD);
    assert_eq!(log.borrow()[4].value, 0.0);

    engine.tick();
    assert_eq!(log.borrow().len(), 5);
}

#[test]
fn test_once_fires_again_after_release() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let log = record(&mut engine, "hold", "start", ListenerOptions::default().once());
    let mut engine = engine.resume();

    host.press(0, 9);
    for _ in 0..5 {
        engine.tick();
    }
    assert_eq!(count(&log, EventType::Hold), 1);

    host.release(0, 9);
    engine.tick();
    host.press(0, 9);
    for _ in 0..3 {
        engine.tick();
    }
    assert_eq!(count(&log, EventType::Hold), 2);
}

#[test]
fn test_delay_suppresses_leading_ticks() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let press = record(&mut engine, "press", "select", ListenerOptions::default().with_delay(2));
    let mut engine = engine.resume();

    host.press(0, 8);
    engine.tick();
    engine.tick();
    assert!(press.borrow().is_empty());
    engine.tick();
    assert_eq!(count(&press, EventType::Press), 1);

    for _ in 0..5 {
        engine.tick();
    }
    assert_eq!(count(&press, EventType::Press), 1);
}

#[test]
fn test_delay_throttles_repeated_holds() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let hold = record(&mut engine, "hold", "select", ListenerOptions::default().with_delay(2));
    let mut engine = engine.resume();

    host.press(0, 8);
    let mut fired_on = Vec::new();
    for tick in 1..=10 {
        let before = hold.borrow().len();
        engine.tick();
        if hold.borrow().len() > before {
            fired_on.push(tick);
        }
    }

    // holds start on the second tick; each fire reloads the two-tick delay
    assert_eq!(fired_on, vec![4, 7, 10]);
}

#[test]
fn test_delay_resets_when_released_early() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let log = record(&mut engine, "press release", "select", ListenerOptions::default().with_delay(3));
    let mut engine = engine.resume();

    host.press(0, 8);
    engine.tick();
    engine.tick();
    host.release(0, 8);
    engine.tick();
    assert_eq!(kinds(&log), vec![EventType::Release]);

    host.press(0, 8);
    for _ in 0..3 {
        engine.tick();
    }
    assert_eq!(count(&log, EventType::Press), 0);
    engine.tick();
    assert_eq!(count(&log, EventType::Press), 1);
}

#[test]
fn test_axis_threshold_is_strict() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let log = record(&mut engine, "axis", "stick_axis_left", ListenerOptions::default());
    let mut engine = engine.resume();

    host.set_axis(0, 0, 0.3);
    engine.tick();
    assert!(log.borrow().is_empty());

    host.set_axis(0, 1, -0.31);
    engine.tick();
    engine.tick();
    assert_eq!(log.borrow().len(), 2);
    let event = log.borrow()[0].clone();
    assert_eq!(event.value, -0.31);
    assert_eq!(event.axes, Some([0.3, -0.31]));
}

#[test]
fn test_threshold_override() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let log = record(&mut engine, "axis", "stick_axis_right", ListenerOptions::default());
    engine.set_global_threshold(0.5).unwrap();
    let mut engine = engine.resume();

    host.set_axis(0, 2, 0.4);
    engine.tick();
    assert!(log.borrow().is_empty());

    host.set_axis(0, 2, 0.6);
    engine.tick();
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].value, 0.6);
    assert_eq!(log.borrow()[0].kind, EventType::Axis);
}

#[test]
fn test_invalid_threshold_rejected() {
    let (_, mut engine) = engine();
    assert!(matches!(
        engine.set_global_threshold(1.0),
        Err(EngineError::InvalidThreshold(_))
    ));
    assert!(engine.set_global_threshold(-0.2).is_err());
    assert_eq!(engine.threshold(), 0.3);
}

#[test]
fn test_alias_does_not_double_fire() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    engine
        .set_custom_mapping(
            "gamepad",
            MappingTable::Buttons(ButtonTable::new().with("fire", vec![0, 1])),
        )
        .unwrap();
    let log = record(&mut engine, "press release", "fire", ListenerOptions::default());
    let mut engine = engine.resume();

    host.press(0, 1);
    engine.tick();
    assert_eq!(kinds(&log), vec![EventType::Press]);
    host.release(0, 1);
    engine.tick();

    host.press(0, 0);
    host.press(0, 1);
    engine.tick();
    host.release(0, 0);
    engine.tick();
    assert_eq!(
        kinds(&log),
        vec![EventType::Press, EventType::Release, EventType::Press]
    );
    host.release(0, 1);
    engine.tick();
    assert_eq!(count(&log, EventType::Release), 2);
}

#[test]
fn test_keyboard_aliases_and_attachment() {
    let (host, mut engine) = engine();
    let log = record(&mut engine, "press hold release", "d_pad_up", ListenerOptions::default());

    host.key_down(38);
    assert!(!host.keyboard_attached());
    let mut engine = engine.resume();
    assert!(host.keyboard_attached());
    engine.tick();
    assert!(log.borrow().is_empty());

    host.key_down(38);
    host.key_down(87);
    engine.tick();
    host.key_up(38);
    engine.tick();
    host.key_up(87);
    engine.tick();

    assert_eq!(
        kinds(&log),
        vec![EventType::Press, EventType::Hold, EventType::Release]
    );
    assert_eq!(log.borrow()[0].source, SourceId::Keyboard);

    let engine = engine.pause();
    assert!(!host.keyboard_attached());
    engine.destroy();
}

#[test]
fn test_disconnect_clears_state_and_reconnect_starts_clean() {
    let (host, mut engine) = engine();
    let buttons = record(&mut engine, "press hold release", "button_2", ListenerOptions::default());
    let lifecycle: common::Log = Default::default();
    let connect_sink = lifecycle.clone();
    engine.on_device(DeviceEvent::Connect, move |event: &InputEvent| {
        connect_sink.borrow_mut().push(event.clone());
        Ok(())
    });
    let disconnect_sink = lifecycle.clone();
    engine.on_device(DeviceEvent::Disconnect, move |event: &InputEvent| {
        disconnect_sink.borrow_mut().push(event.clone());
        Ok(())
    });
    let mut engine = engine.resume();

    host.connect(0, RawFrame::standard("Pad").with_button(1, padflow::controller::ButtonReading::pressed(1.0)));
    let report = engine.tick();
    assert_eq!(report.connected, vec![PAD]);
    engine.tick();
    assert_eq!(engine.connected_sources(), vec![PAD]);

    host.disconnect(0);
    let report = engine.tick();
    assert_eq!(report.disconnected, vec![PAD]);
    assert!(engine.button_state(PAD, "button_2").is_none());
    assert!(engine.connected_sources().is_empty());

    host.connect(0, RawFrame::standard("Pad").with_button(1, padflow::controller::ButtonReading::pressed(1.0)));
    engine.tick();

    assert_eq!(
        kinds(&lifecycle),
        vec![EventType::Connect, EventType::Disconnect, EventType::Connect]
    );
    assert_eq!(lifecycle.borrow()[0].id, "Pad");
    assert_eq!(
        kinds(&buttons),
        vec![EventType::Press, EventType::Hold, EventType::Press]
    );
}

#[test]
fn test_disconnected_frame_counts_as_empty_slot() {
    let (host, engine) = engine();
    host.connect(1, RawFrame::standard("Pad"));
    let mut engine = engine.resume();
    assert_eq!(engine.tick().connected, vec![SourceId::Gamepad(1)]);

    let mut frame = RawFrame::standard("Pad");
    frame.connected = false;
    host.connect(1, frame);
    assert_eq!(engine.tick().disconnected, vec![SourceId::Gamepad(1)]);
}

#[test]
fn test_lifecycle_registration_resets_live_sources() {
    let (host, engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    host.press(0, 0);
    let mut engine = engine.resume();
    engine.tick();
    assert!(engine.button_state(PAD, "button_1").is_some());

    let connected: common::Log = Default::default();
    let sink = connected.clone();
    engine
        .register(
            Registration::Lifecycle(DeviceEvent::Connect),
            move |event: &InputEvent| {
                sink.borrow_mut().push(event.clone());
                Ok(())
            },
        )
        .unwrap();
    assert!(engine.button_state(PAD, "button_1").is_none());

    let report = engine.tick();
    assert_eq!(report.connected, vec![PAD]);
    assert_eq!(connected.borrow().len(), 1);
}

#[test]
fn test_lifecycle_types_rejected_in_listener_form() {
    let (_, mut engine) = engine();
    let result = engine.on("press connect", "start", ListenerOptions::default(), |_: &InputEvent| Ok(()));
    assert!(matches!(result, Err(EngineError::RegistrationError(_))));
    assert!(engine.on("tap", "start", ListenerOptions::default(), |_: &InputEvent| Ok(())).is_err());
    assert_eq!(engine.listener_count(), 0);
}

#[test]
fn test_compound_registration_and_off() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let log = record(&mut engine, "press release", "button_1 button_2", ListenerOptions::default());
    assert_eq!(engine.listener_count(), 4);

    assert_eq!(engine.off("press", "button_1").unwrap(), 1);
    let mut engine = engine.resume();
    host.press(0, 0);
    host.press(0, 1);
    engine.tick();

    let ids: Vec<String> = log.borrow().iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, vec!["button_2".to_string()]);
}

#[test]
fn test_unknown_device_class_leaves_mappings_untouched() {
    let (_, mut engine) = engine();
    let before = engine.mappings().resolve(padflow::DeviceClass::Gamepad, "start").unwrap();
    let result = engine.set_custom_mapping(
        "joystick",
        MappingTable::Buttons(ButtonTable::new().with("start", vec![0])),
    );
    assert!(matches!(
        result,
        Err(EngineError::MappingError(MappingError::UnsupportedDevice(ref class))) if class == "joystick"
    ));
    let after = engine.mappings().resolve(padflow::DeviceClass::Gamepad, "start").unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_faulting_listener_is_isolated() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    engine
        .on("press", "start", ListenerOptions::default(), |_: &InputEvent| Err(eyre!("listener failed")))
        .unwrap();
    let log = record(&mut engine, "press", "start", ListenerOptions::default());
    let mut engine = engine.resume();

    host.press(0, 9);
    let report = engine.tick();
    assert_eq!(report.faults, 1);
    assert_eq!(report.fired, 1);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_pause_cancels_frame_and_is_idempotent() {
    let host = MemoryHost::new();
    let scheduler = RecordingScheduler::default();
    let calls = scheduler.calls.clone();
    let engine = InputEngine::create(host.clone(), scheduler);

    let mut engine = engine.resume();
    assert!(engine.is_scheduled());
    engine.tick();
    let engine = engine.pause().pause();
    assert_eq!(
        *calls.borrow(),
        vec!["request 1".to_string(), "request 2".to_string(), "cancel 2".to_string()]
    );

    let engine = engine.resume();
    assert!(host.keyboard_attached());
    engine.destroy();
    assert!(!host.keyboard_attached());
}

#[test]
fn test_listener_requested_pause_stops_rescheduling() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    let control = engine.control();
    engine
        .on("press", "start", ListenerOptions::default(), move |_: &InputEvent| {
            control.request_pause();
            Ok(())
        })
        .unwrap();
    let mut engine = engine.resume();

    engine.tick();
    assert!(engine.is_scheduled());
    host.press(0, 9);
    engine.tick();
    assert!(!engine.is_scheduled());

    let snapshots = host.snapshots();
    assert_eq!(engine.tick(), padflow::TickReport::default());
    assert_eq!(host.snapshots(), snapshots);

    let engine = engine.pause().resume();
    assert!(engine.is_scheduled());
}

#[test]
fn test_profile_overrides_global_mapping() {
    let (host, mut engine) = engine();
    engine.set_profiles(vec![MappingProfile {
        name: "arcade".into(),
        match_ids: vec!["arcade stick".into()],
        gamepad: Some(ButtonTable::new().with("button_1", vec![5])),
        axes: None,
    }]);
    let log = record(&mut engine, "press", "button_1", ListenerOptions::default());
    host.connect(0, RawFrame::standard("Generic Arcade Stick"));
    host.connect(1, RawFrame::standard("Pad"));
    let mut engine = engine.resume();

    host.press(0, 0);
    host.press(1, 0);
    engine.tick();
    assert_eq!(engine.profile_name(SourceId::Gamepad(0)), Some("arcade"));
    assert_eq!(engine.profile_name(SourceId::Gamepad(1)), None);
    let sources: Vec<SourceId> = log.borrow().iter().map(|e| e.source).collect();
    assert_eq!(sources, vec![SourceId::Gamepad(1)]);

    host.press(0, 5);
    engine.tick();
    assert_eq!(log.borrow().len(), 2);
    assert_eq!(log.borrow()[1].source, SourceId::Gamepad(0));
}

#[test]
fn test_trigger_calls_matching_listeners() {
    let (_, mut engine) = engine();
    let log = record(&mut engine, "press", "start", ListenerOptions::default());
    let outcome = engine.trigger(EventType::Press, "start", 1.0, SourceId::Keyboard);
    assert_eq!(outcome.fired, 1);
    assert_eq!(engine.trigger(EventType::Release, "start", 0.0, SourceId::Keyboard).fired, 0);
    assert_eq!(log.borrow()[0].source, SourceId::Keyboard);
}
