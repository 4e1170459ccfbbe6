mod common;

use common::{engine, record};
use padflow::{InputEvent, ListenerOptions, RawFrame};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_run_stops_on_listener_pause_request() {
    let (host, mut engine) = engine();
    host.connect(0, RawFrame::standard("Pad"));
    engine.set_refresh_interval(Duration::from_millis(1));
    let control = engine.control();
    engine
        .on("hold", "start", ListenerOptions::default().with_delay(2), move |_: &InputEvent| {
            control.request_pause();
            Ok(())
        })
        .unwrap();
    host.press(0, 9);

    let engine = timeout(Duration::from_secs(5), engine.resume().run())
        .await
        .expect("run loop did not stop");

    assert!(!host.keyboard_attached());
    // press, two suppressed holds, the firing hold
    assert_eq!(host.snapshots(), 4);
    engine.destroy();
}

#[tokio::test]
async fn test_run_until_shutdown_ticks_and_pauses() {
    let (host, mut engine) = engine();
    engine.set_refresh_interval(Duration::from_millis(2));
    let log = record(&mut engine, "press", "button_1", ListenerOptions::default());
    host.connect(0, RawFrame::standard("Pad"));
    host.press(0, 0);

    let engine = timeout(
        Duration::from_secs(5),
        engine
            .resume()
            .run_until_shutdown(tokio::time::sleep(Duration::from_millis(50))),
    )
    .await
    .expect("shutdown was not honoured");

    assert!(host.snapshots() >= 1);
    assert_eq!(log.borrow().len(), 1);
    assert!(!host.keyboard_attached());
    assert!(engine.button_state(padflow::SourceId::Gamepad(0), "button_1").is_some());
}
