#![allow(dead_code)]

use padflow::controller::{FrameHandle, FrameScheduler};
use padflow::{EventType, InputEngine, InputEvent, ListenerOptions, MemoryHost, Paused, RefreshScheduler};
use std::cell::RefCell;
use std::rc::Rc;

pub type Log = Rc<RefCell<Vec<InputEvent>>>;

pub fn engine() -> (MemoryHost, InputEngine<Paused>) {
    let host = MemoryHost::new();
    let engine = InputEngine::create(host.clone(), RefreshScheduler::new());
    (host, engine)
}

/// Registers a listener that appends every event it receives to the returned log
pub fn record(engine: &mut InputEngine<Paused>, types: &str, ids: &str, options: ListenerOptions) -> Log {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine
        .on(types, ids, options, move |event: &InputEvent| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        })
        .unwrap();
    log
}

pub fn kinds(log: &Log) -> Vec<EventType> {
    log.borrow().iter().map(|event| event.kind).collect()
}

pub fn count(log: &Log, kind: EventType) -> usize {
    log.borrow().iter().filter(|event| event.kind == kind).count()
}

/// Scheduler that records every request and cancellation
#[derive(Clone, Default)]
pub struct RecordingScheduler {
    pub calls: Rc<RefCell<Vec<String>>>,
    next: Rc<RefCell<u64>>,
}

impl FrameScheduler for RecordingScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut next = self.next.borrow_mut();
        *next += 1;
        self.calls.borrow_mut().push(format!("request {}", *next));
        FrameHandle(*next)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.calls.borrow_mut().push(format!("cancel {}", handle.0));
    }
}
