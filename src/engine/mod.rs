//! Input engine lifecycle and the per-tick pipeline.
//!
//! ```text
//! InputEngine<Paused> ──resume()──► InputEngine<Running> ──tick()──┐
//!        ▲                                   │  ▲                 │
//!        └──────────────pause()──────────────┘  └─────────────────┘
//! ```
//!
//! A running engine holds at most one pending frame. Each tick snapshots the
//! host, reconciles connected sources, resolves logical ids, diffs them
//! against the previous tick and fires listeners inline. The next frame is
//! requested only while a live handle exists, so a pause requested from a
//! callback stops the refresh before the following tick.

mod error;
mod tick;

pub use error::EngineError;

use chrono::Local;
use statum::{machine, state};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::controller::{FrameHandle, FrameScheduler, InputHost, KeyEvent, RawFrame};
use crate::dispatch::{
    Callback, DeviceEvent, DispatchOutcome, EventType, InputEvent, ListenerId, ListenerOptions,
    ListenerRegistry, ListenerResult, Registration,
};
use crate::mapping::defaults::DEFAULT_THRESHOLD;
use crate::mapping::profile::select;
use crate::mapping::{DeviceClass, MappingProfile, MappingSet, MappingTable};
use crate::quirk::{classify, QuirkMode};
use crate::tracker::{ButtonEventState, SourceArena, SourceId};

/// Default refresh period, roughly one display frame
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 16;

/// Cloneable handle letting callbacks ask a running engine to stop
/// refreshing. The request is honoured at the end of the current tick.
#[derive(Debug, Clone, Default)]
pub struct EngineControl {
    pause_requested: Rc<Cell<bool>>,
}

impl EngineControl {
    pub fn request_pause(&self) {
        self.pause_requested.set(true);
    }

    pub fn is_pause_requested(&self) -> bool {
        self.pause_requested.get()
    }

    fn take_request(&self) -> bool {
        self.pause_requested.replace(false)
    }
}

/// What a single tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub fired: usize,
    pub faults: usize,
    pub decode_warnings: usize,
    pub connected: Vec<SourceId>,
    pub disconnected: Vec<SourceId>,
}

impl TickReport {
    fn absorb(&mut self, outcome: DispatchOutcome) {
        self.fired += outcome.fired;
        self.faults += outcome.faults;
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum EngineState {
    Paused,
    Running,
}

#[machine]
pub struct InputEngine<S: EngineState> {
    host: Box<dyn InputHost>,
    scheduler: Box<dyn FrameScheduler>,
    frame: Option<FrameHandle>,
    mappings: MappingSet,
    profiles: Vec<MappingProfile>,
    threshold: f32,
    refresh: Duration,
    listeners: ListenerRegistry,
    sources: SourceArena,
    keys_down: BTreeSet<usize>,
    control: EngineControl,
}

impl<S: EngineState> InputEngine<S> {
    /// Registers `callback` for every (type, id) pair named by the
    /// whitespace-separated `types` and `ids`
    pub fn on<F>(
        &mut self,
        types: &str,
        ids: &str,
        options: ListenerOptions,
        callback: F,
    ) -> Result<Vec<ListenerId>, EngineError>
    where
        F: FnMut(&InputEvent) -> ListenerResult + 'static,
    {
        self.register(Registration::listener(types, ids, options), callback)
    }

    /// Installs the single connect or disconnect handler. Live source state is
    /// reset, so sources still plugged in are reported again on the next tick.
    pub fn on_device<F>(&mut self, event: DeviceEvent, callback: F)
    where
        F: FnMut(&InputEvent) -> ListenerResult + 'static,
    {
        let callback: Callback = Rc::new(RefCell::new(callback));
        self.install_lifecycle(event, callback);
    }

    pub fn register<F>(
        &mut self,
        registration: Registration,
        callback: F,
    ) -> Result<Vec<ListenerId>, EngineError>
    where
        F: FnMut(&InputEvent) -> ListenerResult + 'static,
    {
        let callback: Callback = Rc::new(RefCell::new(callback));
        match registration {
            Registration::Listener {
                types,
                ids,
                options,
            } => Ok(self.listeners.add(&types, &ids, options, callback)?),
            Registration::Lifecycle(event) => {
                self.install_lifecycle(event, callback);
                Ok(Vec::new())
            }
        }
    }

    fn install_lifecycle(&mut self, event: DeviceEvent, callback: Callback) {
        self.listeners.set_lifecycle(event, callback);
        self.sources.reset();
        info!("Installed {:?} handler, source state reset", event);
    }

    /// Removes the listeners matching the expanded (type, id) pairs
    pub fn off(&mut self, types: &str, ids: &str) -> Result<usize, EngineError> {
        Ok(self.listeners.remove(&[types], &[ids])?)
    }

    pub fn off_device(&mut self, event: DeviceEvent) -> bool {
        self.listeners.clear_lifecycle(event)
    }

    /// Synchronously fires every listener on (kind, id), bypassing the tracker
    pub fn trigger(&self, kind: EventType, id: &str, value: f32, source: SourceId) -> DispatchOutcome {
        self.listeners.trigger(kind, id, value, source)
    }

    /// Replaces the table of a declared device class
    pub fn set_custom_mapping(&mut self, class: &str, table: MappingTable) -> Result<(), EngineError> {
        Ok(self.mappings.set_custom_mapping(class, table)?)
    }

    pub fn set_global_threshold(&mut self, threshold: f32) -> Result<(), EngineError> {
        if !(0.0..1.0).contains(&threshold) {
            return Err(EngineError::InvalidThreshold(threshold));
        }
        info!("Global threshold set to {}", threshold);
        self.threshold = threshold;
        Ok(())
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }

    pub fn set_refresh_interval(&mut self, refresh: Duration) {
        self.refresh = refresh.max(Duration::from_millis(1));
    }

    pub fn mappings(&self) -> &MappingSet {
        &self.mappings
    }

    /// Profiles are matched against device names when a source connects
    pub fn set_profiles(&mut self, profiles: Vec<MappingProfile>) {
        self.profiles = profiles;
    }

    pub fn control(&self) -> EngineControl {
        self.control.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn connected_sources(&self) -> Vec<SourceId> {
        self.sources.live()
    }

    pub fn quirk_mode(&self, source: SourceId) -> Option<QuirkMode> {
        self.sources.get(source).map(|record| record.decoder.mode())
    }

    /// Name of the mapping profile attached to a connected source
    pub fn profile_name(&self, source: SourceId) -> Option<&str> {
        let index = self.sources.get(source)?.profile?;
        self.profiles.get(index).map(|p| p.name.as_str())
    }

    pub fn button_state(&self, source: SourceId, id: &str) -> Option<&ButtonEventState> {
        self.sources.get(source)?.states.get(id)
    }
}

impl InputEngine<Paused> {
    pub fn create<H, F>(host: H, scheduler: F) -> Self
    where
        H: InputHost + 'static,
        F: FrameScheduler + 'static,
    {
        info!("Creating input engine");
        Self::new(
            Box::new(host),
            Box::new(scheduler),
            None,
            MappingSet::default(),
            Vec::new(),
            DEFAULT_THRESHOLD,
            Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            ListenerRegistry::new(),
            SourceArena::new(),
            BTreeSet::new(),
            EngineControl::default(),
        )
    }

    /// Creates an engine with threshold, refresh interval, mapping overrides
    /// and profiles taken from `config`
    pub fn from_config<H, F>(host: H, scheduler: F, config: &EngineConfig) -> Result<Self, EngineError>
    where
        H: InputHost + 'static,
        F: FrameScheduler + 'static,
    {
        let mut engine = Self::create(host, scheduler);
        engine.set_global_threshold(config.threshold)?;
        engine.set_refresh_interval(Duration::from_millis(config.refresh_interval_ms));

        let overrides = &config.mapping;
        if let Some(table) = &overrides.gamepad {
            engine.set_custom_mapping("gamepad", MappingTable::Buttons(table.clone()))?;
        }
        if let Some(table) = &overrides.keyboard {
            engine.set_custom_mapping("keyboard", MappingTable::Buttons(table.clone()))?;
        }
        if let Some(table) = &overrides.axes {
            engine.set_custom_mapping("axes", MappingTable::Axes(table.clone()))?;
        }

        if !config.profiles.is_empty() {
            info!("Loaded {} mapping profiles", config.profiles.len());
        }
        engine.set_profiles(config.profiles.clone());
        Ok(engine)
    }

    /// Attaches keyboard delivery and schedules the first tick
    pub fn resume(mut self) -> InputEngine<Running> {
        self.host.attach_keyboard();
        self.control.take_request();
        let handle = self.scheduler.request_frame();
        self.frame = Some(handle);
        info!("Input engine resumed, first frame {:?}", handle);
        self.transition()
    }

    pub fn pause(self) -> Self {
        debug!("Input engine already paused");
        self
    }

    /// Drops every listener and handler; the engine is consumed
    pub fn destroy(mut self) {
        self.listeners.clear();
        info!("Input engine destroyed");
    }
}

impl InputEngine<Running> {
    /// Cancels the pending frame and detaches keyboard delivery
    pub fn pause(mut self) -> InputEngine<Paused> {
        self.cancel_frame();
        self.host.detach_keyboard();
        self.keys_down.clear();
        info!("Input engine paused");
        self.transition()
    }

    pub fn destroy(self) {
        self.pause().destroy();
    }

    /// Whether a frame is pending, i.e. whether the refresh continues
    pub fn is_scheduled(&self) -> bool {
        self.frame.is_some()
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    /// Runs one refresh. Does nothing once the pending frame was cancelled.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.frame.is_none() {
            debug!("Tick without a pending frame, skipping");
            return report;
        }

        let snapshot = self.host.snapshot();
        for event in self.host.drain_key_events() {
            match event {
                KeyEvent::Down(code) => self.keys_down.insert(code),
                KeyEvent::Up(code) => self.keys_down.remove(&code),
            };
        }

        self.reconcile_sources(&snapshot, &mut report);
        self.process_gamepads(&snapshot, &mut report);
        self.process_keyboard(&mut report);

        if self.control.take_request() {
            info!("Pause requested by a listener, not rescheduling");
            self.cancel_frame();
        }
        if self.frame.is_some() {
            self.frame = Some(self.scheduler.request_frame());
        }

        if report.fired > 0 || report.faults > 0 {
            debug!(
                "Tick fired {} listeners ({} faults)",
                report.fired, report.faults
            );
        }
        report
    }

    // Connect newly seen slots and tear down lost ones
    fn reconcile_sources(&mut self, snapshot: &[Option<RawFrame>], report: &mut TickReport) {
        let slots = snapshot.len().max(self.sources.slot_count());
        for slot in 0..slots {
            let frame = snapshot
                .get(slot)
                .and_then(|f| f.as_ref())
                .filter(|f| f.connected);
            let was_connected = self.sources.is_connected(slot);
            let source = SourceId::Gamepad(slot);

            match (frame, was_connected) {
                (Some(frame), false) => {
                    let mode = classify(frame);
                    if mode != QuirkMode::Standard {
                        info!("{} '{}' classified as {}", source, frame.name, mode);
                    }
                    let profile = select(&self.profiles, &frame.name);
                    self.sources.connect(slot, &frame.name, mode, profile);
                    report.connected.push(source);
                    report.absorb(self.listeners.notify(DeviceEvent::Connect, source, &frame.name));
                }
                (None, true) => {
                    if let Some(record) = self.sources.disconnect(slot) {
                        report.disconnected.push(source);
                        report.absorb(self.listeners.notify(
                            DeviceEvent::Disconnect,
                            source,
                            &record.name,
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    fn process_gamepads(&mut self, snapshot: &[Option<RawFrame>], report: &mut TickReport) {
        let (global_buttons, global_axes) = match (
            self.mappings.buttons(DeviceClass::Gamepad),
            self.mappings.axes(),
        ) {
            (Ok(buttons), Ok(axes)) => (buttons, axes),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Skipping gamepads: {}", e);
                return;
            }
        };

        for source in self.sources.live() {
            let SourceId::Gamepad(slot) = source else {
                continue;
            };
            let Some(frame) = snapshot.get(slot).and_then(|f| f.as_ref()) else {
                continue;
            };
            let Some(record) = self.sources.get_mut(source) else {
                continue;
            };

            let profile = record.profile.and_then(|index| self.profiles.get(index));
            let buttons = profile
                .and_then(|p| p.gamepad.as_ref())
                .unwrap_or(global_buttons);
            let axes = profile
                .and_then(|p| p.axes.as_ref())
                .unwrap_or(global_axes);

            tick::process_gamepad(
                record,
                frame,
                buttons,
                axes,
                &self.listeners,
                self.threshold,
                report,
            );
        }
    }

    fn process_keyboard(&mut self, report: &mut TickReport) {
        let table = match self.mappings.buttons(DeviceClass::Keyboard) {
            Ok(table) => table,
            Err(e) => {
                debug!("Skipping keyboard: {}", e);
                return;
            }
        };

        let active = tick::active_buttons(table, self.keys_down.iter().map(|&code| (code, 1.0)));
        let record = self.sources.keyboard_mut();
        let outcome = tick::apply_activation(
            &mut record.states,
            &active,
            &[],
            SourceId::Keyboard,
            &self.listeners,
        );
        report.absorb(outcome);
    }

    /// Ticks on the refresh interval until `shutdown` completes or the frame
    /// is no longer live, then pauses
    pub async fn run_until_shutdown<F>(mut self, shutdown: F) -> InputEngine<Paused>
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting refresh loop with {}ms interval",
            self.refresh.as_millis()
        );
        let mut refresh = tokio::time::interval(self.refresh);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        // Stats for performance monitoring
        let mut ticks: u64 = 0;
        let mut total_events: usize = 0;
        let mut last_stats_time = Local::now();
        let stats_interval = chrono::Duration::seconds(30);

        while self.is_scheduled() {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                _ = refresh.tick() => {
                    let report = self.tick();
                    ticks += 1;
                    total_events += report.fired;

                    let now = Local::now();
                    if now - last_stats_time > stats_interval {
                        let elapsed_seconds = (now - last_stats_time).num_seconds().max(1);
                        info!(
                            "Engine stats: {} ticks, {} events in {} seconds ({:.2} events/sec)",
                            ticks,
                            total_events,
                            elapsed_seconds,
                            total_events as f64 / elapsed_seconds as f64
                        );
                        ticks = 0;
                        total_events = 0;
                        last_stats_time = now;
                    }
                }
            }
        }

        self.pause()
    }

    /// Ticks until a listener requests a pause through [`EngineControl`]
    pub async fn run(self) -> InputEngine<Paused> {
        self.run_until_shutdown(std::future::pending::<()>()).await
    }
}
