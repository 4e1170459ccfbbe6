//! Polled controller and keyboard input normalized into named events.
//!
//! Application code subscribes to `press`, `hold`, `release` and `axis`
//! events by logical name (`button_1`, `d_pad_up`, `stick_axis_left`, ...)
//! plus device `connect`/`disconnect`, instead of reading physical indices.
//! Controllers that report their d-pad as analog axes are decoded into the
//! same vocabulary.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod engine;
pub mod mapping;
pub mod quirk;
pub mod tracker;

pub use config::EngineConfig;
pub use controller::{InputHost, MemoryHost, RawFrame, RefreshScheduler};
pub use dispatch::{DeviceEvent, EventType, InputEvent, ListenerOptions, ListenerResult, Registration};
pub use engine::{EngineControl, EngineError, InputEngine, Paused, Running, TickReport};
pub use mapping::{DeviceClass, MappingTable};
pub use tracker::SourceId;
