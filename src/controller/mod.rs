//! Host boundary: raw controller snapshots, keyboard delivery and frame scheduling.
//!
//! ```text
//! gilrs / MemoryHost ──► InputHost::snapshot ──► engine tick
//!                                                   ▲
//! RefreshScheduler ──── FrameHandle ────────────────┘
//! ```

pub mod event_collector;
pub mod host;
pub mod memory_host;
pub mod scheduler;

pub use event_collector::{CollectorSettings, EventCollector};
pub use host::{ButtonReading, HostError, InputHost, KeyEvent, RawFrame};
pub use memory_host::MemoryHost;
pub use scheduler::{FrameHandle, FrameScheduler, RefreshScheduler};
