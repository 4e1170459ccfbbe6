//! Frame scheduling primitive.
//!
//! The engine asks the host for one frame at a time and cancels the pending
//! frame when paused. Whether a handle is live is what decides if a finished
//! tick schedules another one.

use tracing::debug;

/// Opaque id of one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

pub trait FrameScheduler {
    /// Requests one invocation of the tick at the next refresh
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancels a previously requested frame; unknown handles are ignored
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Default scheduler handing out monotonically numbered frames.
///
/// The refresh itself is driven by the engine's run loop; this only tracks
/// which frame is pending.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    next: u64,
    pending: Option<FrameHandle>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }
}

impl FrameScheduler for RefreshScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            debug!("Cancelled frame {:?}", handle);
            self.pending = None;
        }
    }
}
