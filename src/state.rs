use std::sync::{
    atomic::{AtomicU8, AtomicUsize, Ordering},
    OnceLock,
};

/// Lifecycle of the display worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No frame processed yet, no chart allocated.
    Uninitialized,
    /// Panels allocated, poll loop active.
    Running,
    /// Terminal: no further frames are processed.
    Closed,
}

impl WorkerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Uninitialized,
            1 => Self::Running,
            _ => Self::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Running => 1,
            Self::Closed => 2,
        }
    }
}

/// Why the worker reached [`WorkerState::Closed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user closed the render surface.
    WindowClosed,
    /// The sink stopped the worker during shutdown.
    Cancelled,
    /// The render surface failed.
    Failed,
}

/// Worker lifecycle as observed from the training side.
///
/// The worker is the only writer; the sink reads it to tell a user-closed
/// display apart from a dead worker.
#[derive(Debug, Default)]
pub struct WorkerStatus {
    state: AtomicU8,
    exit: OnceLock<ExitReason>,
    processed: AtomicUsize,
    rejected: AtomicUsize,
}

impl WorkerStatus {
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit.get().copied()
    }

    pub fn processed_frames(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn rejected_frames(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }

    pub(crate) fn set_running(&self) {
        // Never leave Closed.
        let _ = self.state.compare_exchange(
            WorkerState::Uninitialized.as_u8(),
            WorkerState::Running.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Moves to `Closed`; only the first reason sticks.
    pub(crate) fn close(&self, reason: ExitReason) {
        let _ = self.exit.set(reason);
        self.state
            .store(WorkerState::Closed.as_u8(), Ordering::Release);
    }

    pub(crate) fn frame_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }
}
