//! Optional delay between deltas, to smooth editor repaint rate.
//!
//! Pacing never changes ordering or final content; headless callers use
//! [`NoPacing`].

use std::time::Duration;

/// Decides how long to wait between consecutive deltas of one chunk.
pub trait PacingStrategy: Send + Sync {
    /// Delay before applying the next delta, if any.
    fn delay(&self) -> Option<Duration>;
}

/// Apply deltas as fast as they are decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl PacingStrategy for NoPacing {
    fn delay(&self) -> Option<Duration> {
        None
    }
}

/// Wait a fixed interval between deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPacing(pub Duration);

impl FixedPacing {
    /// Roughly one frame at 60 Hz.
    pub const EDITOR_FRAME: Duration = Duration::from_millis(16);

    /// Pace at [`EDITOR_FRAME`](Self::EDITOR_FRAME).
    #[must_use]
    pub fn editor_frame() -> Self {
        Self(Self::EDITOR_FRAME)
    }
}

impl PacingStrategy for FixedPacing {
    fn delay(&self) -> Option<Duration> {
        (!self.0.is_zero()).then_some(self.0)
    }
}
