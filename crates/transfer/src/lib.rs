//! The transfer surface: progress notification, speed limiting, and tracker
//! retry backoff. The wire protocol, the channel/congestion-control state
//! machine and NAT traversal are all out of scope (see crate docs on the
//! workspace root) — this crate only specifies the few pieces of that
//! surface a reimplementation needs regardless of transport: a progress
//! callback registry, a max-speed knob per direction, and the tracker
//! backoff schedule.

use std::time::Duration;
use swift_bin::Bin;

/// Which direction a speed limit or progress measurement applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Data flowing into this node.
    Download,
    /// Data flowing out of this node.
    Upload,
}

/// Per-direction speed limit, in bytes per second. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedLimits {
    pub download: Option<f64>,
    pub upload: Option<f64>,
}

impl SpeedLimits {
    /// Set the limit for one direction.
    pub fn set(&mut self, direction: Direction, bytes_per_sec: Option<f64>) {
        match direction {
            Direction::Download => self.download = bytes_per_sec,
            Direction::Upload => self.upload = bytes_per_sec,
        }
    }

    /// The limit for one direction.
    pub fn get(&self, direction: Direction) -> Option<f64> {
        match direction {
            Direction::Download => self.download,
            Direction::Upload => self.upload,
        }
    }
}

/// A registered progress callback: invoked as new bins complete, aggregated
/// to the granularity given by `agg_layer` (0 = every chunk, higher layers
/// coalesce notifications, mirroring libswift's `AddProgressCallback`
/// aggregation byte).
pub trait ProgressCallback: Send {
    /// Called when `bin` has newly completed, aggregated at `agg_layer`.
    fn on_progress(&mut self, bin: Bin);
}

/// A registry of progress callbacks for one swarm.
#[derive(Default)]
pub struct ProgressCallbacks {
    callbacks: Vec<(Box<dyn ProgressCallback>, u8)>,
}

impl ProgressCallbacks {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, aggregating notifications at `agg_layer`.
    pub fn add(&mut self, callback: Box<dyn ProgressCallback>, agg_layer: u8) {
        self.callbacks.push((callback, agg_layer));
    }

    /// Notify every registered callback that `bin` completed, coarsening
    /// `bin` to each callback's requested aggregation layer first.
    pub fn notify(&mut self, bin: Bin) {
        for (callback, agg_layer) in &mut self.callbacks {
            let reported = bin.parent_at_least(u32::from(*agg_layer));
            callback.on_progress(reported);
        }
    }
}

/// Extension used only for progress aggregation: walk up to (at least) the
/// given layer.
trait ParentAtLeast {
    fn parent_at_least(self, layer: u32) -> Bin;
}

impl ParentAtLeast for Bin {
    fn parent_at_least(self, layer: u32) -> Bin {
        let mut b = self;
        while b.layer() < layer {
            b = b.parent();
        }
        b
    }
}

/// Exponential backoff for tracker registration retries.
///
/// Matches the schedule a reimplementation should use when a tracker
/// registration attempt fails: start at [`ExponentialBackoff::INITIAL`],
/// multiply by [`ExponentialBackoff::MULTIPLIER`] on every further failure,
/// capped at [`ExponentialBackoff::MAX`], and reset back to the initial
/// delay the moment the tracker makes progress (a successful registration
/// or a received peer list).
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    current: Duration,
}

impl ExponentialBackoff {
    /// The first retry delay.
    pub const INITIAL: Duration = Duration::from_secs(5);
    /// The multiplier applied to the delay after each failure.
    pub const MULTIPLIER: f64 = 1.1;
    /// The maximum delay, regardless of how many failures occur.
    pub const MAX: Duration = Duration::from_secs(1800);

    /// A fresh backoff, about to return [`ExponentialBackoff::INITIAL`].
    pub fn new() -> Self {
        ExponentialBackoff {
            current: Self::INITIAL,
        }
    }

    /// The delay to wait before the next retry, then advance the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let scaled = self.current.as_secs_f64() * Self::MULTIPLIER;
        self.current = Duration::from_secs_f64(scaled).min(Self::MAX);
        delay
    }

    /// Reset the schedule after progress, so the next failure starts over
    /// at [`ExponentialBackoff::INITIAL`].
    pub fn reset(&mut self) {
        self.current = Self::INITIAL;
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_escalates_and_caps() {
        let mut b = ExponentialBackoff::new();
        let first = b.next_delay();
        assert_eq!(first, ExponentialBackoff::INITIAL);
        let second = b.next_delay();
        assert!(second > first);

        for _ in 0..200 {
            b.next_delay();
        }
        assert_eq!(b.next_delay(), ExponentialBackoff::MAX);
    }

    #[test]
    fn backoff_resets_on_progress() {
        let mut b = ExponentialBackoff::new();
        b.next_delay();
        b.next_delay();
        b.reset();
        assert_eq!(b.next_delay(), ExponentialBackoff::INITIAL);
    }

    #[test]
    fn speed_limits_independent_per_direction() {
        let mut limits = SpeedLimits::default();
        limits.set(Direction::Download, Some(1024.0));
        assert_eq!(limits.get(Direction::Download), Some(1024.0));
        assert_eq!(limits.get(Direction::Upload), None);
    }
}
