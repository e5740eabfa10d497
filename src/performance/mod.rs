//! # Performance Metrics System
//!
//! Tracks frame times over a rolling window and derives FPS. Metrics are recomputed a
//! few times per second, and the window title is refreshed at the same cadence.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use automata::performance::PerformanceMonitor;
//!
//! let mut monitor = PerformanceMonitor::new();
//! if monitor.record_frame(Duration::from_millis(16)) {
//!     println!("{:.0} fps", monitor.get_metrics().fps);
//! }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

/// Frame timing summary over the current window
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    /// Current frames per second
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    /// Minimum frame time in the current window
    pub min_frame_time_ms: f32,
    /// Maximum frame time in the current window
    pub max_frame_time_ms: f32,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: f32::MAX,
            max_frame_time_ms: 0.0,
        }
    }
}

/// Simulation state shown next to the frame metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationStatus {
    pub generation: u64,
    pub interval: f32,
    pub running: bool,
}

/// Performance monitoring system
pub struct PerformanceMonitor {
    /// Ring buffer of recent frame times for averaging
    frame_times: VecDeque<Duration>,
    /// Maximum number of frame times to keep for averaging
    max_samples: usize,
    /// Current performance metrics
    current_metrics: PerformanceMetrics,
    /// Frame time accumulated since metrics were last updated
    since_update: Duration,
    /// Update interval for metrics calculation
    update_interval: Duration,
}

impl PerformanceMonitor {
    /// Create a new performance monitor
    pub fn new() -> Self {
        Self::with_config(120, Duration::from_millis(250))
    }

    /// Create a new performance monitor with custom configuration
    pub fn with_config(max_samples: usize, update_interval: Duration) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            current_metrics: PerformanceMetrics::default(),
            since_update: Duration::ZERO,
            update_interval,
        }
    }

    /// Add a frame time sample. Returns true when the metrics were recomputed.
    pub fn record_frame(&mut self, frame_time: Duration) -> bool {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);

        self.since_update += frame_time;
        if self.since_update < self.update_interval {
            return false;
        }
        self.since_update = Duration::ZERO;
        self.update_metrics();
        true
    }

    /// Update calculated metrics
    fn update_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total_time: Duration = self.frame_times.iter().sum();
        let avg_frame_time_ms = total_time.as_secs_f32() * 1000.0 / self.frame_times.len() as f32;

        self.current_metrics.frame_time_ms = avg_frame_time_ms;
        self.current_metrics.fps = if avg_frame_time_ms > 0.0 {
            1000.0 / avg_frame_time_ms
        } else {
            0.0
        };

        if let (Some(min_time), Some(max_time)) =
            (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.current_metrics.min_frame_time_ms = min_time.as_secs_f32() * 1000.0;
            self.current_metrics.max_frame_time_ms = max_time.as_secs_f32() * 1000.0;
        }
    }

    /// Get current performance metrics
    pub fn get_metrics(&self) -> &PerformanceMetrics {
        &self.current_metrics
    }

    /// Window title line for the current metrics
    pub fn title(&self, status: SimulationStatus) -> String {
        format!(
            "automata | {:.0} fps | gen {} | {:.3}s/step | {}",
            self.current_metrics.fps,
            status.generation,
            status.interval,
            if status.running { "running" } else { "paused" }
        )
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}
