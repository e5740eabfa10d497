//! Error types for the automata viewer
//!
//! Every failure the viewer can hit is fatal to the session, so there is one error enum
//! and no retry classification. Components return these instead of exiting; the binary
//! decides what to do with them.

use std::path::PathBuf;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, AutomataError>;

#[derive(Debug, thiserror::Error)]
pub enum AutomataError {
    #[error("no compute-capable GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("adapter '{name}' cannot run the simulation: {reason}")]
    UnsupportedAdapter { name: String, reason: String },

    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("cannot read kernel source {path}: {source}")]
    KernelSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("kernel '{entry_point}' failed to build:\n{log}")]
    KernelBuild { entry_point: String, log: String },

    #[error("cannot decode seed image {path}: {source}")]
    SeedDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("seed image is {width}x{height}, expected {expected} bytes of RGBA but got {actual}")]
    SeedDimensions {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("seed image is {width}x{height}, larger than the device limit of {max}")]
    SeedTooLarge { width: u32, height: u32, max: u32 },

    #[error("simulation images already owned by the compute stage")]
    ImageOwnership,

    #[error("compute step rejected by the device: {0}")]
    StepRejected(String),

    #[error("compute dispatch did not complete: {0}")]
    Dispatch(#[from] wgpu::PollError),

    #[error("failed to acquire next surface texture: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),

    #[error("failed to map readback buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("readback buffer mapping was dropped before it completed")]
    MapAbandoned(#[from] std::sync::mpsc::RecvError),

    #[error("cannot write screenshot {path}: {source}")]
    Screenshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop failure: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
