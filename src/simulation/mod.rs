// src/simulation/mod.rs
//! Simulation system
//!
//! GPU-resident cellular automaton: a compute context, a pair of images stepped in
//! alternation, and a scheduler that decides when the next step is due.

pub mod compute_context;
pub mod image_set;
pub mod ping_pong;
pub mod scheduler;
pub mod seed;

pub use compute_context::{ComputeContext, Kernel, KernelSource, DEFAULT_ENTRY_POINT};
pub use image_set::SimulationImageSet;
pub use ping_pong::{Owner, PingPong, Slot};
pub use scheduler::{IntervalDirection, IterationScheduler};
pub use seed::SeedImage;
