//! Role bookkeeping for a pair of alternating simulation images
//!
//! Tracks which of the two slots is the visible output and which is the write target,
//! and which side of the compute/graphics boundary currently owns the pair. Holds no GPU
//! resources so the alternation rules can be checked without a device.

use crate::error::{AutomataError, Result};

/// One of the two image slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }

    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// Which subsystem may touch the image pair right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Render stage may sample the output slot
    Graphics,
    /// A compute step is being recorded or is in flight
    Compute,
}

/// Output/input role assignment plus ownership state
#[derive(Debug, Clone)]
pub struct PingPong {
    output: Slot,
    owner: Owner,
    generation: u64,
}

impl PingPong {
    /// Slot A starts as the visible output, slot B as the first write target
    pub fn new() -> Self {
        Self {
            output: Slot::A,
            owner: Owner::Graphics,
            generation: 0,
        }
    }

    /// Slot last written by compute and safe for the renderer to sample
    pub fn output(&self) -> Slot {
        self.output
    }

    /// Slot the next step writes into
    pub fn input(&self) -> Slot {
        self.output.other()
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Number of completed steps
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hand the pair to the compute stage.
    ///
    /// Fails if a step is already holding it; only one step may be in flight.
    pub fn acquire_for_compute(&mut self) -> Result<()> {
        if self.owner == Owner::Compute {
            return Err(AutomataError::ImageOwnership);
        }
        self.owner = Owner::Compute;
        Ok(())
    }

    /// Hand the pair back to graphics after the step completed, then swap roles so the
    /// freshly written slot becomes the output.
    pub fn release_and_swap(&mut self) {
        debug_assert_eq!(self.owner, Owner::Compute);
        self.owner = Owner::Graphics;
        self.output = self.output.other();
        self.generation += 1;
    }

    /// Hand the pair back without swapping, used when the step failed
    pub fn abandon(&mut self) {
        self.owner = Owner::Graphics;
    }
}

impl Default for PingPong {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(roles: &mut PingPong) {
        roles.acquire_for_compute().unwrap();
        roles.release_and_swap();
    }

    #[test]
    fn test_initial_roles() {
        let roles = PingPong::new();
        assert_eq!(roles.output(), Slot::A);
        assert_eq!(roles.input(), Slot::B);
        assert_eq!(roles.owner(), Owner::Graphics);
        assert_eq!(roles.generation(), 0);
    }

    #[test]
    fn test_swap_is_an_involution() {
        let initial = PingPong::new();
        let mut roles = PingPong::new();
        for n in 1..=17u64 {
            step(&mut roles);
            assert_eq!(roles.generation(), n);
            assert_eq!(roles.output() == initial.output(), n % 2 == 0);
            assert_ne!(roles.output(), roles.input());
        }
    }

    #[test]
    fn test_output_is_previous_input() {
        let mut roles = PingPong::new();
        let written = roles.input();
        step(&mut roles);
        assert_eq!(roles.output(), written);
    }

    #[test]
    fn test_double_acquire_is_rejected() {
        let mut roles = PingPong::new();
        roles.acquire_for_compute().unwrap();
        assert!(matches!(
            roles.acquire_for_compute(),
            Err(AutomataError::ImageOwnership)
        ));
    }

    #[test]
    fn test_abandon_keeps_roles() {
        let mut roles = PingPong::new();
        roles.acquire_for_compute().unwrap();
        roles.abandon();
        assert_eq!(roles.owner(), Owner::Graphics);
        assert_eq!(roles.output(), Slot::A);
        assert_eq!(roles.generation(), 0);
    }
}
