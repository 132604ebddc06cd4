#![no_std]

// Shared logic for the reaction timer.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Targets supply the tick interrupt, the response edge,
// the indicator outputs, and a byte-oriented console; everything else lives here.

pub mod config;
pub mod console;
pub mod game;
pub mod indicators;
pub mod latch;
pub mod results;
pub mod round;
pub mod tick;

pub use config::SessionConfig;
pub use game::{Game, GameEvent};
pub use latch::{CaptureLatch, ResponseCapture};
pub use tick::{Tick, TickCounter, TickSource};
