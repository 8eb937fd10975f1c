//! Ironvale Engine - headless runner for the Ironvale simulation.
//!
//! This crate provides configuration loading, fixed-step timing, the demo
//! scenario and snapshot autosaves used by the `ironvale` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod autosave;
pub mod config;
pub mod demo;
pub mod timing;
