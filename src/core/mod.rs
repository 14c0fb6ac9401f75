//! Core domain models for checkrun
//!
//! This module defines the fundamental data structures that represent
//! workflows, steps, events, and their configuration.

pub mod config;
pub mod context;
pub mod event;
pub mod state;
pub mod step;
pub mod workflow;

pub use context::*;
pub use event::*;
pub use state::*;
pub use step::*;
pub use workflow::*;
