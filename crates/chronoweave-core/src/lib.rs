//! Chronoweave Core: the shared World Model and collaborator boundaries.
//!
//! This crate defines the aggregate every engine operates on, the error and
//! warning taxonomy, the injected randomness and clock, the turn journal,
//! and the interfaces to the content generator and the external rosters.
//! It contains no engine logic.

pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod generation;
pub mod rng;
pub mod roster;
pub mod world;
