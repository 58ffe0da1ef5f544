//! Chronoweave Consequence Engine.
//!
//! Responsible for scheduling consequence chains from flagged player
//! choices, maturing them when their turn arrives, branching them into
//! decaying child chains, and emitting the relationship shifts they cause.

pub mod application;
pub mod domain;
