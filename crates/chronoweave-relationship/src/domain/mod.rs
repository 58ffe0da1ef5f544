//! Composition rules and level dynamics.

pub mod composition;
pub mod dynamics;
