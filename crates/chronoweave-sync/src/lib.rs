//! Chronoweave Synchronization Manager.
//!
//! Applies a player action to a World Model by running the Consequence,
//! Relationship and Temporal engines in a fixed order, then validates the
//! result. A turn either yields a consistent World Model plus warnings, or
//! the untouched input World Model plus the error that rejected it.

pub mod application;
pub mod domain;
