//! The turn pipeline.

pub mod manager;
