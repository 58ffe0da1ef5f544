//! Chronoweave Temporal Engine.
//!
//! Responsible for arming loop mechanics, rolling the world back to a
//! checkpoint, deciding which memories survive a rollback, escalating the
//! protagonist's awareness, and accumulating the psychological effects that
//! persist across every loop.

pub mod application;
pub mod domain;
