//! Chronoweave Relationship Engine.
//!
//! Responsible for forming relationship webs and romantic tensions,
//! folding relationship shifts into their levels, and escalating tensions
//! through jealousy. Webs and tensions are never removed, only resolved.

pub mod application;
pub mod domain;
