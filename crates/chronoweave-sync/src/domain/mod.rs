//! Player actions, loop predicates and consistency rules.

pub mod action;
pub mod trigger;
pub mod validation;
