//! Domain types and pure branching rules for consequence chains.

pub mod branching;
pub mod choice;
