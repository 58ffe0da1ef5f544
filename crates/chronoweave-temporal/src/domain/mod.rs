//! Loop phases and the pure rollback rules.

pub mod phase;
pub mod retention;
