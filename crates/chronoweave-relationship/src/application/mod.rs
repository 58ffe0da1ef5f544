//! Web and tension operations over the World Model.

pub mod tension_handlers;
pub mod web_handlers;
