//! Chain lifecycle operations over the World Model.

pub mod chain_handlers;
