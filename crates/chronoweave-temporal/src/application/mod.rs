//! Loop lifecycle operations over the World Model.

pub mod loop_handlers;
