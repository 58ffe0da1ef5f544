//! Chronoweave API: library crate exposing the router pieces for
//! integration tests.

pub mod error;
pub mod generator;
pub mod rosters;
pub mod routes;
pub mod state;
