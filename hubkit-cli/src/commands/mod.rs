//! CLI command implementations

pub mod challenge;
pub mod keygen;
pub mod token;
pub mod verify;
