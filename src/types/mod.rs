// Tabspace shared type definitions
// Each submodule defines types used across the crate.

pub mod alert;
pub mod errors;
pub mod renderer;
pub mod settings;
pub mod snapshot;
pub mod space;
pub mod tab;
