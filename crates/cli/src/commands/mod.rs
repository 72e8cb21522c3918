//! Subcommand implementations

pub mod health;
pub mod inspect;
pub mod predict;
pub mod predictions;
pub mod train;
