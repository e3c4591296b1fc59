//! Process exit codes returned by [`crate::run`].

pub const SUCCESS: i32 = 0;

/// Bad arguments, configuration or a failed run.
pub const ERROR: i32 = 2;

/// The series stopped early; partial artefacts were written.
pub const INTERRUPTED: i32 = 130;
