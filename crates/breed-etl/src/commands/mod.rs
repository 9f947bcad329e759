//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod init_schema;
pub mod preview;
pub mod run;
pub mod status;
