//! Subcommands of the relay binary that do not start the server.

pub mod check_config;

pub use check_config::CheckConfigArgs;
