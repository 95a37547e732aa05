//! Command-line front end for `repzip_core`.
//!
//! The binary is a thin shell: argument parsing ([`cli`]), logging setup
//! ([`logging`]), payload rendering ([`output`]) and the mapping from
//! archive errors to stable exit codes ([`exit_codes`]).

pub mod cli;
pub mod commands;
pub mod exit_codes;
pub mod logging;
pub mod output;
