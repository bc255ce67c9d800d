//! Library surface of the `alertsim` binary: the clap command tree, kept
//! in a library crate so the definitions are unit-testable.

pub mod cli;
