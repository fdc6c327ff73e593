#![doc = "Command implementations and YAML problem loading for the `cw-sim` binary."]

pub mod commands;
pub mod problem;
