//! Runner pieces for the `connections-solver` binary: argument parsing,
//! puzzle files, the terminal judge and JSONL telemetry.

pub mod cli;
pub mod puzzle_file;
pub mod telemetry;
pub mod terminal;
